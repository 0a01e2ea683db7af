//! `heatopt`: optimize furnace heating process parameters.
//!
//! # Usage
//!
//! ```bash
//! # Optimize the nominal furnace
//! heatopt optimize
//!
//! # Start from a parameter file and override single values
//! heatopt optimize --params furnace.toml --set R_max=8 --json
//!
//! # Record every run and list past failures
//! HEATOPT_DB=runs.db heatopt batch a.toml b.json
//! HEATOPT_DB=runs.db heatopt history --failures
//! ```
//!
//! # Environment Variables
//!
//! - `HEATOPT_DB`: SQLite database that records runs (same as `--db`)
//! - `RUST_LOG`: logging filter (default: `heatopt=info`; use
//!   `heatopt=debug` to trace solver iterations)

use std::{
    path::{Path, PathBuf},
    process::ExitCode,
    time::Duration,
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use heatopt_furnace::{
    Error, InitialGuess, OptimizationOptions, OptimizationResult, ParameterSet, RawParameters,
    Report, Store, optimize_observed,
};
use heatopt_observers::TraceObserver;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

mod db;
mod input;
mod render;

use db::SqliteStore;

#[derive(Parser, Debug)]
#[command(name = "heatopt")]
#[command(about = "Optimize furnace heating process parameters")]
#[command(version)]
struct Cli {
    /// SQLite database that records every run
    #[arg(long, global = true, env = "HEATOPT_DB", value_name = "PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Optimize one parameter set
    Optimize {
        /// Parameter file (TOML, or JSON with a .json extension)
        #[arg(long, value_name = "FILE")]
        params: Option<PathBuf>,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Optimize several parameter files in parallel
    Batch {
        /// Parameter files (TOML, or JSON with a .json extension)
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,

        #[command(flatten)]
        run: RunArgs,
    },

    /// List recorded runs, newest first
    History {
        /// Maximum number of runs to list
        #[arg(long, default_value_t = 20)]
        limit: usize,

        /// Only list failed runs
        #[arg(long)]
        failures: bool,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Wait until the database accepts connections
    WaitForDb {
        /// Number of connection attempts
        #[arg(long, default_value_t = 30)]
        attempts: usize,

        /// Seconds between attempts
        #[arg(long, default_value_t = 2.0)]
        interval: f64,
    },

    /// Print the default parameters as TOML
    Defaults {
        /// Print JSON instead of TOML
        #[arg(long)]
        json: bool,
    },
}

/// Options shared by commands that run the optimizer.
#[derive(Args, Debug)]
struct RunArgs {
    /// Override one parameter, applied after the file (repeatable)
    #[arg(long = "set", value_name = "NAME=VALUE", value_parser = input::parse_override)]
    overrides: Vec<(String, String)>,

    /// Maximum solver iterations
    #[arg(long, default_value_t = 1000)]
    max_iterations: usize,

    /// Solver function and feasibility tolerance
    #[arg(long, default_value_t = 1e-6)]
    tolerance: f64,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

impl RunArgs {
    fn options(&self) -> Result<OptimizationOptions> {
        OptimizationOptions::new(self.max_iterations, self.tolerance)
            .context("invalid solver options")
    }
}

/// One labeled optimization run.
struct Run {
    label: String,
    params: Option<ParameterSet>,
    outcome: Result<OptimizationResult, Error>,
}

impl Run {
    /// Validates `raw` and optimizes it, logging the outcome.
    fn execute(label: String, raw: RawParameters, options: &OptimizationOptions) -> Self {
        let params = match ParameterSet::new(raw) {
            Ok(params) => params,
            Err(error) => {
                warn!(run = %label, %error, "invalid parameters");
                return Self {
                    label,
                    params: None,
                    outcome: Err(error.into()),
                };
            }
        };

        if let Some(guess) = InitialGuess::new(&params).ok().filter(InitialGuess::is_clamped) {
            warn!(
                run = %label,
                balancing = guess.unclamped_time(),
                clamped = guess.point().time,
                "initial dwell time outside its bounds, clamped"
            );
        }

        let outcome = optimize_observed(&params, options, TraceObserver::new(&label));
        match &outcome {
            Ok(result) => info!(
                run = %label,
                iterations = result.iterations(),
                objective = result.objective(),
                "optimization converged"
            ),
            Err(error) => warn!(run = %label, %error, "optimization failed"),
        }

        Self {
            label,
            params: Some(params),
            outcome,
        }
    }

    fn report(&self) -> Report {
        Report::new(&self.outcome)
    }

    /// Records the run if its parameters were valid.
    fn persist(&self, store: Option<&mut SqliteStore>) -> Result<()> {
        let (Some(store), Some(params)) = (store, &self.params) else {
            return Ok(());
        };
        let id = store
            .store(params, &self.outcome)
            .with_context(|| format!("failed to store run {}", self.label))?;
        info!(run = %self.label, id, "run recorded");
        Ok(())
    }
}

#[derive(Serialize)]
struct BatchEntry<'a> {
    file: &'a str,
    #[serde(flatten)]
    report: Report,
}

fn open_store(db: Option<&Path>) -> Result<Option<SqliteStore>> {
    db.map(|path| {
        SqliteStore::open(path)
            .with_context(|| format!("failed to open database {}", path.display()))
    })
    .transpose()
}

fn require_db(db: Option<&Path>) -> Result<&Path> {
    db.context("no database configured; pass --db or set HEATOPT_DB")
}

fn optimize(db: Option<&Path>, params: Option<&Path>, run: &RunArgs) -> Result<bool> {
    let options = run.options()?;
    let raw = input::resolve(params, &run.overrides)?;
    let mut store = open_store(db)?;

    let label = params.map_or_else(|| "defaults".to_owned(), |p| p.display().to_string());
    let run_result = Run::execute(label, raw, &options);
    run_result.persist(store.as_mut())?;

    let report = run_result.report();
    if run.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render::report_text(&report));
    }

    Ok(report.success)
}

fn batch(db: Option<&Path>, files: &[PathBuf], run: &RunArgs) -> Result<bool> {
    let options = run.options()?;
    let inputs = files
        .iter()
        .map(|path| Ok((path.display().to_string(), input::resolve(Some(path), &run.overrides)?)))
        .collect::<Result<Vec<_>>>()?;
    let mut store = open_store(db)?;

    let runs: Vec<Run> = inputs
        .into_par_iter()
        .map(|(label, raw)| Run::execute(label, raw, &options))
        .collect();

    for run_result in &runs {
        run_result.persist(store.as_mut())?;
    }

    let failed = runs.iter().filter(|r| r.outcome.is_err()).count();
    info!(runs = runs.len(), failed, "batch finished");

    if run.json {
        let entries: Vec<BatchEntry<'_>> = runs
            .iter()
            .map(|r| BatchEntry {
                file: &r.label,
                report: r.report(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for run_result in &runs {
            println!("== {}", run_result.label);
            print!("{}", render::report_text(&run_result.report()));
        }
    }

    Ok(failed == 0)
}

fn history(db: Option<&Path>, limit: usize, failures: bool, json: bool) -> Result<bool> {
    let path = require_db(db)?;
    let store = SqliteStore::open(path)
        .with_context(|| format!("failed to open database {}", path.display()))?;
    let entries = store
        .history(limit, failures)
        .context("failed to read run history")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        print!("{}", render::history_text(&entries));
    }
    Ok(true)
}

fn wait_for_db(db: Option<&Path>, attempts: usize, interval: f64) -> Result<bool> {
    let path = require_db(db)?;
    let interval = Duration::try_from_secs_f64(interval).context("invalid --interval")?;
    db::wait_for_db(path, attempts, interval)?;
    Ok(true)
}

fn defaults(json: bool) -> Result<bool> {
    let raw = RawParameters::default();
    if json {
        println!("{}", serde_json::to_string_pretty(&raw)?);
    } else {
        print!("{}", toml::to_string_pretty(&raw)?);
    }
    Ok(true)
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("heatopt=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db = cli.db.as_deref();

    let succeeded = match &cli.command {
        Command::Optimize { params, run } => optimize(db, params.as_deref(), run)?,
        Command::Batch { files, run } => batch(db, files, run)?,
        Command::History {
            limit,
            failures,
            json,
        } => history(db, *limit, *failures, *json)?,
        Command::WaitForDb { attempts, interval } => wait_for_db(db, *attempts, *interval)?,
        Command::Defaults { json } => defaults(*json)?,
    };

    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_repeated_overrides() {
        let cli = Cli::try_parse_from([
            "heatopt", "optimize", "--set", "R_max=8", "--set", "β=4", "--json",
        ])
        .unwrap();

        let Command::Optimize { params, run } = cli.command else {
            panic!("expected optimize");
        };
        assert_eq!(params, None);
        assert!(run.json);
        assert_eq!(
            run.overrides,
            vec![
                ("R_max".to_owned(), "8".to_owned()),
                ("β".to_owned(), "4".to_owned())
            ]
        );
    }

    #[test]
    fn invalid_parameters_are_reported_not_stored() {
        let mut raw = RawParameters::default();
        raw.power_min = 5000.0;
        raw.power_max = 1000.0;
        let mut store = SqliteStore::open_in_memory().unwrap();

        let run = Run::execute("inverted".into(), raw, &OptimizationOptions::default());
        run.persist(Some(&mut store)).unwrap();

        assert!(run.params.is_none());
        assert!(!run.report().success);
        assert!(store.history(10, false).unwrap().is_empty());
    }

    #[test]
    fn solver_failures_are_stored() {
        let mut raw = RawParameters::default();
        raw.max_heating_rate = 0.0;
        let mut store = SqliteStore::open_in_memory().unwrap();

        let run = Run::execute("no-rate".into(), raw, &OptimizationOptions::default());
        run.persist(Some(&mut store)).unwrap();

        let history = store.history(10, true).unwrap();
        assert_eq!(history.len(), 1);
        assert!(history[0].report.error_message.is_some());
    }

    #[test]
    fn history_requires_a_database() {
        let error = history(None, 10, false, false).unwrap_err();
        assert!(error.to_string().contains("HEATOPT_DB"));
    }
}
