//! SQLite persistence for optimization runs.

use std::{path::Path, thread, time::Duration};

use anyhow::{Result, bail};
use heatopt_furnace::{Error, OptimizationResult, ParameterSet, Report, Store};
use jiff::Timestamp;
use rusqlite::{
    Connection, OpenFlags, Row, params_from_iter,
    types::{Type, Value},
};
use serde::Serialize;
use tracing::{info, warn};

/// Input columns, in parameter order.
const INPUT_COLUMNS: [&str; 24] = [
    "power_min",
    "power_max",
    "velocity_min",
    "velocity_max",
    "time_min",
    "time_max",
    "thickness_min",
    "thickness_max",
    "weight_uniformity",
    "weight_energy",
    "alpha1",
    "alpha2",
    "max_heating_rate",
    "heat_capacity",
    "mass",
    "initial_temperature",
    "target_temperature",
    "max_temperature_limit",
    "eta0",
    "kv",
    "beta",
    "v0",
    "kd",
    "d0",
];

/// Result columns, in [`Report`] field order.
const RESULT_COLUMNS: [&str; 8] = [
    "optimal_power",
    "optimal_velocity",
    "optimal_time",
    "optimal_thickness",
    "min_objective_value",
    "calculated_max_temperature",
    "calculated_heating_rate",
    "balance_error",
];

/// A run as listed by [`SqliteStore::history`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub created_at: Timestamp,
    #[serde(flatten)]
    pub report: Report,
}

/// Stores runs in the `furnace_calculation` table.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) the database at `path` and ensures the schema.
    pub fn open(path: &Path) -> rusqlite::Result<Self> {
        Self::with_connection(Connection::open(path)?)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> rusqlite::Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> rusqlite::Result<Self> {
        let inputs = INPUT_COLUMNS.map(|c| format!("{c} REAL NOT NULL")).join(",\n");
        let results = RESULT_COLUMNS.map(|c| format!("{c} REAL")).join(",\n");

        // created_at holds microseconds since the Unix epoch.
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS furnace_calculation (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                {inputs},
                {results},
                created_at INTEGER NOT NULL,
                success INTEGER NOT NULL,
                error_message TEXT
            );
            CREATE INDEX IF NOT EXISTS furnace_calculation_created_at
                ON furnace_calculation (created_at);
            CREATE INDEX IF NOT EXISTS furnace_calculation_success
                ON furnace_calculation (success);"
        ))?;

        Ok(Self { conn })
    }

    /// Records one run with an explicit creation time.
    pub fn insert(
        &self,
        params: &ParameterSet,
        outcome: &Result<OptimizationResult, Error>,
        created_at: Timestamp,
    ) -> rusqlite::Result<i64> {
        let report = Report::new(outcome);
        let results = [
            report.optimal_P,
            report.optimal_v,
            report.optimal_t,
            report.optimal_d,
            report.min_value,
            report.max_temperature,
            report.heating_rate,
            report.balance_error,
        ];

        let raw = params.to_raw();
        let values = raw
            .fields()
            .map(|(_, value)| Value::Real(value))
            .chain(results.map(|r| r.map_or(Value::Null, Value::Real)))
            .chain([
                Value::Integer(created_at.as_microsecond()),
                Value::Integer(i64::from(report.success)),
                report.error_message.map_or(Value::Null, Value::Text),
            ]);

        let columns = INPUT_COLUMNS
            .iter()
            .chain(&RESULT_COLUMNS)
            .chain(&["created_at", "success", "error_message"])
            .copied()
            .collect::<Vec<_>>();
        let placeholders = vec!["?"; columns.len()].join(", ");

        let mut statement = self.conn.prepare_cached(&format!(
            "INSERT INTO furnace_calculation ({}) VALUES ({placeholders})",
            columns.join(", ")
        ))?;
        statement.execute(params_from_iter(values))?;

        Ok(self.conn.last_insert_rowid())
    }

    /// Lists up to `limit` runs, newest first.
    pub fn history(&self, limit: usize, failures_only: bool) -> rusqlite::Result<Vec<HistoryEntry>> {
        let filter = if failures_only { "WHERE success = 0" } else { "" };
        let mut statement = self.conn.prepare(&format!(
            "SELECT id, created_at, {}, success, error_message
             FROM furnace_calculation {filter}
             ORDER BY created_at DESC, id DESC
             LIMIT ?1",
            RESULT_COLUMNS.join(", ")
        ))?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = statement.query_map([limit], history_entry)?;
        rows.collect()
    }

    /// Returns the stored input value of `field` for run `id`.
    #[cfg(test)]
    fn input(&self, id: i64, field: &str) -> rusqlite::Result<f64> {
        let index = heatopt_furnace::FIELD_NAMES
            .iter()
            .position(|name| *name == field)
            .ok_or(rusqlite::Error::InvalidColumnName(field.to_owned()))?;
        self.conn.query_row(
            &format!(
                "SELECT {} FROM furnace_calculation WHERE id = ?1",
                INPUT_COLUMNS[index]
            ),
            [id],
            |row| row.get(0),
        )
    }
}

fn history_entry(row: &Row<'_>) -> rusqlite::Result<HistoryEntry> {
    let micros: i64 = row.get(1)?;
    let created_at = Timestamp::from_microsecond(micros)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Integer, Box::new(e)))?;

    Ok(HistoryEntry {
        id: row.get(0)?,
        created_at,
        report: Report {
            optimal_P: row.get(2)?,
            optimal_v: row.get(3)?,
            optimal_t: row.get(4)?,
            optimal_d: row.get(5)?,
            min_value: row.get(6)?,
            max_temperature: row.get(7)?,
            heating_rate: row.get(8)?,
            balance_error: row.get(9)?,
            success: row.get(10)?,
            error_message: row.get(11)?,
        },
    })
}

impl Store for SqliteStore {
    type Id = i64;
    type Error = rusqlite::Error;

    fn store(
        &mut self,
        params: &ParameterSet,
        outcome: &Result<OptimizationResult, Error>,
    ) -> rusqlite::Result<i64> {
        self.insert(params, outcome, Timestamp::now())
    }
}

/// Retries opening the database until it answers `SELECT 1`.
///
/// The file must already exist; waiting never creates it. Returns the number
/// of attempts used.
pub fn wait_for_db(path: &Path, attempts: usize, interval: Duration) -> Result<usize> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;

    for attempt in 1..=attempts {
        let ready = Connection::open_with_flags(path, flags)
            .and_then(|conn| conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)));

        match ready {
            Ok(_) => {
                info!(attempt, "database is available");
                return Ok(attempt);
            }
            Err(error) => {
                warn!(attempt, attempts, %error, "database unavailable");
                if attempt < attempts {
                    thread::sleep(interval);
                }
            }
        }
    }

    bail!(
        "database {} did not become available after {attempts} attempts",
        path.display()
    )
}
