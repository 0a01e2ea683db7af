use serde::{Deserialize, Serialize};
use uom::si::{energy::joule, f64::Energy};

use crate::{
    error::Error,
    params::ParameterSet,
    thermal::{OperatingPoint, heating_rate, max_temperature, thermal_balance_residual},
};

/// Rounds half away from zero to `decimals` places.
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

/// The outcome of a successful optimization.
///
/// Derived metrics are recomputed from the optimal point and rounded:
/// temperature and heating rate to 2 decimals, the balance error to 5.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizationResult {
    point: OperatingPoint,
    objective: f64,
    max_temperature: f64,
    heating_rate: f64,
    balance_error: f64,
    iterations: usize,
}

impl OptimizationResult {
    /// Packages the solver's optimum with metrics recomputed at `point`.
    #[must_use]
    pub fn interpret(
        params: &ParameterSet,
        point: OperatingPoint,
        objective: f64,
        iterations: usize,
    ) -> Self {
        Self {
            point,
            objective,
            max_temperature: round_to(max_temperature(params, &point), 2),
            heating_rate: round_to(heating_rate(params, &point), 2),
            balance_error: round_to(thermal_balance_residual(params, &point), 5),
            iterations,
        }
    }

    /// The optimal decision vector.
    #[must_use]
    pub fn point(&self) -> OperatingPoint {
        self.point
    }

    /// Objective value at the optimum.
    #[must_use]
    pub fn objective(&self) -> f64 {
        self.objective
    }

    #[must_use]
    pub fn max_temperature(&self) -> f64 {
        self.max_temperature
    }

    #[must_use]
    pub fn heating_rate(&self) -> f64 {
        self.heating_rate
    }

    #[must_use]
    pub fn balance_error(&self) -> f64 {
        self.balance_error
    }

    /// Solver iterations used to reach the optimum.
    #[must_use]
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Heater energy `P·t` at the optimum.
    #[must_use]
    pub fn energy_input(&self) -> Energy {
        Energy::new::<joule>(self.point.heat_input())
    }
}

/// The flat output record of one run, successful or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(non_snake_case)]
pub struct Report {
    pub optimal_P: Option<f64>,
    pub optimal_v: Option<f64>,
    pub optimal_t: Option<f64>,
    pub optimal_d: Option<f64>,
    pub min_value: Option<f64>,
    pub max_temperature: Option<f64>,
    pub heating_rate: Option<f64>,
    pub balance_error: Option<f64>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl Report {
    /// Builds the record for a run's outcome.
    #[must_use]
    pub fn new(outcome: &Result<OptimizationResult, Error>) -> Self {
        match outcome {
            Ok(result) => result.into(),
            Err(error) => Self {
                optimal_P: None,
                optimal_v: None,
                optimal_t: None,
                optimal_d: None,
                min_value: None,
                max_temperature: None,
                heating_rate: None,
                balance_error: None,
                success: false,
                error_message: Some(error.to_string()),
            },
        }
    }
}

impl From<&OptimizationResult> for Report {
    fn from(result: &OptimizationResult) -> Self {
        let x = result.point;
        Self {
            optimal_P: Some(x.power),
            optimal_v: Some(x.velocity),
            optimal_t: Some(x.time),
            optimal_d: Some(x.thickness),
            min_value: Some(result.objective),
            max_temperature: Some(result.max_temperature),
            heating_rate: Some(result.heating_rate),
            balance_error: Some(result.balance_error),
            success: true,
            error_message: None,
        }
    }
}
