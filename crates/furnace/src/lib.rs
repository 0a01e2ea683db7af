//! Furnace heating process model and operating-point optimizer.
//!
//! A [`ParameterSet`] describes the furnace, the workpiece, and the bounds on
//! the four decision variables: heating power `P`, conveyor velocity `v`,
//! dwell time `t`, and material thickness `d`. [`optimize`] finds the
//! [`OperatingPoint`] that minimizes a weighted trade-off between heating
//! non-uniformity and energy use while:
//!
//! - delivering exactly the heat needed to reach the target temperature,
//! - keeping the peak temperature at or below its limit, and
//! - keeping the heating rate at or below its limit.
//!
//! ```no_run
//! use heatopt_furnace::{OptimizationOptions, ParameterSet, RawParameters, optimize};
//!
//! let params = ParameterSet::new(RawParameters::default())?;
//! let result = optimize(&params, &OptimizationOptions::default())?;
//! println!("P = {:.2} W", result.point().power);
//! # Ok::<(), heatopt_furnace::Error>(())
//! ```
//!
//! The crate performs no logging and no I/O. Persistence is delegated to a
//! caller-supplied [`Store`].

mod constraints;
mod driver;
mod error;
mod initial_guess;
mod objective;
mod params;
mod result;
mod store;
mod thermal;

pub use constraints::ConstraintSet;
pub use driver::{OptimizationOptions, optimize, optimize_observed};
pub use error::{DegenerateInitialGuessError, Error, InvalidParameterError, OptimizationError};
pub use initial_guess::InitialGuess;
pub use objective::{energy, objective, uniformity};
pub use params::{
    Bounds, EfficiencyModel, FIELD_NAMES, HeatingRateModel, MIN_THICKNESS, ParameterSet,
    RawParameters, ThermalLoad, Weights,
};
pub use result::{OptimizationResult, Report, round_to};
pub use store::Store;
pub use thermal::{
    OperatingPoint, ThermalModel, ThermalState, efficiency, heating_rate, max_temperature,
    thermal_balance_residual,
};
