//! Thermal model of the heating process.
//!
//! Every function here is pure in the decision vector and the parameter set.

use std::convert::Infallible;

use heatopt_core::Model;

use crate::params::ParameterSet;

/// A decision vector: heating power, velocity, dwell time, and thickness.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperatingPoint {
    /// Heating power P, in watts.
    pub power: f64,

    /// Conveyor velocity v.
    pub velocity: f64,

    /// Dwell time t, in seconds.
    pub time: f64,

    /// Material thickness d, in meters.
    pub thickness: f64,
}

impl OperatingPoint {
    /// Builds a point from `[P, v, t, d]`.
    #[must_use]
    pub fn from_array([power, velocity, time, thickness]: [f64; 4]) -> Self {
        Self {
            power,
            velocity,
            time,
            thickness,
        }
    }

    /// Returns `[P, v, t, d]`.
    #[must_use]
    pub fn to_array(&self) -> [f64; 4] {
        [self.power, self.velocity, self.time, self.thickness]
    }

    /// Energy delivered by the heater, `P·t`.
    #[must_use]
    pub fn heat_input(&self) -> f64 {
        self.power * self.time
    }
}

/// Furnace efficiency `η(v, d) = η₀ + k_v·tanh(β(v − v₀)) − k_d·(d − d₀)`.
#[must_use]
pub fn efficiency(params: &ParameterSet, velocity: f64, thickness: f64) -> f64 {
    let e = params.efficiency();
    e.eta0 + e.kv * (e.beta * (velocity - e.reference_velocity)).tanh()
        - e.kd * (thickness - e.reference_thickness)
}

/// Predicted peak workpiece temperature, `T_init + P·t·η / (C·m)`.
#[must_use]
pub fn max_temperature(params: &ParameterSet, x: &OperatingPoint) -> f64 {
    let load = params.load();
    let absorbed = x.heat_input() * efficiency(params, x.velocity, x.thickness);
    load.initial_temperature + absorbed / load.total_heat_capacity()
}

/// Heating rate `α₁·P/d² − α₂·v`.
#[must_use]
pub fn heating_rate(params: &ParameterSet, x: &OperatingPoint) -> f64 {
    let h = params.heating_rate();
    h.alpha1 * x.power / (x.thickness * x.thickness) - h.alpha2 * x.velocity
}

/// Heat still missing at the target temperature, `C·m·(T_target − T_init) − P·t·η`.
#[must_use]
pub fn thermal_balance_residual(params: &ParameterSet, x: &OperatingPoint) -> f64 {
    params.load().required_heat() - x.heat_input() * efficiency(params, x.velocity, x.thickness)
}

/// All thermal quantities at one operating point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermalState {
    pub efficiency: f64,
    pub max_temperature: f64,
    pub heating_rate: f64,
    pub balance_residual: f64,
}

/// The thermal model as a callable [`Model`].
#[derive(Debug, Clone, Copy)]
pub struct ThermalModel<'a> {
    params: &'a ParameterSet,
}

impl<'a> ThermalModel<'a> {
    #[must_use]
    pub fn new(params: &'a ParameterSet) -> Self {
        Self { params }
    }

    /// Evaluates every thermal quantity at `x`.
    #[must_use]
    pub fn state(&self, x: &OperatingPoint) -> ThermalState {
        ThermalState {
            efficiency: efficiency(self.params, x.velocity, x.thickness),
            max_temperature: max_temperature(self.params, x),
            heating_rate: heating_rate(self.params, x),
            balance_residual: thermal_balance_residual(self.params, x),
        }
    }
}

impl Model for ThermalModel<'_> {
    type Input = OperatingPoint;
    type Output = ThermalState;
    type Error = Infallible;

    fn call(&self, input: &OperatingPoint) -> Result<ThermalState, Self::Error> {
        Ok(self.state(input))
    }
}
