//! Process parameters: the flat input mapping and its validated form.

use serde::{Deserialize, Serialize};

use crate::error::InvalidParameterError;

/// Smallest accepted thickness bound, in meters.
pub const MIN_THICKNESS: f64 = 0.01;

/// Canonical parameter names, in input order.
pub const FIELD_NAMES: [&str; 24] = [
    "P_min", "P_max", "v_min", "v_max", "t_min", "t_max", "d_min", "d_max", "w1", "w2", "alpha1",
    "alpha2", "R_max", "C", "m", "T_init", "T_target", "T_max", "eta0", "kv", "beta", "vo", "kd",
    "do",
];

/// Resolves a canonical name or one of its aliases to a field position.
fn field_index(name: &str) -> Option<usize> {
    let canonical = match name {
        "η0" => "eta0",
        "β" => "beta",
        "v0" => "vo",
        "d0" => "do",
        other => other,
    };
    FIELD_NAMES.iter().position(|field| *field == canonical)
}

/// Unvalidated process parameters as received from a form or file.
///
/// Serialized names follow the input mapping (`P_min`, `T_init`, ...).
/// The aliases `η0`, `β`, `v0`, and `d0` are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawParameters {
    #[serde(rename = "P_min")]
    pub power_min: f64,
    #[serde(rename = "P_max")]
    pub power_max: f64,
    pub v_min: f64,
    pub v_max: f64,
    pub t_min: f64,
    pub t_max: f64,
    pub d_min: f64,
    pub d_max: f64,
    pub w1: f64,
    pub w2: f64,
    pub alpha1: f64,
    pub alpha2: f64,
    #[serde(rename = "R_max")]
    pub max_heating_rate: f64,
    #[serde(rename = "C")]
    pub heat_capacity: f64,
    #[serde(rename = "m")]
    pub mass: f64,
    #[serde(rename = "T_init")]
    pub initial_temperature: f64,
    #[serde(rename = "T_target")]
    pub target_temperature: f64,
    #[serde(rename = "T_max")]
    pub max_temperature: f64,
    #[serde(alias = "η0")]
    pub eta0: f64,
    pub kv: f64,
    #[serde(alias = "β")]
    pub beta: f64,
    #[serde(rename = "vo", alias = "v0")]
    pub reference_velocity: f64,
    pub kd: f64,
    #[serde(rename = "do", alias = "d0")]
    pub reference_thickness: f64,
}

impl Default for RawParameters {
    /// The nominal furnace: a 5 kg steel billet heated from 20 °C to 800 °C.
    fn default() -> Self {
        Self {
            power_min: 1000.0,
            power_max: 5000.0,
            v_min: 0.5,
            v_max: 2.0,
            t_min: 60.0,
            t_max: 3600.0,
            d_min: 0.05,
            d_max: 0.3,
            w1: 0.7,
            w2: 0.3,
            alpha1: 0.00002,
            alpha2: 0.0001,
            max_heating_rate: 10.0,
            heat_capacity: 460.0,
            mass: 5.0,
            initial_temperature: 20.0,
            target_temperature: 800.0,
            max_temperature: 820.0,
            eta0: 0.8,
            kv: 0.1,
            beta: 5.0,
            reference_velocity: 1.0,
            kd: 0.05,
            reference_thickness: 0.15,
        }
    }
}

impl RawParameters {
    fn to_values(self) -> [f64; 24] {
        [
            self.power_min,
            self.power_max,
            self.v_min,
            self.v_max,
            self.t_min,
            self.t_max,
            self.d_min,
            self.d_max,
            self.w1,
            self.w2,
            self.alpha1,
            self.alpha2,
            self.max_heating_rate,
            self.heat_capacity,
            self.mass,
            self.initial_temperature,
            self.target_temperature,
            self.max_temperature,
            self.eta0,
            self.kv,
            self.beta,
            self.reference_velocity,
            self.kd,
            self.reference_thickness,
        ]
    }

    fn from_values(v: [f64; 24]) -> Self {
        let [
            power_min,
            power_max,
            v_min,
            v_max,
            t_min,
            t_max,
            d_min,
            d_max,
            w1,
            w2,
            alpha1,
            alpha2,
            max_heating_rate,
            heat_capacity,
            mass,
            initial_temperature,
            target_temperature,
            max_temperature,
            eta0,
            kv,
            beta,
            reference_velocity,
            kd,
            reference_thickness,
        ] = v;

        Self {
            power_min,
            power_max,
            v_min,
            v_max,
            t_min,
            t_max,
            d_min,
            d_max,
            w1,
            w2,
            alpha1,
            alpha2,
            max_heating_rate,
            heat_capacity,
            mass,
            initial_temperature,
            target_temperature,
            max_temperature,
            eta0,
            kv,
            beta,
            reference_velocity,
            kd,
            reference_thickness,
        }
    }

    /// Iterates over `(canonical name, value)` pairs in input order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, f64)> + use<> {
        FIELD_NAMES.into_iter().zip(self.to_values())
    }

    /// Returns the value of a field by canonical name or alias.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        field_index(name).map(|i| self.to_values()[i])
    }

    /// Sets a field by canonical name or alias.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidParameterError::UnknownField`] if `name` is not a
    /// parameter.
    pub fn set(&mut self, name: &str, value: f64) -> Result<(), InvalidParameterError> {
        let index = field_index(name).ok_or_else(|| InvalidParameterError::UnknownField {
            name: name.to_owned(),
        })?;
        let mut values = self.to_values();
        values[index] = value;
        *self = Self::from_values(values);
        Ok(())
    }

    /// Builds parameters from textual `(name, value)` pairs, as submitted by
    /// a form.
    ///
    /// Every parameter must be present exactly once under its canonical name
    /// or an alias; a repeated name keeps the last value.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown name, a value that does not parse as a
    /// number, or a missing parameter.
    pub fn from_fields<I, K, V>(fields: I) -> Result<Self, InvalidParameterError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut values = [None; 24];

        for (name, value) in fields {
            let (name, value) = (name.as_ref(), value.as_ref());
            let index = field_index(name).ok_or_else(|| InvalidParameterError::UnknownField {
                name: name.to_owned(),
            })?;
            let parsed = value
                .trim()
                .parse::<f64>()
                .map_err(|_| InvalidParameterError::Unparsable {
                    name: name.to_owned(),
                    value: value.to_owned(),
                })?;
            values[index] = Some(parsed);
        }

        let mut resolved = [0.0; 24];
        for (i, value) in values.into_iter().enumerate() {
            resolved[i] = value.ok_or(InvalidParameterError::MissingField {
                name: FIELD_NAMES[i],
            })?;
        }

        Ok(Self::from_values(resolved))
    }
}

/// Box bounds on the decision variables, as `[lower, upper]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub power: [f64; 2],
    pub velocity: [f64; 2],
    pub time: [f64; 2],
    pub thickness: [f64; 2],
}

impl Bounds {
    /// Returns the bounds in decision vector order (P, v, t, d).
    #[must_use]
    pub fn to_array(&self) -> [[f64; 2]; 4] {
        [self.power, self.velocity, self.time, self.thickness]
    }
}

/// Objective weights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub uniformity: f64,
    pub energy: f64,
}

/// Coefficients of `η(v, d) = η₀ + k_v·tanh(β(v − v₀)) − k_d·(d − d₀)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EfficiencyModel {
    pub eta0: f64,
    pub kv: f64,
    pub beta: f64,
    pub reference_velocity: f64,
    pub kd: f64,
    pub reference_thickness: f64,
}

/// Coefficients of `R = α₁·P/d² − α₂·v` and its limit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatingRateModel {
    pub alpha1: f64,
    pub alpha2: f64,
    pub max_rate: f64,
}

/// The workpiece and its temperature targets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermalLoad {
    pub heat_capacity: f64,
    pub mass: f64,
    pub initial_temperature: f64,
    pub target_temperature: f64,
    pub max_temperature: f64,
}

impl ThermalLoad {
    /// Heat capacity of the whole workpiece, `C·m`.
    #[must_use]
    pub fn total_heat_capacity(&self) -> f64 {
        self.heat_capacity * self.mass
    }

    /// Heat needed to reach the target temperature, `C·m·(T_target − T_init)`.
    #[must_use]
    pub fn required_heat(&self) -> f64 {
        self.total_heat_capacity() * (self.target_temperature - self.initial_temperature)
    }
}

/// Validated, immutable process parameters.
///
/// Built only through [`ParameterSet::new`], which checks every field
/// eagerly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSet {
    bounds: Bounds,
    weights: Weights,
    efficiency: EfficiencyModel,
    heating_rate: HeatingRateModel,
    load: ThermalLoad,
}

impl ParameterSet {
    /// Validates raw parameters.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidParameterError`] if any field is non-finite, a
    /// bound is negative or inverted, a thickness bound is below
    /// [`MIN_THICKNESS`], a weight is outside `[0, 1]`, or the heat capacity
    /// or mass is not positive.
    pub fn new(raw: RawParameters) -> Result<Self, InvalidParameterError> {
        if let Some((field, value)) = raw.fields().find(|(_, v)| !v.is_finite()) {
            return Err(InvalidParameterError::NonFinite { field, value });
        }

        let pairs = [
            ("P_min", "P_max", raw.power_min, raw.power_max),
            ("v_min", "v_max", raw.v_min, raw.v_max),
            ("t_min", "t_max", raw.t_min, raw.t_max),
            ("d_min", "d_max", raw.d_min, raw.d_max),
        ];

        for (lower, upper, min, max) in pairs {
            for (field, value) in [(lower, min), (upper, max)] {
                if value < 0.0 {
                    return Err(InvalidParameterError::Negative { field, value });
                }
            }
        }

        for (field, value) in [("d_min", raw.d_min), ("d_max", raw.d_max)] {
            if value < MIN_THICKNESS {
                return Err(InvalidParameterError::ThicknessTooSmall {
                    field,
                    value,
                    minimum: MIN_THICKNESS,
                });
            }
        }

        for (lower, upper, min, max) in pairs {
            if min > max {
                return Err(InvalidParameterError::InvertedBounds {
                    lower,
                    upper,
                    min,
                    max,
                });
            }
        }

        for (field, value) in [("w1", raw.w1), ("w2", raw.w2)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(InvalidParameterError::WeightOutOfRange { field, value });
            }
        }

        for (field, value) in [("C", raw.heat_capacity), ("m", raw.mass)] {
            if value <= 0.0 {
                return Err(InvalidParameterError::NonPositive { field, value });
            }
        }

        Ok(Self {
            bounds: Bounds {
                power: [raw.power_min, raw.power_max],
                velocity: [raw.v_min, raw.v_max],
                time: [raw.t_min, raw.t_max],
                thickness: [raw.d_min, raw.d_max],
            },
            weights: Weights {
                uniformity: raw.w1,
                energy: raw.w2,
            },
            efficiency: EfficiencyModel {
                eta0: raw.eta0,
                kv: raw.kv,
                beta: raw.beta,
                reference_velocity: raw.reference_velocity,
                kd: raw.kd,
                reference_thickness: raw.reference_thickness,
            },
            heating_rate: HeatingRateModel {
                alpha1: raw.alpha1,
                alpha2: raw.alpha2,
                max_rate: raw.max_heating_rate,
            },
            load: ThermalLoad {
                heat_capacity: raw.heat_capacity,
                mass: raw.mass,
                initial_temperature: raw.initial_temperature,
                target_temperature: raw.target_temperature,
                max_temperature: raw.max_temperature,
            },
        })
    }

    #[must_use]
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    #[must_use]
    pub fn weights(&self) -> Weights {
        self.weights
    }

    #[must_use]
    pub fn efficiency(&self) -> EfficiencyModel {
        self.efficiency
    }

    #[must_use]
    pub fn heating_rate(&self) -> HeatingRateModel {
        self.heating_rate
    }

    #[must_use]
    pub fn load(&self) -> ThermalLoad {
        self.load
    }

    /// Returns the flat parameters this set was built from.
    #[must_use]
    pub fn to_raw(&self) -> RawParameters {
        let Self {
            bounds,
            weights,
            efficiency,
            heating_rate,
            load,
        } = *self;

        RawParameters {
            power_min: bounds.power[0],
            power_max: bounds.power[1],
            v_min: bounds.velocity[0],
            v_max: bounds.velocity[1],
            t_min: bounds.time[0],
            t_max: bounds.time[1],
            d_min: bounds.thickness[0],
            d_max: bounds.thickness[1],
            w1: weights.uniformity,
            w2: weights.energy,
            alpha1: heating_rate.alpha1,
            alpha2: heating_rate.alpha2,
            max_heating_rate: heating_rate.max_rate,
            heat_capacity: load.heat_capacity,
            mass: load.mass,
            initial_temperature: load.initial_temperature,
            target_temperature: load.target_temperature,
            max_temperature: load.max_temperature,
            eta0: efficiency.eta0,
            kv: efficiency.kv,
            beta: efficiency.beta,
            reference_velocity: efficiency.reference_velocity,
            kd: efficiency.kd,
            reference_thickness: efficiency.reference_thickness,
        }
    }
}

impl TryFrom<RawParameters> for ParameterSet {
    type Error = InvalidParameterError;

    fn try_from(raw: RawParameters) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}
