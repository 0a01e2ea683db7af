use crate::{
    error::DegenerateInitialGuessError,
    params::ParameterSet,
    thermal::{OperatingPoint, efficiency},
};

/// A starting point for the optimizer.
///
/// Power, velocity, and thickness start at the midpoints of their bounds.
/// The dwell time is the one that closes the thermal balance at those
/// midpoints, clamped into its bounds when it falls outside them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitialGuess {
    point: OperatingPoint,
    unclamped_time: f64,
}

impl InitialGuess {
    /// Builds the starting point for `params`.
    ///
    /// # Errors
    ///
    /// Returns a [`DegenerateInitialGuessError`] if the midpoint power is
    /// zero, the midpoint efficiency is not positive, or the balancing time
    /// is not finite.
    pub fn new(params: &ParameterSet) -> Result<Self, DegenerateInitialGuessError> {
        let bounds = params.bounds();
        let midpoint = |[lo, hi]: [f64; 2]| (lo + hi) / 2.0;

        let power = midpoint(bounds.power);
        let velocity = midpoint(bounds.velocity);
        let thickness = midpoint(bounds.thickness);

        if power == 0.0 {
            return Err(DegenerateInitialGuessError::ZeroPower);
        }

        let eta = efficiency(params, velocity, thickness);
        if eta <= 0.0 {
            return Err(DegenerateInitialGuessError::NonPositiveEfficiency { efficiency: eta });
        }

        let time = params.load().required_heat() / (power * eta);
        if !time.is_finite() {
            return Err(DegenerateInitialGuessError::NonFiniteTime { time });
        }

        let [t_min, t_max] = bounds.time;

        Ok(Self {
            point: OperatingPoint {
                power,
                velocity,
                time: time.clamp(t_min, t_max),
                thickness,
            },
            unclamped_time: time,
        })
    }

    /// The starting point, inside the bounds.
    #[must_use]
    pub fn point(&self) -> OperatingPoint {
        self.point
    }

    /// The balancing dwell time before it was clamped into its bounds.
    #[must_use]
    pub fn unclamped_time(&self) -> f64 {
        self.unclamped_time
    }

    /// Whether the balancing dwell time had to be clamped.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_clamped(&self) -> bool {
        self.point.time != self.unclamped_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    use crate::{params::RawParameters, thermal::thermal_balance_residual};

    fn params(edit: impl FnOnce(&mut RawParameters)) -> ParameterSet {
        let mut raw = RawParameters::default();
        edit(&mut raw);
        ParameterSet::new(raw).unwrap()
    }

    #[test]
    fn balances_heat_at_bound_midpoints() {
        let params = params(|_| {});
        let guess = InitialGuess::new(&params).unwrap();
        let x = guess.point();

        assert_eq!(x.power, 3000.0);
        assert_eq!(x.velocity, 1.25);
        assert_relative_eq!(x.thickness, 0.175);
        assert_relative_eq!(x.time, 676.8, epsilon = 0.1);
        assert_relative_eq!(thermal_balance_residual(&params, &x), 0.0, epsilon = 1e-6);
        assert!(!guess.is_clamped());
    }

    #[test]
    fn clamps_time_into_bounds() {
        let params = params(|raw| raw.t_max = 300.0);
        let guess = InitialGuess::new(&params).unwrap();

        assert_eq!(guess.point().time, 300.0);
        assert!(guess.unclamped_time() > 600.0);
        assert!(guess.is_clamped());
    }

    #[test]
    fn negative_time_clamps_to_lower_bound() {
        // Target below the starting temperature.
        let params = params(|raw| raw.target_temperature = 10.0);
        let guess = InitialGuess::new(&params).unwrap();

        assert!(guess.unclamped_time() < 0.0);
        assert_eq!(guess.point().time, 60.0);
    }

    #[test]
    fn rejects_zero_power() {
        let params = params(|raw| {
            raw.power_min = 0.0;
            raw.power_max = 0.0;
        });

        assert_eq!(
            InitialGuess::new(&params),
            Err(DegenerateInitialGuessError::ZeroPower)
        );
    }

    #[test]
    fn rejects_non_positive_efficiency() {
        let params = params(|raw| raw.eta0 = -1.0);

        assert!(matches!(
            InitialGuess::new(&params),
            Err(DegenerateInitialGuessError::NonPositiveEfficiency { efficiency }) if efficiency < 0.0
        ));
    }

    #[test]
    fn rejects_overflowing_time() {
        // A subnormal efficiency passes the sign check but overflows t.
        let params = params(|raw| {
            raw.eta0 = 1e-320;
            raw.kv = 0.0;
            raw.kd = 0.0;
        });

        assert!(matches!(
            InitialGuess::new(&params),
            Err(DegenerateInitialGuessError::NonFiniteTime { time }) if time.is_infinite()
        ));
    }
}
