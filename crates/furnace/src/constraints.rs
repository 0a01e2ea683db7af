use std::convert::Infallible;

use heatopt_core::{ConstrainedProblem, Constraints};

use crate::{
    objective::objective,
    params::ParameterSet,
    thermal::{OperatingPoint, ThermalState, heating_rate, max_temperature, thermal_balance_residual},
};

/// The furnace optimization problem bound to one parameter set.
///
/// Holds the box bounds, two inequalities that must stay non-negative
/// (temperature and heating-rate margins), and one equality that must be
/// zero (the thermal balance).
#[derive(Debug, Clone, Copy)]
pub struct ConstraintSet<'a> {
    params: &'a ParameterSet,
}

impl<'a> ConstraintSet<'a> {
    #[must_use]
    pub fn new(params: &'a ParameterSet) -> Self {
        Self { params }
    }

    /// Box bounds in decision vector order (P, v, t, d).
    #[must_use]
    pub fn bounds(&self) -> [[f64; 2]; 4] {
        self.params.bounds().to_array()
    }

    /// `T_max − max_temperature(x)`; non-negative when satisfied.
    #[must_use]
    pub fn temperature_margin(&self, x: &OperatingPoint) -> f64 {
        self.params.load().max_temperature - max_temperature(self.params, x)
    }

    /// `R_max − heating_rate(x)`; non-negative when satisfied.
    #[must_use]
    pub fn heating_rate_margin(&self, x: &OperatingPoint) -> f64 {
        self.params.heating_rate().max_rate - heating_rate(self.params, x)
    }

    /// The thermal balance residual; zero when satisfied.
    #[must_use]
    pub fn thermal_balance(&self, x: &OperatingPoint) -> f64 {
        thermal_balance_residual(self.params, x)
    }

    /// Whether `x` lies within the box bounds.
    #[must_use]
    pub fn within_bounds(&self, x: &OperatingPoint) -> bool {
        self.bounds()
            .iter()
            .zip(x.to_array())
            .all(|([lo, hi], value)| (*lo..=*hi).contains(&value))
    }

    /// All constraint values at `x`: the balance, then the two margins.
    #[must_use]
    pub fn evaluate(&self, x: &OperatingPoint) -> Constraints<1, 2> {
        Constraints::new(
            [self.thermal_balance(x)],
            [self.temperature_margin(x), self.heating_rate_margin(x)],
        )
    }
}

impl ConstrainedProblem<4, 1, 2> for ConstraintSet<'_> {
    type Input = OperatingPoint;
    type Output = ThermalState;
    type Error = Infallible;

    fn input(&self, x: &[f64; 4]) -> Result<OperatingPoint, Self::Error> {
        Ok(OperatingPoint::from_array(*x))
    }

    fn objective(&self, input: &OperatingPoint, _: &ThermalState) -> Result<f64, Self::Error> {
        Ok(objective(self.params, input))
    }

    fn constraints(
        &self,
        _: &OperatingPoint,
        output: &ThermalState,
    ) -> Result<Constraints<1, 2>, Self::Error> {
        Ok(Constraints::new(
            [output.balance_residual],
            [
                self.params.load().max_temperature - output.max_temperature,
                self.params.heating_rate().max_rate - output.heating_rate,
            ],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use heatopt_core::Model;

    use crate::{params::RawParameters, thermal::ThermalModel};

    #[test]
    fn problem_matches_named_constraints() {
        let params = ParameterSet::new(RawParameters::default()).unwrap();
        let set = ConstraintSet::new(&params);
        let model = ThermalModel::new(&params);
        let x = OperatingPoint::from_array([4500.0, 0.7, 900.0, 0.06]);

        let input = set.input(&x.to_array()).unwrap();
        let output = model.call(&input).unwrap();
        let constraints = set.constraints(&input, &output).unwrap();

        assert_eq!(constraints, set.evaluate(&x));
        assert_eq!(set.objective(&input, &output).unwrap(), objective(&params, &x));
    }

    #[test]
    fn margins_sign_convention() {
        let params = ParameterSet::new(RawParameters::default()).unwrap();
        let set = ConstraintSet::new(&params);

        // Thin stock at full power heats far too fast and too hot.
        let hot = OperatingPoint::from_array([5000.0, 0.5, 3600.0, 0.05]);
        assert!(set.temperature_margin(&hot) < 0.0);
        assert!(set.heating_rate_margin(&hot) < 0.0);
        assert!(set.thermal_balance(&hot) < 0.0);

        // Low power over a short time on thick stock under-heats.
        let cold = OperatingPoint::from_array([1000.0, 1.0, 60.0, 0.3]);
        assert!(set.temperature_margin(&cold) > 0.0);
        assert!(set.heating_rate_margin(&cold) > 0.0);
        assert!(set.thermal_balance(&cold) > 0.0);
        assert_relative_eq!(set.evaluate(&cold).violation(), set.thermal_balance(&cold));
    }

    #[test]
    fn bounds_follow_decision_order() {
        let params = ParameterSet::new(RawParameters::default()).unwrap();
        let set = ConstraintSet::new(&params);

        assert_eq!(set.bounds()[2], [60.0, 3600.0]);
        assert!(set.within_bounds(&OperatingPoint::from_array([1000.0, 2.0, 60.0, 0.3])));
        assert!(!set.within_bounds(&OperatingPoint::from_array([1000.0, 2.5, 60.0, 0.3])));
    }
}
