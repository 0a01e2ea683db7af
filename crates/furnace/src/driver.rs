use heatopt_core::Observer;
use heatopt_solvers::optimization::sqp;

use crate::{
    constraints::ConstraintSet,
    error::{Error, OptimizationError},
    initial_guess::InitialGuess,
    params::ParameterSet,
    result::OptimizationResult,
    thermal::{OperatingPoint, ThermalModel, ThermalState},
};

/// Solver tuning for a furnace optimization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizationOptions {
    config: sqp::Config,
}

impl Default for OptimizationOptions {
    fn default() -> Self {
        Self {
            config: sqp::Config::default(),
        }
    }
}

impl OptimizationOptions {
    /// Creates validated options.
    ///
    /// The function tolerance bounds both the objective change of a converged
    /// step and the remaining constraint violation.
    ///
    /// # Errors
    ///
    /// Returns a [`sqp::ConfigError`] if `max_iterations` is zero or the
    /// tolerance is not finite and positive.
    pub fn new(max_iterations: usize, function_tolerance: f64) -> Result<Self, sqp::ConfigError> {
        let config = sqp::Config::new(max_iterations, function_tolerance, function_tolerance)?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn max_iterations(&self) -> usize {
        self.config.max_iters()
    }

    #[must_use]
    pub fn function_tolerance(&self) -> f64 {
        self.config.f_tol()
    }
}

/// Finds the operating point that minimizes the weighted cost.
///
/// # Errors
///
/// Returns [`Error::DegenerateInitialGuess`] if no starting point exists, or
/// [`Error::Optimization`] if the solver fails or does not converge.
pub fn optimize(
    params: &ParameterSet,
    options: &OptimizationOptions,
) -> Result<OptimizationResult, Error> {
    optimize_observed(params, options, ())
}

/// Like [`optimize`], reporting each solver iteration to `observer`.
///
/// An observer that returns [`sqp::Action::StopEarly`] ends the run with
/// [`OptimizationError::Stopped`].
///
/// # Errors
///
/// Returns an error under the same conditions as [`optimize`].
pub fn optimize_observed<Obs>(
    params: &ParameterSet,
    options: &OptimizationOptions,
    observer: Obs,
) -> Result<OptimizationResult, Error>
where
    Obs: for<'a> Observer<sqp::Event<'a, OperatingPoint, ThermalState>, sqp::Action>,
{
    let guess = InitialGuess::new(params)?;
    let model = ThermalModel::new(params);
    let problem = ConstraintSet::new(params);

    let solution = sqp::minimize(
        &model,
        &problem,
        guess.point().to_array(),
        problem.bounds(),
        &options.config,
        observer,
    )
    .map_err(OptimizationError::from)?;

    match solution.status {
        sqp::Status::Converged => Ok(OptimizationResult::interpret(
            params,
            OperatingPoint::from_array(solution.x),
            solution.objective,
            solution.iters,
        )),
        sqp::Status::MaxIters => Err(OptimizationError::IterationLimit {
            max_iterations: options.max_iterations(),
            objective: solution.objective,
            violation: solution.violation,
        }
        .into()),
        sqp::Status::StoppedByObserver => Err(OptimizationError::Stopped {
            iterations: solution.iters,
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::params::RawParameters;

    #[test]
    fn options_default_to_solver_limits() {
        let options = OptimizationOptions::default();

        assert_eq!(options.max_iterations(), 1000);
        assert_eq!(options.function_tolerance(), 1e-6);
        assert_eq!(OptimizationOptions::new(1000, 1e-6), Ok(options));
    }

    #[test]
    fn options_reject_bad_limits() {
        assert_eq!(
            OptimizationOptions::new(0, 1e-6),
            Err(sqp::ConfigError::MaxIters)
        );
        assert_eq!(
            OptimizationOptions::new(10, f64::NAN),
            Err(sqp::ConfigError::FTol)
        );
    }

    #[test]
    fn observer_can_stop_the_run() {
        let params = ParameterSet::new(RawParameters::default()).unwrap();
        let options = OptimizationOptions::default();

        let result = optimize_observed(
            &params,
            &options,
            |_: &sqp::Event<'_, _, _>| Some(sqp::Action::StopEarly),
        );

        assert!(matches!(
            result,
            Err(Error::Optimization(OptimizationError::Stopped { iterations: 1 }))
        ));
    }

    #[test]
    fn single_iteration_hits_the_limit() {
        let params = ParameterSet::new(RawParameters::default()).unwrap();
        let options = OptimizationOptions::new(1, 1e-6).unwrap();

        let error = optimize(&params, &options).unwrap_err();

        assert!(matches!(
            error,
            Error::Optimization(OptimizationError::IterationLimit {
                max_iterations: 1,
                ..
            })
        ));
        assert!(error.to_string().contains("within 1 iterations"));
    }

    #[test]
    fn degenerate_guess_is_reported_before_solving() {
        let mut raw = RawParameters::default();
        raw.power_min = 0.0;
        raw.power_max = 0.0;
        let params = ParameterSet::new(raw).unwrap();

        assert!(matches!(
            optimize(&params, &OptimizationOptions::default()),
            Err(Error::DegenerateInitialGuess(_))
        ));
    }
}
