use thiserror::Error;

/// Configuration for the SQP solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    max_iters: usize,
    f_tol: f64,
    feasibility_tol: f64,
}

/// Errors that can occur when validating an SQP solver config.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max_iters must be at least 1")]
    MaxIters,

    #[error("f_tol must be finite and positive")]
    FTol,

    #[error("feasibility_tol must be finite and positive")]
    FeasibilityTol,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_iters: 1000,
            f_tol: 1e-6,
            feasibility_tol: 1e-6,
        }
    }
}

impl Config {
    /// Creates a new config with validated limits and tolerances.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_iters` is zero or a tolerance is not finite
    /// and positive.
    pub fn new(max_iters: usize, f_tol: f64, feasibility_tol: f64) -> Result<Self, ConfigError> {
        if max_iters == 0 {
            return Err(ConfigError::MaxIters);
        }
        if !f_tol.is_finite() || f_tol <= 0.0 {
            return Err(ConfigError::FTol);
        }
        if !feasibility_tol.is_finite() || feasibility_tol <= 0.0 {
            return Err(ConfigError::FeasibilityTol);
        }

        Ok(Self {
            max_iters,
            f_tol,
            feasibility_tol,
        })
    }

    /// Returns the maximum number of SQP iterations.
    #[must_use]
    pub fn max_iters(&self) -> usize {
        self.max_iters
    }

    /// Returns the absolute tolerance on the objective change of a full step.
    #[must_use]
    pub fn f_tol(&self) -> f64 {
        self.f_tol
    }

    /// Returns the tolerance on the total scaled constraint violation.
    ///
    /// The violation is the sum of absolute equality residuals plus negative
    /// inequality values, each divided by the largest partial derivative of
    /// its constraint (when above one) at the starting point, in solver
    /// variables.
    #[must_use]
    pub fn feasibility_tol(&self) -> f64 {
        self.feasibility_tol
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = Config::default();
        assert_eq!(
            Config::new(config.max_iters(), config.f_tol(), config.feasibility_tol()),
            Ok(config)
        );
    }

    #[test]
    fn rejects_zero_iterations() {
        assert_eq!(Config::new(0, 1e-6, 1e-6), Err(ConfigError::MaxIters));
    }

    #[test]
    fn rejects_bad_tolerances() {
        assert_eq!(Config::new(10, 0.0, 1e-6), Err(ConfigError::FTol));
        assert_eq!(Config::new(10, f64::NAN, 1e-6), Err(ConfigError::FTol));
        assert_eq!(
            Config::new(10, 1e-6, -1.0),
            Err(ConfigError::FeasibilityTol)
        );
        assert_eq!(
            Config::new(10, 1e-6, f64::INFINITY),
            Err(ConfigError::FeasibilityTol)
        );
    }
}
