use heatopt_solvers::optimization::sqp;
use thiserror::Error;

/// Errors raised while validating process parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidParameterError {
    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f64 },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("{field} must be at least {minimum}, got {value}")]
    ThicknessTooSmall {
        field: &'static str,
        value: f64,
        minimum: f64,
    },

    #[error("{lower} ({min}) must not exceed {upper} ({max})")]
    InvertedBounds {
        lower: &'static str,
        upper: &'static str,
        min: f64,
        max: f64,
    },

    #[error("{field} must be within [0, 1], got {value}")]
    WeightOutOfRange { field: &'static str, value: f64 },

    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("unknown parameter `{name}`")]
    UnknownField { name: String },

    #[error("missing parameter `{name}`")]
    MissingField { name: &'static str },

    #[error("parameter `{name}` has unparsable value `{value}`")]
    Unparsable { name: String, value: String },
}

/// Errors raised when no usable starting point can be derived.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum DegenerateInitialGuessError {
    #[error("midpoint power is zero")]
    ZeroPower,

    #[error("efficiency at the midpoint is not positive: {efficiency}")]
    NonPositiveEfficiency { efficiency: f64 },

    #[error("initial dwell time is not finite: {time}")]
    NonFiniteTime { time: f64 },
}

/// Errors raised when the solver does not produce an optimum.
#[derive(Debug, Error)]
pub enum OptimizationError {
    #[error(
        "optimization did not converge within {max_iterations} iterations \
         (objective {objective}, constraint violation {violation:e})"
    )]
    IterationLimit {
        max_iterations: usize,
        objective: f64,
        violation: f64,
    },

    #[error("optimization was stopped after {iterations} iterations")]
    Stopped { iterations: usize },

    #[error("optimization failed: {0}")]
    Solver(#[from] sqp::Error),
}

/// Any failure of a furnace optimization run.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    InvalidParameter(#[from] InvalidParameterError),

    #[error(transparent)]
    DegenerateInitialGuess(#[from] DegenerateInitialGuessError),

    #[error(transparent)]
    Optimization(#[from] OptimizationError),
}
