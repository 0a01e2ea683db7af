use std::error::Error as StdError;

use thiserror::Error;

use crate::optimization::EvalError;

/// Errors that can occur during an SQP solve.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid bounds for variable {index}: [{lower}, {upper}]")]
    InvalidBounds {
        index: usize,
        lower: f64,
        upper: f64,
    },

    #[error("starting point has non-finite value {value} for variable {index}")]
    NonFiniteStart { index: usize, value: f64 },

    #[error("model call failed")]
    Model(#[source] Box<dyn StdError + Send + Sync>),

    #[error("problem error")]
    Problem(#[source] Box<dyn StdError + Send + Sync>),

    #[error("non-finite objective or constraint at x = {x:?}")]
    NonFiniteEvaluation { x: Vec<f64> },

    #[error("linearized constraints are incompatible: no search direction reduces the violation {violation}")]
    Incompatible { violation: f64 },
}

impl<ME, PE> From<EvalError<ME, PE>> for Error
where
    ME: StdError + Send + Sync + 'static,
    PE: StdError + Send + Sync + 'static,
{
    fn from(err: EvalError<ME, PE>) -> Self {
        match err {
            EvalError::Model(e) => Self::Model(Box::new(e)),
            EvalError::Problem(e) => Self::Problem(Box::new(e)),
        }
    }
}
