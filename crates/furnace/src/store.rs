use std::error::Error as StdError;

use crate::{error::Error, params::ParameterSet, result::OptimizationResult};

/// Persists the inputs and outcome of an optimization run.
///
/// Implementations record failures as well as successes. The optimizer
/// never calls a store itself; callers decide when to persist.
pub trait Store {
    /// Identifies a stored record.
    type Id;

    /// The store's own failure type.
    type Error: StdError + Send + Sync + 'static;

    /// Records one run and returns its id.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the record could not be written.
    fn store(
        &mut self,
        params: &ParameterSet,
        outcome: &Result<OptimizationResult, Error>,
    ) -> Result<Self::Id, Self::Error>;
}
