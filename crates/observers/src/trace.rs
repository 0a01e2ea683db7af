use heatopt_core::Observer;

use crate::traits::{HasIteration, HasObjective, HasViolation};

/// An observer that logs every solver iteration at `debug` level.
///
/// Each event is emitted with the observer's `label` so that concurrent runs
/// can be told apart in the log. The observer never changes the course of
/// the solve.
#[derive(Debug, Clone)]
pub struct TraceObserver {
    label: String,
}

impl TraceObserver {
    /// Creates an observer that tags its log lines with `label`.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl<E, A> Observer<E, A> for TraceObserver
where
    E: HasIteration + HasObjective + HasViolation,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        tracing::debug!(
            run = %self.label,
            iter = event.iteration(),
            objective = event.objective(),
            violation = event.violation(),
            "solver iteration"
        );

        None
    }
}
