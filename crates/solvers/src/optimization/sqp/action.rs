/// Actions an observer can take during an SQP solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Stop the solver early and return the latest accepted point.
    StopEarly,
}
