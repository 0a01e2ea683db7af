use heatopt_core::Snapshot;

/// Iteration event emitted by the SQP solver.
///
/// Emitted once per iteration after the line search has accepted a point.
pub struct Event<'a, I, O> {
    /// Iteration counter (1-based).
    pub iter: usize,

    /// The accepted point, in problem units.
    pub x: &'a [f64],

    /// Objective value at the accepted point.
    pub objective: f64,

    /// Total constraint violation at the accepted point.
    pub violation: f64,

    /// Fraction of the search direction taken by the line search.
    pub step_length: f64,

    /// Whether the quadratic subproblem had to be relaxed this iteration.
    pub relaxed: bool,

    /// Model input and output at the accepted point.
    pub snapshot: &'a Snapshot<I, O>,
}
