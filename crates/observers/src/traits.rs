//! Capability traits for cross-solver observers.
//!
//! These traits abstract over solver-specific event and action types, enabling
//! observers to work generically across different solvers.
//!
//! # Event traits
//!
//! - [`HasIteration`] — events emitted once per solver iteration
//! - [`HasObjective`] — events that carry an objective value
//! - [`HasViolation`] — events that carry a total constraint violation
//!
//! # Action traits
//!
//! - [`CanStopEarly`] — actions that can signal early termination
//!
//! # Example
//!
//! ```rust
//! use heatopt_core::Observer;
//! use heatopt_observers::traits::{CanStopEarly, HasViolation};
//!
//! struct FeasibleEnough {
//!     tolerance: f64,
//!     min_iters: usize,
//!     iter: usize,
//! }
//!
//! impl<E: HasViolation, A: CanStopEarly> Observer<E, A> for FeasibleEnough {
//!     fn observe(&mut self, event: &E) -> Option<A> {
//!         self.iter += 1;
//!         if self.iter >= self.min_iters && event.violation() < self.tolerance {
//!             return Some(A::stop_early());
//!         }
//!         None
//!     }
//! }
//! ```

use heatopt_solvers::optimization::sqp;

/// An event emitted once per solver iteration.
pub trait HasIteration {
    /// Returns the 1-based iteration number.
    fn iteration(&self) -> usize;
}

/// An event that carries an objective value.
pub trait HasObjective {
    /// Returns the objective for this event.
    fn objective(&self) -> f64;
}

/// An event that carries a total constraint violation.
pub trait HasViolation {
    /// Returns the violation for this event; zero means feasible.
    fn violation(&self) -> f64;
}

/// An action type that can signal early termination.
pub trait CanStopEarly {
    /// Returns the action that stops the solver early.
    fn stop_early() -> Self;
}

// --- sqp::Event ---

impl<I, O> HasIteration for sqp::Event<'_, I, O> {
    fn iteration(&self) -> usize {
        self.iter
    }
}

impl<I, O> HasObjective for sqp::Event<'_, I, O> {
    fn objective(&self) -> f64 {
        self.objective
    }
}

impl<I, O> HasViolation for sqp::Event<'_, I, O> {
    fn violation(&self) -> f64 {
        self.violation
    }
}

// --- CanStopEarly impls ---

impl CanStopEarly for sqp::Action {
    fn stop_early() -> Self {
        Self::StopEarly
    }
}
