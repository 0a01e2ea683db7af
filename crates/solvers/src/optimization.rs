//! Solvers for constrained optimization problems.
//!
//! A [`ConstrainedProblem`] maps solver variables `x: [f64; N]` to model
//! inputs, calls the model, and extracts a scalar objective along with
//! equality and inequality constraint values. Solvers in this module search
//! for the `x` that minimizes that objective subject to the constraints and
//! per-variable bounds.
//!
//! # Solvers
//!
//! - [`sqp`] — sequential quadratic programming for smooth problems with
//!   bounds, equality constraints, and inequality constraints
//!
//! [`ConstrainedProblem`]: heatopt_core::ConstrainedProblem

mod evaluate;

pub use evaluate::{EvalError, EvaluateResult, Evaluation, evaluate};

pub mod sqp;
