//! Sequential quadratic programming for smooth constrained minimization.
//!
//! # Algorithm
//!
//! Each iteration linearizes the constraints and builds a quadratic model of
//! the Lagrangian around the current point, then solves that quadratic
//! subproblem for a search direction:
//!
//! - Variables are mapped onto the unit box when both bounds are finite, so a
//!   step of `1.0` always means "the full width of the bound".
//! - Gradients are approximated by central finite differences, falling back
//!   to one-sided differences at a bound.
//! - The Hessian of the Lagrangian is approximated with a damped BFGS update,
//!   which keeps it positive definite.
//! - The quadratic subproblem is solved with a dual active-set method. When
//!   the linearized constraints are inconsistent, an elastic variable relaxes
//!   them toward the current point. If no subproblem can be solved even from
//!   a freshly reset Hessian, the iteration stalls with a zero step.
//! - Steps are accepted by a backtracking line search on an L1 exact-penalty
//!   merit function.
//!
//! # Convergence
//!
//! The solver reports [`Status::Converged`] once the scaled constraint
//! violation is within the feasibility tolerance and either the search
//! direction vanishes or a full step changes the objective by at most the
//! function tolerance. Each constraint is scaled by its initial gradient
//! size, so the test does not depend on the constraint's units.
//!
//! # Limitations
//!
//! - **Local**: Finds a local minimum near the starting point.
//! - **Smoothness**: Assumes the objective and constraints are continuously
//!   differentiable over the bounds.
//! - **Dense**: Intended for a handful of variables and constraints.
//!
//! # Observer Events
//!
//! The solver emits one [`Event`] per iteration, after the line search has
//! accepted a new point. Observers can return [`Action::StopEarly`] to stop
//! with the latest point.

mod action;
mod bfgs;
mod config;
mod error;
mod event;
mod gradient;
mod line_search;
mod qp;
mod scaling;
mod search;
mod solution;
mod subproblem;

#[cfg(test)]
mod tests;

pub use action::Action;
pub use config::{Config, ConfigError};
pub use error::Error;
pub use event::Event;
pub use solution::{Solution, Status};

use heatopt_core::{ConstrainedProblem, Model, Observer};

use search::search;

/// Finds a constrained local minimum of the objective.
///
/// `x0` is projected into `bounds` before the first evaluation. Each bound is
/// `[lower, upper]`; either side may be infinite.
///
/// The observer receives an [`Event`] for each iteration.
/// See the [module docs](self) for details.
///
/// # Errors
///
/// Returns an error if the bounds or starting point are invalid, the model or
/// problem fails, an evaluation is non-finite, or the linearized constraints
/// admit no search direction.
pub fn minimize<M, P, Obs, const N: usize, const NE: usize, const NI: usize>(
    model: &M,
    problem: &P,
    x0: [f64; N],
    bounds: [[f64; 2]; N],
    config: &Config,
    observer: Obs,
) -> Result<Solution<M::Input, M::Output, N>, Error>
where
    M: Model,
    P: ConstrainedProblem<N, NE, NI, Input = M::Input, Output = M::Output>,
    Obs: for<'a> Observer<Event<'a, M::Input, M::Output>, Action>,
{
    search(model, problem, x0, bounds, config, observer)
}

/// Finds a constrained local minimum without observer support.
///
/// This is a convenience wrapper around [`minimize`] that uses a no-op observer.
///
/// # Errors
///
/// Returns an error under the same conditions as [`minimize`].
pub fn minimize_unobserved<M, P, const N: usize, const NE: usize, const NI: usize>(
    model: &M,
    problem: &P,
    x0: [f64; N],
    bounds: [[f64; 2]; N],
    config: &Config,
) -> Result<Solution<M::Input, M::Output, N>, Error>
where
    M: Model,
    P: ConstrainedProblem<N, NE, NI, Input = M::Input, Output = M::Output>,
{
    minimize(model, problem, x0, bounds, config, ())
}
