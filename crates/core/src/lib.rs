//! Core traits and types for the heatopt workspace.
//!
//! This crate defines the shared abstractions that solvers, observers, and
//! process models build on:
//!
//! - [`Model`] — a callable that maps a typed input to a typed output
//! - [`Snapshot`] — a captured input/output pair from a model call
//! - [`Observer`] — receives solver events and optionally returns control actions
//! - [`ConstrainedProblem`] — adapts solver variables to model inputs and
//!   extracts an objective plus equality/inequality [`Constraints`] from
//!   model outputs

mod model;
mod observer;
mod problems;

pub use observer::Observer;
pub use problems::{ConstrainedProblem, Constraints};
pub use {model::Model, model::Snapshot};
