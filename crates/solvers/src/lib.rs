//! Numerical solvers for the heatopt workspace.
//!
//! Solvers evaluate a [`Model`] through a problem trait from
//! [`heatopt_core`] and report their progress to an [`Observer`].
//!
//! [`Model`]: heatopt_core::Model
//! [`Observer`]: heatopt_core::Observer

pub mod optimization;
