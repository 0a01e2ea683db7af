//! Reusable observers for heatopt solvers.
//!
//! This crate provides [`Observer`] implementations and capability traits that
//! work across solvers without naming their event types.
//!
//! # Modules
//!
//! - [`traits`] — Capability traits for cross-solver observers
//!   ([`HasIteration`], [`HasObjective`], [`HasViolation`], [`CanStopEarly`])
//! - [`TraceObserver`] — logs each solver iteration through `tracing`
//!
//! [`Observer`]: heatopt_core::Observer
//! [`HasIteration`]: traits::HasIteration
//! [`HasObjective`]: traits::HasObjective
//! [`HasViolation`]: traits::HasViolation
//! [`CanStopEarly`]: traits::CanStopEarly

mod trace;
pub mod traits;

pub use trace::TraceObserver;
