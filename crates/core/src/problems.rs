pub mod constrained;

pub use constrained::{ConstrainedProblem, Constraints};
