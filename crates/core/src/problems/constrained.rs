/// Constraint values computed at a single point.
///
/// Equality constraints are satisfied when each value is zero. Inequality
/// constraints are satisfied when each value is non-negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraints<const NE: usize, const NI: usize> {
    pub equality: [f64; NE],
    pub inequality: [f64; NI],
}

impl<const NE: usize, const NI: usize> Constraints<NE, NI> {
    /// Creates constraint values from equality and inequality arrays.
    #[must_use]
    pub fn new(equality: [f64; NE], inequality: [f64; NI]) -> Self {
        Self {
            equality,
            inequality,
        }
    }

    /// Returns the total constraint violation.
    ///
    /// This is the sum of absolute equality residuals plus the magnitude of
    /// every negative inequality value. A feasible point has zero violation.
    #[must_use]
    pub fn violation(&self) -> f64 {
        let eq: f64 = self.equality.iter().map(|c| c.abs()).sum();
        let ineq: f64 = self.inequality.iter().map(|c| (-c).max(0.0)).sum();
        eq + ineq
    }

    /// Returns `true` if every value is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.equality
            .iter()
            .chain(self.inequality.iter())
            .all(|c| c.is_finite())
    }
}

/// Defines a constrained minimization problem to be solved.
///
/// A constrained problem maps solver variables to a model input, then
/// computes an objective value and constraint values from the model input and
/// output. Solvers search for the input that minimizes the objective while
/// keeping every equality constraint at zero and every inequality constraint
/// non-negative.
///
/// The const generics are the number of solver variables (`N`), equality
/// constraints (`NE`), and inequality constraints (`NI`).
pub trait ConstrainedProblem<const N: usize, const NE: usize, const NI: usize> {
    type Input;
    type Output;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Maps solver variables (`x`) into a model input.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the input cannot be constructed from `x`.
    fn input(&self, x: &[f64; N]) -> Result<Self::Input, Self::Error>;

    /// Computes the objective value from model input/output.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the objective cannot be computed.
    fn objective(&self, input: &Self::Input, output: &Self::Output) -> Result<f64, Self::Error>;

    /// Computes constraint values from model input/output.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the constraints cannot be computed.
    fn constraints(
        &self,
        input: &Self::Input,
        output: &Self::Output,
    ) -> Result<Constraints<NE, NI>, Self::Error>;
}
