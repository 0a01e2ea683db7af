use nalgebra::DVector;

use heatopt_core::{ConstrainedProblem, Constraints, Model};

use crate::optimization::Evaluation;

use super::{
    Error,
    gradient::{Scales, probe},
    scaling::Scaling,
    subproblem::Step,
};

/// Sufficient decrease constant for the Armijo condition.
const ARMIJO: f64 = 1e-4;

/// Backtracking steps before the last trial point is accepted regardless.
const MAX_BACKTRACKS: usize = 10;

/// L1 exact-penalty merit function on scaled objective and constraints.
///
/// `φ = s_f·f + Σ ρₑ|sₑ·cₑ| + Σ ρᵢ·max(0, -sᵢ·cᵢ)`
#[derive(Debug, Clone, Copy)]
pub(super) struct Merit<const NE: usize, const NI: usize> {
    scales: Scales<NE, NI>,
    equality: [f64; NE],
    inequality: [f64; NI],
}

impl<const NE: usize, const NI: usize> Merit<NE, NI> {
    pub(super) fn new(scales: Scales<NE, NI>) -> Self {
        Self {
            scales,
            equality: [0.0; NE],
            inequality: [0.0; NI],
        }
    }

    /// Raises each penalty to at least its multiplier's magnitude.
    ///
    /// Penalties only decay halfway toward a smaller multiplier, which keeps
    /// the merit function from changing shape abruptly between iterations.
    pub(super) fn update(&mut self, step: &Step<NE, NI>) {
        let raise = |rho: &mut f64, u: f64| {
            *rho = u.abs().max(0.5 * (*rho + u.abs()));
        };
        for (rho, u) in self.equality.iter_mut().zip(step.equality) {
            raise(rho, u);
        }
        for (rho, u) in self.inequality.iter_mut().zip(step.inequality) {
            raise(rho, u);
        }
    }

    /// The weighted constraint violation part of the merit function.
    pub(super) fn penalty(&self, constraints: &Constraints<NE, NI>) -> f64 {
        let eq: f64 = (0..NE)
            .map(|k| self.equality[k] * (self.scales.equality[k] * constraints.equality[k]).abs())
            .sum();
        let ineq: f64 = (0..NI)
            .map(|k| {
                self.inequality[k] * (-self.scales.inequality[k] * constraints.inequality[k]).max(0.0)
            })
            .sum();
        eq + ineq
    }

    pub(super) fn value(&self, objective: f64, constraints: &Constraints<NE, NI>) -> f64 {
        self.scales.objective * objective + self.penalty(constraints)
    }
}

/// The point accepted by the line search.
pub(super) struct Accepted<I, O, const N: usize, const NE: usize, const NI: usize> {
    pub(super) z: [f64; N],
    pub(super) eval: Evaluation<I, O, N, NE, NI>,
    pub(super) alpha: f64,
}

/// Backtracks along `direction` from `z` until the merit function decreases
/// sufficiently.
///
/// A non-descent `slope` accepts the first finite trial point. Non-finite
/// trial points count as failed trials. After [`MAX_BACKTRACKS`] reductions
/// the latest finite trial point is accepted.
#[allow(clippy::too_many_arguments)]
pub(super) fn backtrack<M, P, const N: usize, const NE: usize, const NI: usize>(
    model: &M,
    problem: &P,
    scaling: &Scaling<N>,
    merit: &Merit<NE, NI>,
    z: &[f64; N],
    start: f64,
    direction: &DVector<f64>,
    slope: f64,
    evals: &mut usize,
) -> Result<Accepted<M::Input, M::Output, N, NE, NI>, Error>
where
    M: Model,
    P: ConstrainedProblem<N, NE, NI, Input = M::Input, Output = M::Output>,
{
    let mut alpha = 1.0;
    let mut backtracks = 0;

    loop {
        let trial: [f64; N] = std::array::from_fn(|i| z[i] + alpha * direction[i]);
        let trial = scaling.project(&trial);
        let eval = probe::<M, P, N, NE, NI>(model, problem, scaling, &trial, evals)?;

        if !eval.is_finite() {
            if backtracks == MAX_BACKTRACKS {
                return Err(Error::NonFiniteEvaluation { x: eval.x.to_vec() });
            }
            alpha *= 0.5;
            backtracks += 1;
            continue;
        }

        let value = merit.value(eval.objective, &eval.constraints);
        let decreased = slope >= 0.0 || value <= start + ARMIJO * alpha * slope;
        if decreased || backtracks == MAX_BACKTRACKS {
            return Ok(Accepted {
                z: trial,
                eval,
                alpha,
            });
        }

        // Minimizer of the quadratic through φ(0), φ'(0), and φ(α).
        let curvature = 2.0 * (value - start - slope * alpha);
        let interpolated = -slope * alpha * alpha / curvature;
        alpha = if interpolated.is_finite() {
            interpolated.clamp(0.1 * alpha, 0.5 * alpha)
        } else {
            0.5 * alpha
        };
        backtracks += 1;
    }
}
