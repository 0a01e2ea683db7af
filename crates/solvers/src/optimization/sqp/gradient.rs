use heatopt_core::{ConstrainedProblem, Constraints, Model};

use crate::optimization::{Evaluation, evaluate};

use super::{Error, scaling::Scaling};

/// Evaluates the problem at solver variables `z` and counts the call.
///
/// Non-finite objective or constraint values are returned as-is; callers
/// decide whether they are fatal.
pub(super) fn probe<M, P, const N: usize, const NE: usize, const NI: usize>(
    model: &M,
    problem: &P,
    scaling: &Scaling<N>,
    z: &[f64; N],
    evals: &mut usize,
) -> Result<Evaluation<M::Input, M::Output, N, NE, NI>, Error>
where
    M: Model,
    P: ConstrainedProblem<N, NE, NI, Input = M::Input, Output = M::Output>,
{
    *evals += 1;
    let eval = evaluate::<M, P, N, NE, NI>(model, problem, scaling.to_problem(z))?;
    Ok(eval)
}

/// Partial derivatives with respect to solver variables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Jacobian<const N: usize, const NE: usize, const NI: usize> {
    pub(super) objective: [f64; N],
    pub(super) equality: [[f64; N]; NE],
    pub(super) inequality: [[f64; N]; NI],
}

/// Multipliers that bring each function's gradient to unit size or below.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Scales<const NE: usize, const NI: usize> {
    pub(super) objective: f64,
    pub(super) equality: [f64; NE],
    pub(super) inequality: [f64; NI],
}

impl<const N: usize, const NE: usize, const NI: usize> Jacobian<N, NE, NI> {
    fn zeros() -> Self {
        Self {
            objective: [0.0; N],
            equality: [[0.0; N]; NE],
            inequality: [[0.0; N]; NI],
        }
    }

    /// Fills column `i` with the difference quotient of two samples.
    fn set_column(&mut self, i: usize, ahead: &Sample<NE, NI>, behind: &Sample<NE, NI>, h: f64) {
        self.objective[i] = (ahead.0 - behind.0) / h;

        let (a, b) = (&ahead.1, &behind.1);
        for (k, row) in self.equality.iter_mut().enumerate() {
            row[i] = (a.equality[k] - b.equality[k]) / h;
        }
        for (k, row) in self.inequality.iter_mut().enumerate() {
            row[i] = (a.inequality[k] - b.inequality[k]) / h;
        }
    }

    /// Computes function scales as `1 / max(1, ‖∇‖∞)`.
    pub(super) fn scales(&self) -> Scales<NE, NI> {
        fn scale<const N: usize>(row: &[f64; N]) -> f64 {
            1.0 / row.iter().fold(1.0_f64, |m, g| m.max(g.abs()))
        }

        Scales {
            objective: scale(&self.objective),
            equality: std::array::from_fn(|k| scale(&self.equality[k])),
            inequality: std::array::from_fn(|k| scale(&self.inequality[k])),
        }
    }
}

impl<const NE: usize, const NI: usize> Scales<NE, NI> {
    /// Total violation of the scaled constraints.
    pub(super) fn violation(&self, constraints: &Constraints<NE, NI>) -> f64 {
        Constraints::<NE, NI>::new(
            std::array::from_fn(|k| self.equality[k] * constraints.equality[k]),
            std::array::from_fn(|k| self.inequality[k] * constraints.inequality[k]),
        )
        .violation()
    }
}

type Sample<const NE: usize, const NI: usize> = (f64, Constraints<NE, NI>);

enum Stencil {
    Central(f64),
    Forward(f64),
    Backward(f64),
}

/// Approximates the Jacobian at `z` by finite differences.
///
/// Central differences are used where both probes stay inside the bounds,
/// otherwise a one-sided difference pointing into the bounds. Variables fixed
/// by equal bounds get a zero column.
pub(super) fn linearize<M, P, const N: usize, const NE: usize, const NI: usize>(
    model: &M,
    problem: &P,
    scaling: &Scaling<N>,
    z: &[f64; N],
    center: &Evaluation<M::Input, M::Output, N, NE, NI>,
    evals: &mut usize,
) -> Result<Jacobian<N, NE, NI>, Error>
where
    M: Model,
    P: ConstrainedProblem<N, NE, NI, Input = M::Input, Output = M::Output>,
{
    let lower = scaling.lower();
    let upper = scaling.upper();
    let center: Sample<NE, NI> = (center.objective, center.constraints);

    let mut jacobian = Jacobian::zeros();

    for i in 0..N {
        #[allow(clippy::float_cmp)]
        if lower[i] == upper[i] {
            continue;
        }

        let magnitude = z[i].abs().max(1.0);
        let central = f64::EPSILON.cbrt() * magnitude;
        let one_sided = f64::EPSILON.sqrt() * magnitude;

        let stencil = if z[i] - central >= lower[i] && z[i] + central <= upper[i] {
            Stencil::Central(central)
        } else if z[i] + one_sided <= upper[i] {
            Stencil::Forward(one_sided)
        } else {
            Stencil::Backward(one_sided)
        };

        let mut sample = |zi: f64| -> Result<Sample<NE, NI>, Error> {
            let mut shifted = *z;
            shifted[i] = zi;
            let eval = probe::<M, P, N, NE, NI>(model, problem, scaling, &shifted, evals)?;
            if !eval.is_finite() {
                return Err(Error::NonFiniteEvaluation { x: eval.x.to_vec() });
            }
            Ok((eval.objective, eval.constraints))
        };

        let (ahead, behind, h) = match stencil {
            Stencil::Central(h) => {
                let (hi, lo) = (z[i] + h, z[i] - h);
                (sample(hi)?, sample(lo)?, hi - lo)
            }
            Stencil::Forward(h) => {
                let hi = z[i] + h;
                (sample(hi)?, center, hi - z[i])
            }
            Stencil::Backward(h) => {
                let lo = z[i] - h;
                (center, sample(lo)?, z[i] - lo)
            }
        };

        jacobian.set_column(i, &ahead, &behind, h);
    }

    Ok(jacobian)
}
