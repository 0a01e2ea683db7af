use nalgebra::{DMatrix, DVector};

use heatopt_core::Constraints;

use super::{
    gradient::{Jacobian, Scales},
    qp::{self, QpError, QpSolution, Row},
};

/// Hessian weight and linear cost on the elastic variable.
const ELASTIC_WEIGHT: f64 = 1e4;

/// A scaled constraint linearization `value + normalᵀ d`.
#[derive(Debug, Clone)]
struct Linear {
    normal: DVector<f64>,
    value: f64,
}

/// First-order model of the scaled objective and constraints at a point.
#[derive(Debug, Clone)]
pub(super) struct Linearization<const NE: usize, const NI: usize> {
    pub(super) gradient: DVector<f64>,
    equality: [Linear; NE],
    inequality: [Linear; NI],
}

impl<const NE: usize, const NI: usize> Linearization<NE, NI> {
    pub(super) fn new<const N: usize>(
        jacobian: &Jacobian<N, NE, NI>,
        constraints: &Constraints<NE, NI>,
        scales: &Scales<NE, NI>,
    ) -> Self {
        let scaled = |row: &[f64; N], scale: f64| DVector::from_fn(N, |i, _| row[i] * scale);

        Self {
            gradient: scaled(&jacobian.objective, scales.objective),
            equality: std::array::from_fn(|k| Linear {
                normal: scaled(&jacobian.equality[k], scales.equality[k]),
                value: constraints.equality[k] * scales.equality[k],
            }),
            inequality: std::array::from_fn(|k| Linear {
                normal: scaled(&jacobian.inequality[k], scales.inequality[k]),
                value: constraints.inequality[k] * scales.inequality[k],
            }),
        }
    }

    /// Gradient of the scaled Lagrangian `f - λᵀc` for the given multipliers.
    pub(super) fn lagrangian_gradient(
        &self,
        equality: &[f64; NE],
        inequality: &[f64; NI],
    ) -> DVector<f64> {
        let mut gradient = self.gradient.clone();
        for (row, u) in self.equality.iter().zip(equality) {
            gradient.axpy(-u, &row.normal, 1.0);
        }
        for (row, u) in self.inequality.iter().zip(inequality) {
            gradient.axpy(-u, &row.normal, 1.0);
        }
        gradient
    }
}

/// A search direction with the subproblem's constraint multipliers.
#[derive(Debug, Clone)]
pub(super) struct Step<const NE: usize, const NI: usize> {
    pub(super) direction: DVector<f64>,
    pub(super) equality: [f64; NE],
    pub(super) inequality: [f64; NI],

    /// Elastic variable value if the linearized constraints were relaxed.
    pub(super) relaxation: Option<f64>,
}

impl<const NE: usize, const NI: usize> Step<NE, NI> {
    fn new(solution: QpSolution, n: usize, elastic: bool) -> Self {
        let QpSolution { d, multipliers } = solution;
        Self {
            direction: d.rows(0, n).into_owned(),
            equality: std::array::from_fn(|k| multipliers[k]),
            inequality: std::array::from_fn(|k| multipliers[NE + k]),
            relaxation: elastic.then(|| d[n]),
        }
    }

    /// A zero step that enforces none of the linearized constraints.
    ///
    /// Stands in for a direction when no subproblem can be solved at the
    /// current point.
    pub(super) fn stalled(n: usize) -> Self {
        Self {
            direction: DVector::zeros(n),
            equality: [0.0; NE],
            inequality: [0.0; NI],
            relaxation: Some(1.0),
        }
    }

    /// The fraction of the linearized constraints this step enforces.
    pub(super) fn enforced(&self) -> f64 {
        1.0 - self.relaxation.unwrap_or(0.0)
    }
}

/// Solves the quadratic subproblem at `z` for a search direction.
///
/// The direction keeps `z + d` within `[lower, upper]`. If the linearized
/// constraints cannot all be met inside the bounds, an elastic variable
/// `δ ∈ [0, 1]` scales back every equality and violated inequality toward
/// the current point and the smallest workable `δ` is found instead.
pub(super) fn solve<const N: usize, const NE: usize, const NI: usize>(
    hessian: &DMatrix<f64>,
    local: &Linearization<NE, NI>,
    z: &[f64; N],
    lower: &[f64; N],
    upper: &[f64; N],
) -> Result<Step<NE, NI>, QpError> {
    let strict = build_rows(local, z, lower, upper, false);
    match qp::solve(hessian, &local.gradient, &strict) {
        Ok(solution) => Ok(Step::new(solution, N, false)),
        Err(QpError::Infeasible | QpError::Degenerate) => {
            let hessian = DMatrix::from_fn(N + 1, N + 1, |i, j| {
                if i < N && j < N {
                    hessian[(i, j)]
                } else if i == j {
                    ELASTIC_WEIGHT
                } else {
                    0.0
                }
            });
            let gradient = DVector::from_fn(N + 1, |i, _| {
                if i < N {
                    local.gradient[i]
                } else {
                    ELASTIC_WEIGHT
                }
            });
            let relaxed = build_rows(local, z, lower, upper, true);
            let solution = qp::solve(&hessian, &gradient, &relaxed)?;
            Ok(Step::new(solution, N, true))
        }
        Err(err) => Err(err),
    }
}

/// Builds constraint rows: equalities, inequalities, variable bounds, then
/// the elastic variable's own bounds.
fn build_rows<const N: usize, const NE: usize, const NI: usize>(
    local: &Linearization<NE, NI>,
    z: &[f64; N],
    lower: &[f64; N],
    upper: &[f64; N],
    elastic: bool,
) -> Vec<Row> {
    let dim = if elastic { N + 1 } else { N };

    let embed = |normal: &DVector<f64>, relax: f64| {
        DVector::from_fn(dim, |i, _| if i < N { normal[i] } else { relax })
    };
    let unit = |index: usize, sign: f64| {
        DVector::from_fn(dim, |i, _| if i == index { sign } else { 0.0 })
    };

    let mut rows = Vec::with_capacity(NE + NI + 2 * N + 2);

    for c in &local.equality {
        rows.push(Row::equality(embed(&c.normal, -c.value), -c.value));
    }

    for c in &local.inequality {
        let relax = if c.value < 0.0 { -c.value } else { 0.0 };
        rows.push(Row::inequality(embed(&c.normal, relax), -c.value));
    }

    for i in 0..N {
        #[allow(clippy::float_cmp)]
        if lower[i] == upper[i] {
            rows.push(Row::equality(unit(i, 1.0), 0.0));
            continue;
        }
        if lower[i].is_finite() {
            rows.push(Row::inequality(unit(i, 1.0), lower[i] - z[i]));
        }
        if upper[i].is_finite() {
            rows.push(Row::inequality(unit(i, -1.0), z[i] - upper[i]));
        }
    }

    if elastic {
        rows.push(Row::inequality(unit(N, 1.0), 0.0));
        rows.push(Row::inequality(unit(N, -1.0), -1.0));
    }

    rows
}
