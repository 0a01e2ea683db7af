//! Dense convex quadratic programming by the Goldfarb–Idnani dual method.
//!
//! Solves
//!
//! ```text
//! minimize    ½ dᵀ G d + gᵀ d
//! subject to  nᵢᵀ d = bᵢ   (equality rows)
//!             nᵢᵀ d ≥ bᵢ   (inequality rows)
//! ```
//!
//! for a symmetric positive definite `G`. The dual method starts from the
//! unconstrained minimizer and adds violated rows one at a time, so it needs
//! no feasible starting point and detects infeasibility directly.

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

/// Violations smaller than this (relative to the row's right-hand side) are
/// treated as satisfied.
const VIOLATION_TOL: f64 = 1e-12;

/// A primal step shorter than this fraction of the unconstrained step for the
/// same row means the row is linearly dependent on the active set.
const DEPENDENT_TOL: f64 = 1e-10;

/// A dependent inequality row violated by less than this (relative to its
/// right-hand side) conflicts with the active set only through rounding.
const CONFLICT_TOL: f64 = 1e-8;

/// Errors that can occur when solving a quadratic subproblem.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub(super) enum QpError {
    #[error("Hessian approximation is not positive definite")]
    NotPositiveDefinite,

    #[error("constraints are infeasible")]
    Infeasible,

    #[error("active constraints are linearly dependent")]
    Degenerate,

    #[error("active-set iteration limit reached")]
    IterationLimit,
}

/// Whether a row must hold with equality or as a lower limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Kind {
    Equality,
    Inequality,
}

/// A single linear constraint `normalᵀ d (= | ≥) rhs`.
#[derive(Debug, Clone)]
pub(super) struct Row {
    pub(super) normal: DVector<f64>,
    pub(super) rhs: f64,
    pub(super) kind: Kind,
}

impl Row {
    pub(super) fn equality(normal: DVector<f64>, rhs: f64) -> Self {
        Self {
            normal,
            rhs,
            kind: Kind::Equality,
        }
    }

    pub(super) fn inequality(normal: DVector<f64>, rhs: f64) -> Self {
        Self {
            normal,
            rhs,
            kind: Kind::Inequality,
        }
    }

    /// Signed slack of the row at `d`; negative means violated.
    fn slack(&self, d: &DVector<f64>) -> f64 {
        self.normal.dot(d) - self.rhs
    }

    fn tolerance(&self) -> f64 {
        VIOLATION_TOL * (1.0 + self.rhs.abs())
    }
}

/// The minimizer and one Lagrange multiplier per row.
///
/// Multipliers satisfy `G d + g = Σ uᵢ nᵢ`; inactive rows have `uᵢ = 0` and
/// inequality multipliers are non-negative.
#[derive(Debug, Clone)]
pub(super) struct QpSolution {
    pub(super) d: DVector<f64>,
    pub(super) multipliers: Vec<f64>,
}

/// An active row, oriented so that its slack was non-positive when added.
#[derive(Debug, Clone, Copy)]
struct Active {
    row: usize,
    sign: f64,
    u: f64,
}

/// Solves the quadratic program.
pub(super) fn solve(
    hessian: &DMatrix<f64>,
    gradient: &DVector<f64>,
    rows: &[Row],
) -> Result<QpSolution, QpError> {
    let n = gradient.len();
    let g_inv = hessian
        .clone()
        .cholesky()
        .ok_or(QpError::NotPositiveDefinite)?
        .inverse();

    let mut d = -(&g_inv * gradient);
    let mut active: Vec<Active> = Vec::with_capacity(n);
    let mut is_active = vec![false; rows.len()];
    let mut ignored = vec![false; rows.len()];

    let max_steps = 10 * (rows.len() + n) + 10;
    let mut steps = 0;

    while let Some((p, sign)) = select(rows, &d, &is_active, &ignored) {
        let normal = &rows[p].normal * sign;
        let rhs = rows[p].rhs * sign;
        let mut u_p = 0.0;

        loop {
            steps += 1;
            if steps > max_steps {
                return Err(QpError::IterationLimit);
            }

            let (z, r) = directions(&g_inv, rows, &active, &normal)?;

            let blocking = active
                .iter()
                .zip(r.iter())
                .enumerate()
                .filter(|(_, (a, r_j))| rows[a.row].kind == Kind::Inequality && **r_j > 0.0)
                .map(|(j, (a, r_j))| (j, a.u / r_j))
                .min_by(|a, b| a.1.total_cmp(&b.1));

            let unconstrained = (&g_inv * &normal).norm();
            if z.norm() <= DEPENDENT_TOL * unconstrained {
                // Pure dual step: the new row cannot move `d` until a
                // blocking row leaves the active set.
                let Some((k, t1)) = blocking else {
                    if rows[p].kind == Kind::Equality {
                        return Err(QpError::Degenerate);
                    }
                    if rhs - normal.dot(&d) > CONFLICT_TOL * (1.0 + rows[p].rhs.abs()) {
                        return Err(QpError::Infeasible);
                    }
                    // Left unenforced with a zero multiplier.
                    ignored[p] = true;
                    break;
                };
                for (a, r_j) in active.iter_mut().zip(r.iter()) {
                    a.u -= t1 * r_j;
                }
                u_p += t1;
                is_active[active[k].row] = false;
                active.remove(k);
                continue;
            }

            let slack = normal.dot(&d) - rhs;
            let t2 = (-slack / z.dot(&normal)).max(0.0);
            let t1 = blocking.map_or(f64::INFINITY, |(_, t)| t);
            let t = t1.min(t2);

            d.axpy(t, &z, 1.0);
            for (a, r_j) in active.iter_mut().zip(r.iter()) {
                a.u -= t * r_j;
            }
            u_p += t;

            if t2 <= t1 {
                active.push(Active {
                    row: p,
                    sign,
                    u: u_p,
                });
                is_active[p] = true;
                break;
            }

            if let Some((k, _)) = blocking {
                is_active[active[k].row] = false;
                active.remove(k);
            }
        }
    }

    let mut multipliers = vec![0.0; rows.len()];
    for a in &active {
        multipliers[a.row] = a.sign * a.u;
    }

    Ok(QpSolution { d, multipliers })
}

/// Picks the next row to add.
///
/// Inactive equality rows come first, in order, oriented so their slack is
/// non-positive. Otherwise the most violated inequality row is chosen,
/// skipping rows already found to conflict only through rounding.
fn select(
    rows: &[Row],
    d: &DVector<f64>,
    is_active: &[bool],
    ignored: &[bool],
) -> Option<(usize, f64)> {
    if let Some((i, row)) = rows
        .iter()
        .enumerate()
        .find(|(i, row)| row.kind == Kind::Equality && !is_active[*i])
    {
        let sign = if row.slack(d) > 0.0 { -1.0 } else { 1.0 };
        return Some((i, sign));
    }

    rows.iter()
        .enumerate()
        .filter(|(i, row)| row.kind == Kind::Inequality && !is_active[*i] && !ignored[*i])
        .map(|(i, row)| (i, row.slack(d), row.tolerance()))
        .filter(|(_, slack, tol)| *slack < -tol)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _, _)| (i, 1.0))
}

/// Computes the primal step direction `z` and the dual step direction `r`
/// for adding `normal` to the active set.
fn directions(
    g_inv: &DMatrix<f64>,
    rows: &[Row],
    active: &[Active],
    normal: &DVector<f64>,
) -> Result<(DVector<f64>, DVector<f64>), QpError> {
    let n = normal.len();
    let q = active.len();

    if q == 0 {
        return Ok((g_inv * normal, DVector::zeros(0)));
    }

    let basis = DMatrix::from_fn(n, q, |i, j| active[j].sign * rows[active[j].row].normal[i]);
    let g_inv_basis = g_inv * &basis;
    let gram = basis.transpose() * &g_inv_basis;
    let projected = g_inv_basis.transpose() * normal;

    let r = gram
        .cholesky()
        .ok_or(QpError::Degenerate)?
        .solve(&projected);
    let z = g_inv * normal - &g_inv_basis * &r;

    Ok((z, r))
}
