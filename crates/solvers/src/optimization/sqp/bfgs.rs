use nalgebra::{DMatrix, DVector};

/// Steps shorter than this leave the approximation unchanged.
const MIN_STEP: f64 = 1e-14;

/// Applies Powell's damped BFGS update to `hessian`.
///
/// When the curvature `sᵀy` is too small relative to `sᵀBs`, `y` is blended
/// with `Bs` so the update stays positive definite. If rounding still breaks
/// positive definiteness the approximation is reset to the identity.
pub(super) fn update(hessian: &mut DMatrix<f64>, s: &DVector<f64>, y: &DVector<f64>) {
    if s.norm() <= MIN_STEP {
        return;
    }

    let bs = &*hessian * s;
    let sbs = s.dot(&bs);
    if !sbs.is_finite() || sbs <= 0.0 {
        reset(hessian);
        return;
    }

    let sy = s.dot(y);
    let theta = if sy >= 0.2 * sbs {
        1.0
    } else {
        0.8 * sbs / (sbs - sy)
    };
    let r = y * theta + &bs * (1.0 - theta);
    let sr = s.dot(&r);

    *hessian -= &bs * bs.transpose() / sbs;
    *hessian += &r * r.transpose() / sr;

    let symmetric = (&*hessian + hessian.transpose()) * 0.5;
    *hessian = symmetric;

    if !hessian.iter().all(|h| h.is_finite()) || hessian.clone().cholesky().is_none() {
        reset(hessian);
    }
}

/// Returns `true` if `hessian` is the identity it starts from.
pub(super) fn is_reset(hessian: &DMatrix<f64>) -> bool {
    *hessian == DMatrix::identity(hessian.nrows(), hessian.ncols())
}

/// Discards the curvature information gathered so far.
pub(super) fn reset(hessian: &mut DMatrix<f64>) {
    let n = hessian.nrows();
    *hessian = DMatrix::identity(n, n);
}
