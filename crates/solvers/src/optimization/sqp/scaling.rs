use super::Error;

/// Affine map between problem variables `x` and solver variables `z`.
///
/// A variable with two finite, distinct bounds maps onto `[0, 1]`.
/// A variable fixed by equal bounds maps onto `[0, 0]`.
/// Any other variable is left unscaled.
#[derive(Debug, Clone, Copy)]
pub(super) struct Scaling<const N: usize> {
    bounds: [[f64; 2]; N],
    offset: [f64; N],
    width: [f64; N],
    lower: [f64; N],
    upper: [f64; N],
}

impl<const N: usize> Scaling<N> {
    /// Validates the bounds and builds the scaling.
    pub(super) fn new(bounds: [[f64; 2]; N]) -> Result<Self, Error> {
        let mut offset = [0.0; N];
        let mut width = [1.0; N];
        let mut lower = [0.0; N];
        let mut upper = [0.0; N];

        for (index, &[lo, hi]) in bounds.iter().enumerate() {
            if lo.is_nan() || hi.is_nan() || lo > hi || lo == f64::INFINITY || hi == f64::NEG_INFINITY
            {
                return Err(Error::InvalidBounds {
                    index,
                    lower: lo,
                    upper: hi,
                });
            }

            if lo.is_finite() && hi.is_finite() {
                offset[index] = lo;
                #[allow(clippy::float_cmp)]
                if lo == hi {
                    upper[index] = 0.0;
                } else {
                    width[index] = hi - lo;
                    upper[index] = 1.0;
                }
            } else {
                lower[index] = lo;
                upper[index] = hi;
            }
        }

        Ok(Self {
            bounds,
            offset,
            width,
            lower,
            upper,
        })
    }

    /// Lower bounds in solver variables.
    pub(super) fn lower(&self) -> &[f64; N] {
        &self.lower
    }

    /// Upper bounds in solver variables.
    pub(super) fn upper(&self) -> &[f64; N] {
        &self.upper
    }

    /// Maps solver variables to problem variables, clamped to the bounds.
    pub(super) fn to_problem(&self, z: &[f64; N]) -> [f64; N] {
        std::array::from_fn(|i| {
            let [lo, hi] = self.bounds[i];
            (self.offset[i] + self.width[i] * z[i]).clamp(lo, hi)
        })
    }

    /// Maps problem variables to solver variables, projecting into the bounds.
    pub(super) fn to_solver(&self, x: &[f64; N]) -> [f64; N] {
        std::array::from_fn(|i| {
            ((x[i] - self.offset[i]) / self.width[i]).clamp(self.lower[i], self.upper[i])
        })
    }

    /// Projects solver variables into their bounds.
    pub(super) fn project(&self, z: &[f64; N]) -> [f64; N] {
        std::array::from_fn(|i| z[i].clamp(self.lower[i], self.upper[i]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn finite_bounds_map_to_unit_interval() {
        let scaling = Scaling::new([[1000.0, 5000.0], [0.05, 0.3]]).unwrap();

        let z = scaling.to_solver(&[3000.0, 0.3]);
        assert_relative_eq!(z[0], 0.5);
        assert_relative_eq!(z[1], 1.0);

        let x = scaling.to_problem(&[0.25, 0.0]);
        assert_relative_eq!(x[0], 2000.0);
        assert_relative_eq!(x[1], 0.05);
    }

    #[test]
    fn projects_start_into_bounds() {
        let scaling = Scaling::new([[0.0, 10.0]]).unwrap();
        assert_relative_eq!(scaling.to_solver(&[-5.0])[0], 0.0);
        assert_relative_eq!(scaling.to_solver(&[50.0])[0], 1.0);
    }

    #[test]
    fn fixed_and_unbounded_variables() {
        let scaling = Scaling::new([[2.0, 2.0], [f64::NEG_INFINITY, 3.0]]).unwrap();

        assert_eq!(scaling.lower(), &[0.0, f64::NEG_INFINITY]);
        assert_eq!(scaling.upper(), &[0.0, 3.0]);

        let x = scaling.to_problem(&[0.0, -7.5]);
        assert_relative_eq!(x[0], 2.0);
        assert_relative_eq!(x[1], -7.5);
    }

    #[test]
    fn rejects_inverted_or_nan_bounds() {
        assert!(matches!(
            Scaling::new([[0.0, 1.0], [5.0, 1.0]]),
            Err(Error::InvalidBounds { index: 1, .. })
        ));
        assert!(matches!(
            Scaling::new([[f64::NAN, 1.0]]),
            Err(Error::InvalidBounds { index: 0, .. })
        ));
    }
}
