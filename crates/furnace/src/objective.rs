//! The weighted cost to minimize.
//!
//! The cost depends on the delivered energy `P·t` only. Velocity and
//! thickness enter the problem solely through the constraints.

use crate::{params::ParameterSet, thermal::OperatingPoint};

/// Joules per megajoule.
const MEGA: f64 = 1e6;

/// Numerator of the uniformity penalty, in megajoules.
const UNIFORMITY_SCALE: f64 = 50.0;

/// Non-uniformity penalty `50 / (P·t / 10⁶)`; falls as more energy is delivered.
#[must_use]
pub fn uniformity(x: &OperatingPoint) -> f64 {
    UNIFORMITY_SCALE / (x.heat_input() / MEGA)
}

/// Energy use `P·t / 10⁶`, in megajoules.
#[must_use]
pub fn energy(x: &OperatingPoint) -> f64 {
    x.heat_input() / MEGA
}

/// Weighted cost `w₁·uniformity + w₂·energy`.
#[must_use]
pub fn objective(params: &ParameterSet, x: &OperatingPoint) -> f64 {
    let w = params.weights();
    w.uniformity * uniformity(x) + w.energy * energy(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    use crate::params::RawParameters;

    #[test]
    fn weighs_uniformity_against_energy() {
        let params = ParameterSet::new(RawParameters::default()).unwrap();
        let x = OperatingPoint::from_array([2000.0, 1.0, 1000.0, 0.1]);

        // P·t = 2 MJ: 0.7 · 25 + 0.3 · 2
        assert_relative_eq!(uniformity(&x), 25.0);
        assert_relative_eq!(energy(&x), 2.0);
        assert_relative_eq!(objective(&params, &x), 18.1, epsilon = 1e-12);
    }

    #[test]
    fn ignores_velocity_and_thickness() {
        let params = ParameterSet::new(RawParameters::default()).unwrap();
        let a = OperatingPoint::from_array([2000.0, 0.5, 1000.0, 0.05]);
        let b = OperatingPoint::from_array([2000.0, 2.0, 1000.0, 0.3]);

        assert_eq!(objective(&params, &a), objective(&params, &b));
    }
}
