use std::convert::Infallible;

use approx::assert_relative_eq;
use thiserror::Error;

use heatopt_core::{ConstrainedProblem, Constraints, Model};

use super::{Action, Config, Error, Event, Status, minimize, minimize_unobserved};

/// Passes the decision variables straight through.
struct Identity;

impl Model for Identity {
    type Input = [f64; 2];
    type Output = [f64; 2];
    type Error = Infallible;

    fn call(&self, x: &[f64; 2]) -> Result<[f64; 2], Self::Error> {
        Ok(*x)
    }
}

/// Shifted paraboloid (x - a)² + (y - b)² with no general constraints.
struct Paraboloid {
    center: [f64; 2],
}

impl ConstrainedProblem<2, 0, 0> for Paraboloid {
    type Input = [f64; 2];
    type Output = [f64; 2];
    type Error = Infallible;

    fn input(&self, x: &[f64; 2]) -> Result<[f64; 2], Self::Error> {
        Ok(*x)
    }

    fn objective(&self, _: &[f64; 2], x: &[f64; 2]) -> Result<f64, Self::Error> {
        let [a, b] = self.center;
        Ok((x[0] - a).powi(2) + (x[1] - b).powi(2))
    }

    fn constraints(&self, _: &[f64; 2], _: &[f64; 2]) -> Result<Constraints<0, 0>, Self::Error> {
        Ok(Constraints::new([], []))
    }
}

/// x² + y² subject to x + y = 1.
struct OnLine;

impl ConstrainedProblem<2, 1, 0> for OnLine {
    type Input = [f64; 2];
    type Output = [f64; 2];
    type Error = Infallible;

    fn input(&self, x: &[f64; 2]) -> Result<[f64; 2], Self::Error> {
        Ok(*x)
    }

    fn objective(&self, _: &[f64; 2], x: &[f64; 2]) -> Result<f64, Self::Error> {
        Ok(x[0] * x[0] + x[1] * x[1])
    }

    fn constraints(&self, _: &[f64; 2], x: &[f64; 2]) -> Result<Constraints<1, 0>, Self::Error> {
        Ok(Constraints::new([x[0] + x[1] - 1.0], []))
    }
}

/// x² + y² subject to `units·(x + y - 1) = 0`.
///
/// With large `units`, rounding alone leaves residuals far above any
/// absolute tolerance.
struct OnLineIn {
    units: f64,
}

impl ConstrainedProblem<2, 1, 0> for OnLineIn {
    type Input = [f64; 2];
    type Output = [f64; 2];
    type Error = Infallible;

    fn input(&self, x: &[f64; 2]) -> Result<[f64; 2], Self::Error> {
        Ok(*x)
    }

    fn objective(&self, _: &[f64; 2], x: &[f64; 2]) -> Result<f64, Self::Error> {
        Ok(x[0] * x[0] + x[1] * x[1])
    }

    fn constraints(&self, _: &[f64; 2], x: &[f64; 2]) -> Result<Constraints<1, 0>, Self::Error> {
        Ok(Constraints::new([self.units * (x[0] + x[1] - 1.0)], []))
    }
}

/// (x - 2)² + (y - 1)² subject to y - x² ≥ 0 and 2 - x - y ≥ 0.
///
/// The constrained minimum is at (1, 1) with both constraints active.
struct UnderParabola;

impl ConstrainedProblem<2, 0, 2> for UnderParabola {
    type Input = [f64; 2];
    type Output = [f64; 2];
    type Error = Infallible;

    fn input(&self, x: &[f64; 2]) -> Result<[f64; 2], Self::Error> {
        Ok(*x)
    }

    fn objective(&self, _: &[f64; 2], x: &[f64; 2]) -> Result<f64, Self::Error> {
        Ok((x[0] - 2.0).powi(2) + (x[1] - 1.0).powi(2))
    }

    fn constraints(&self, _: &[f64; 2], x: &[f64; 2]) -> Result<Constraints<0, 2>, Self::Error> {
        Ok(Constraints::new([], [x[1] - x[0] * x[0], 2.0 - x[0] - x[1]]))
    }
}

/// Requires x + y ≥ 3 inside the unit box, which is impossible.
struct OutOfReach;

impl ConstrainedProblem<2, 0, 1> for OutOfReach {
    type Input = [f64; 2];
    type Output = [f64; 2];
    type Error = Infallible;

    fn input(&self, x: &[f64; 2]) -> Result<[f64; 2], Self::Error> {
        Ok(*x)
    }

    fn objective(&self, _: &[f64; 2], x: &[f64; 2]) -> Result<f64, Self::Error> {
        Ok(x[0] + x[1])
    }

    fn constraints(&self, _: &[f64; 2], x: &[f64; 2]) -> Result<Constraints<0, 1>, Self::Error> {
        Ok(Constraints::new([], [x[0] + x[1] - 3.0]))
    }
}

const FREE: [f64; 2] = [f64::NEG_INFINITY, f64::INFINITY];

fn tight() -> Config {
    Config::new(200, 1e-10, 1e-10).unwrap()
}

#[test]
fn bounded_paraboloid_stops_at_bounds() {
    let problem = Paraboloid {
        center: [3.0, -2.0],
    };

    let solution = minimize_unobserved(
        &Identity,
        &problem,
        [0.0, 0.0],
        [[-1.0, 2.0], [-1.0, 1.0]],
        &tight(),
    )
    .expect("should solve");

    assert_eq!(solution.status, Status::Converged);
    assert_relative_eq!(solution.x[0], 2.0, epsilon = 1e-8);
    assert_relative_eq!(solution.x[1], -1.0, epsilon = 1e-8);
    assert_relative_eq!(solution.objective, 2.0, epsilon = 1e-6);
}

#[test]
fn unbounded_paraboloid_finds_center() {
    let problem = Paraboloid {
        center: [0.5, -0.25],
    };

    let solution =
        minimize_unobserved(&Identity, &problem, [3.0, 3.0], [FREE, FREE], &tight())
            .expect("should solve");

    assert_eq!(solution.status, Status::Converged);
    assert_relative_eq!(solution.x[0], 0.5, epsilon = 1e-5);
    assert_relative_eq!(solution.x[1], -0.25, epsilon = 1e-5);
}

#[test]
fn equality_constrained_minimum() {
    let solution = minimize_unobserved(
        &Identity,
        &OnLine,
        [2.0, -3.0],
        [[-5.0, 5.0], [-5.0, 5.0]],
        &tight(),
    )
    .expect("should solve");

    assert_eq!(solution.status, Status::Converged);
    assert_relative_eq!(solution.x[0], 0.5, epsilon = 1e-5);
    assert_relative_eq!(solution.x[1], 0.5, epsilon = 1e-5);
    assert!(solution.violation <= 1e-10);
    assert_eq!(solution.snapshot.input, solution.x);
}

#[test]
fn equality_in_large_units_converges() {
    let problem = OnLineIn { units: 1e12 };

    let solution = minimize_unobserved(
        &Identity,
        &problem,
        [2.0, -3.0],
        [[-5.0, 5.0], [-5.0, 5.0]],
        &tight(),
    )
    .expect("should solve");

    assert_eq!(solution.status, Status::Converged);
    assert_relative_eq!(solution.x[0], 0.5, epsilon = 1e-5);
    assert_relative_eq!(solution.x[1], 0.5, epsilon = 1e-5);
    assert!(solution.violation <= 1e3);
}

#[test]
fn nonlinear_inequalities_from_either_side() {
    // The origin satisfies both constraints; (2, 2) violates both.
    for x0 in [[0.0, 0.0], [2.0, 2.0]] {
        let solution = minimize_unobserved(
            &Identity,
            &UnderParabola,
            x0,
            [[-3.0, 3.0], [-3.0, 3.0]],
            &tight(),
        )
        .expect("should solve");

        assert_eq!(solution.status, Status::Converged, "from {x0:?}");
        assert_relative_eq!(solution.x[0], 1.0, epsilon = 1e-5);
        assert_relative_eq!(solution.x[1], 1.0, epsilon = 1e-5);
        assert_relative_eq!(solution.objective, 1.0, epsilon = 1e-5);
    }
}

#[test]
fn fixed_variable_stays_put() {
    let problem = Paraboloid {
        center: [3.0, -2.0],
    };

    let solution = minimize_unobserved(
        &Identity,
        &problem,
        [0.0, 0.0],
        [[1.5, 1.5], [-5.0, 5.0]],
        &tight(),
    )
    .expect("should solve");

    assert_eq!(solution.status, Status::Converged);
    assert_eq!(solution.x[0], 1.5);
    assert_relative_eq!(solution.x[1], -2.0, epsilon = 1e-5);
}

#[test]
fn infeasible_problem_does_not_converge() {
    let config = Config::new(50, 1e-8, 1e-8).unwrap();

    let result = minimize_unobserved(
        &Identity,
        &OutOfReach,
        [0.5, 0.5],
        [[0.0, 1.0], [0.0, 1.0]],
        &config,
    );

    match result {
        Ok(solution) => {
            assert_ne!(solution.status, Status::Converged);
            assert!(solution.violation > 0.5);
        }
        Err(error) => assert!(
            matches!(error, Error::Incompatible { violation } if violation > 0.5),
            "unexpected error: {error}"
        ),
    }
}

#[test]
fn observer_sees_each_iteration() {
    let mut iters = Vec::new();
    let mut lengths = Vec::new();

    let observer = |event: &Event<'_, _, _>| {
        iters.push(event.iter);
        lengths.push(event.step_length);
        assert_eq!(event.x.len(), 2);
        None
    };

    let solution = minimize(
        &Identity,
        &OnLine,
        [2.0, -3.0],
        [[-5.0, 5.0], [-5.0, 5.0]],
        &tight(),
        observer,
    )
    .expect("should solve");

    assert_eq!(iters, (1..=iters.len()).collect::<Vec<_>>());
    assert_eq!(solution.iters, iters.len());
    assert!(lengths.iter().all(|a| *a > 0.0 && *a <= 1.0));
    assert!(solution.evals > iters.len());
}

#[test]
fn observer_can_stop_early() {
    let observer = |event: &Event<'_, _, _>| (event.iter == 1).then_some(Action::StopEarly);

    let solution = minimize(
        &Identity,
        &UnderParabola,
        [2.0, 2.0],
        [[-3.0, 3.0], [-3.0, 3.0]],
        &tight(),
        observer,
    )
    .expect("should stop");

    assert_eq!(solution.status, Status::StoppedByObserver);
    assert_eq!(solution.iters, 1);
}

#[test]
fn iteration_limit_reports_max_iters() {
    let config = Config::new(1, 1e-12, 1e-12).unwrap();

    let solution = minimize_unobserved(
        &Identity,
        &UnderParabola,
        [2.0, 2.0],
        [[-3.0, 3.0], [-3.0, 3.0]],
        &config,
    )
    .expect("should run");

    assert_eq!(solution.status, Status::MaxIters);
    assert_eq!(solution.iters, 1);
}

#[test]
fn rejects_invalid_bounds() {
    let result = minimize_unobserved(
        &Identity,
        &OnLine,
        [0.0, 0.0],
        [[0.0, 1.0], [2.0, -2.0]],
        &Config::default(),
    );

    assert!(matches!(
        result,
        Err(Error::InvalidBounds { index: 1, lower, upper }) if lower == 2.0 && upper == -2.0
    ));
}

#[test]
fn rejects_non_finite_start() {
    let result = minimize_unobserved(
        &Identity,
        &OnLine,
        [0.0, f64::NAN],
        [[0.0, 1.0], [0.0, 1.0]],
        &Config::default(),
    );

    assert!(matches!(result, Err(Error::NonFiniteStart { index: 1, .. })));
}

#[derive(Debug, Error)]
#[error("sensor offline")]
struct SensorOffline;

/// Fails whenever x leaves the unit square.
struct Sensor;

impl Model for Sensor {
    type Input = [f64; 2];
    type Output = [f64; 2];
    type Error = SensorOffline;

    fn call(&self, x: &[f64; 2]) -> Result<[f64; 2], Self::Error> {
        if x.iter().all(|v| (0.0..=1.0).contains(v)) {
            Ok(*x)
        } else {
            Err(SensorOffline)
        }
    }
}

#[test]
fn model_errors_propagate() {
    let result = minimize_unobserved(&Sensor, &OnLine, [2.0, 0.0], [FREE, FREE], &Config::default());

    let Err(Error::Model(source)) = result else {
        panic!("expected a model error");
    };
    assert_eq!(source.to_string(), "sensor offline");
}

/// Objective is undefined for x ≤ 0.
struct Logarithm;

impl ConstrainedProblem<2, 0, 0> for Logarithm {
    type Input = [f64; 2];
    type Output = [f64; 2];
    type Error = Infallible;

    fn input(&self, x: &[f64; 2]) -> Result<[f64; 2], Self::Error> {
        Ok(*x)
    }

    fn objective(&self, _: &[f64; 2], x: &[f64; 2]) -> Result<f64, Self::Error> {
        Ok(-x[0].ln() + x[1] * x[1])
    }

    fn constraints(&self, _: &[f64; 2], _: &[f64; 2]) -> Result<Constraints<0, 0>, Self::Error> {
        Ok(Constraints::new([], []))
    }
}

#[test]
fn non_finite_start_evaluation_is_an_error() {
    let result = minimize_unobserved(
        &Identity,
        &Logarithm,
        [-1.0, 0.0],
        [FREE, FREE],
        &Config::default(),
    );

    assert!(matches!(result, Err(Error::NonFiniteEvaluation { .. })));
}
