use nalgebra::{DMatrix, DVector};

use heatopt_core::{ConstrainedProblem, Constraints, Model, Observer};

use crate::optimization::Evaluation;

use super::{
    Action, Config, Error, Event, Solution, Status, bfgs,
    gradient::{linearize, probe},
    line_search::{Merit, backtrack},
    scaling::Scaling,
    subproblem::{self, Linearization, Step},
};

/// Search directions shorter than this (in scaled variables) are treated
/// as zero.
const STEP_TOL: f64 = 1e-10;

/// Core SQP iteration.
pub(super) fn search<M, P, Obs, const N: usize, const NE: usize, const NI: usize>(
    model: &M,
    problem: &P,
    x0: [f64; N],
    bounds: [[f64; 2]; N],
    config: &Config,
    mut observer: Obs,
) -> Result<Solution<M::Input, M::Output, N>, Error>
where
    M: Model,
    P: ConstrainedProblem<N, NE, NI, Input = M::Input, Output = M::Output>,
    Obs: for<'a> Observer<Event<'a, M::Input, M::Output>, Action>,
{
    let scaling = Scaling::new(bounds)?;
    if let Some((index, &value)) = x0.iter().enumerate().find(|(_, x)| !x.is_finite()) {
        return Err(Error::NonFiniteStart { index, value });
    }

    let mut evals = 0;
    let mut z = scaling.to_solver(&x0);
    let mut current = probe::<M, P, N, NE, NI>(model, problem, &scaling, &z, &mut evals)?;
    if !current.is_finite() {
        return Err(Error::NonFiniteEvaluation {
            x: current.x.to_vec(),
        });
    }

    let jacobian = linearize(model, problem, &scaling, &z, &current, &mut evals)?;
    let scales = jacobian.scales();
    let mut local = Linearization::new(&jacobian, &current.constraints, &scales);
    let mut merit = Merit::new(scales);
    let mut hessian = DMatrix::<f64>::identity(N, N);

    let feasible = |constraints: &Constraints<NE, NI>| {
        scales.violation(constraints) <= config.feasibility_tol()
    };

    for iter in 1..=config.max_iters() {
        let violation = current.constraints.violation();

        let (lower, upper) = (scaling.lower(), scaling.upper());

        // Retry once from the identity before stalling.
        let step = match subproblem::solve(&hessian, &local, &z, lower, upper) {
            Err(_) if !bfgs::is_reset(&hessian) => {
                bfgs::reset(&mut hessian);
                subproblem::solve(&hessian, &local, &z, lower, upper)
            }
            attempt => attempt,
        }
        .unwrap_or_else(|_| Step::stalled(N));

        if step.direction.amax() <= STEP_TOL {
            if feasible(&current.constraints) {
                return Ok(finish(current, Status::Converged, iter - 1, evals));
            }
            if step.relaxation.is_some() {
                return Err(Error::Incompatible { violation });
            }
        }

        merit.update(&step);
        let start = merit.value(current.objective, &current.constraints);
        let slope =
            local.gradient.dot(&step.direction) - step.enforced() * merit.penalty(&current.constraints);

        let accepted = backtrack(
            model,
            problem,
            &scaling,
            &merit,
            &z,
            start,
            &step.direction,
            slope,
            &mut evals,
        )?;

        let trial_violation = accepted.eval.constraints.violation();

        #[allow(clippy::float_cmp)]
        let full_step = accepted.alpha == 1.0;
        let converged = feasible(&accepted.eval.constraints)
            && full_step
            && (accepted.eval.objective - current.objective).abs() <= config.f_tol();

        let event = Event {
            iter,
            x: &accepted.eval.x,
            objective: accepted.eval.objective,
            violation: trial_violation,
            step_length: accepted.alpha,
            relaxed: step.relaxation.is_some(),
            snapshot: &accepted.eval.snapshot,
        };
        let action = observer.observe(&event);

        let s = DVector::from_fn(N, |i, _| accepted.z[i] - z[i]);
        z = accepted.z;
        current = accepted.eval;

        if let Some(Action::StopEarly) = action {
            return Ok(finish(current, Status::StoppedByObserver, iter, evals));
        }
        if converged {
            return Ok(finish(current, Status::Converged, iter, evals));
        }

        let jacobian = linearize(model, problem, &scaling, &z, &current, &mut evals)?;
        let next = Linearization::new(&jacobian, &current.constraints, &scales);
        let y = next.lagrangian_gradient(&step.equality, &step.inequality)
            - local.lagrangian_gradient(&step.equality, &step.inequality);
        bfgs::update(&mut hessian, &s, &y);
        local = next;
    }

    Ok(finish(current, Status::MaxIters, config.max_iters(), evals))
}

fn finish<I, O, const N: usize, const NE: usize, const NI: usize>(
    eval: Evaluation<I, O, N, NE, NI>,
    status: Status,
    iters: usize,
    evals: usize,
) -> Solution<I, O, N> {
    Solution {
        status,
        x: eval.x,
        objective: eval.objective,
        violation: eval.constraints.violation(),
        snapshot: eval.snapshot,
        iters,
        evals,
    }
}
