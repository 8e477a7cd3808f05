use super::{Budget, Expr, Kind, Optimizer, Outcome, Problem, Sense, Status};
use crate::error::{Error, Result};
use good_lp::solvers::microlp::MicroLpProblem;
use good_lp::{
    microlp, variable, Expression, ProblemVariables, ResolutionError, Solution, SolutionStatus, SolverModel,
    WithInitialSolution, WithMipGap, WithTimeLimit,
};

const NAME: &str = "embedded";

/// Reported by microlp when the time limit expires before any incumbent exists.
const NO_INCUMBENT: &str = "Time limit reached before finding a feasible solution";

/// Pure Rust backend built on `good_lp` with the `microlp` branch-and-bound solver.
///
/// The budget is handed to microlp: a solve stopped by the time limit or the gap with an
/// incumbent is [`Status::Feasible`], one stopped before any incumbent is [`Status::Timeout`].
/// Hints seed the search as a partial initial solution.
#[derive(Clone, Copy, Debug, Default)]
pub struct Embedded;

impl Optimizer for Embedded {
    fn solve(&mut self, problem: &Problem, budget: Budget) -> Result<Outcome> {
        let (model, handles) = build_model(problem, budget)?;

        match model.solve() {
            Ok(solution) => {
                let status = match solution.status() {
                    SolutionStatus::Optimal => Status::Optimal,
                    SolutionStatus::TimeLimit | SolutionStatus::GapLimit => Status::Feasible,
                };
                let values = handles.iter().map(|&handle| solution.value(handle)).collect();
                Ok(Outcome::solved(status, values))
            }
            Err(ResolutionError::Infeasible) => Ok(Outcome::failed(Status::Infeasible)),
            Err(ResolutionError::Other(NO_INCUMBENT)) => {
                tracing::warn!(problem = %problem.name, limit = ?budget.time_limit, "time budget exhausted");
                Ok(Outcome::failed(Status::Timeout))
            }
            Err(err) => Err(Error::optimizer(NAME, err)),
        }
    }

    fn name(&self) -> &'static str {
        NAME
    }
}

#[allow(clippy::cast_possible_truncation)]
fn build_model(problem: &Problem, budget: Budget) -> Result<(MicroLpProblem, Vec<good_lp::Variable>)> {
    let mut variables = ProblemVariables::new();
    let handles: Vec<good_lp::Variable> = problem
        .variables
        .iter()
        .map(|var| {
            let definition = match var.kind {
                Kind::Binary => variable().binary(),
                Kind::Continuous { lower, upper: None } => variable().min(lower),
                Kind::Continuous {
                    lower,
                    upper: Some(upper),
                } => variable().min(lower).max(upper),
            };
            variables.add(definition.name(var.name.as_str()))
        })
        .collect();

    let objective = expression(&problem.objective, &handles);
    let mut model = variables
        .minimise(objective)
        .using(microlp)
        .with_time_limit(budget.time_limit.as_secs_f64())
        .with_mip_gap(budget.gap as f32)
        .map_err(|err| Error::optimizer(NAME, err))?;

    if !problem.hints.is_empty() {
        let iter = problem.hints.iter();
        model = model.with_initial_solution(iter.map(|&(var, value)| (handles[var.index()], value)));
    }

    for constraint in &problem.constraints {
        let lhs = expression(&constraint.expr, &handles);
        let _ = model.add_constraint(match constraint.sense {
            Sense::LessEqual => lhs.leq(constraint.rhs),
            Sense::GreaterEqual => lhs.geq(constraint.rhs),
            Sense::Equal => lhs.eq(constraint.rhs),
        });
    }

    Ok((model, handles))
}

fn expression(expr: &Expr, handles: &[good_lp::Variable]) -> Expression {
    let iter = expr.terms.iter();
    iter.fold(Expression::from(expr.constant), |acc, &(var, coefficient)| {
        acc + coefficient * handles[var.index()]
    })
}
