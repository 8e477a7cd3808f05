use super::{Budget, Expr, Kind, Optimizer, Outcome, Problem, Sense, Status};
use crate::error::{Error, Result};
use grb::expr::LinExpr;
use grb::prelude::*;

const NAME: &str = "gurobi";

/// Gurobi backend. Honours the time limit, the MIP gap and the warm-start hints.
#[derive(Clone, Copy, Debug, Default)]
pub struct Gurobi;

impl Optimizer for Gurobi {
    fn solve(&mut self, problem: &Problem, budget: Budget) -> Result<Outcome> {
        let (status, values) =
            solve_model(problem, budget).map_err(|err| Error::optimizer(NAME, err))?;

        match status {
            grb::Status::Optimal => Ok(values.map_or(Outcome::failed(Status::Timeout), |values| {
                Outcome::solved(Status::Optimal, values)
            })),
            grb::Status::Infeasible | grb::Status::InfOrUnbd => Ok(Outcome::failed(Status::Infeasible)),
            grb::Status::Unbounded => Err(Error::optimizer(NAME, "model is unbounded")),
            _ => Ok(values.map_or(Outcome::failed(Status::Timeout), |values| {
                Outcome::solved(Status::Feasible, values)
            })),
        }
    }

    fn name(&self) -> &'static str {
        NAME
    }
}

fn create_model(name: &str, budget: Budget) -> grb::Result<Model> {
    let mut env = Env::new("")?;
    env.set(param::OutputFlag, 0)?;
    env.set(param::LogToConsole, 0)?;
    env.set(param::TimeLimit, budget.time_limit.as_secs_f64())?;
    env.set(param::MIPGap, budget.gap)?;
    Model::with_env(name, env)
}

fn solve_model(problem: &Problem, budget: Budget) -> grb::Result<(grb::Status, Option<Vec<f64>>)> {
    let mut model = create_model(&problem.name, budget)?;

    let mut vars = Vec::with_capacity(problem.variables.len());
    for var in &problem.variables {
        let (kind, lower, upper) = match var.kind {
            Kind::Binary => (VarType::Binary, 0.0, 1.0),
            Kind::Continuous { lower, upper } => {
                (VarType::Continuous, lower, upper.unwrap_or(grb::INFINITY))
            }
        };
        vars.push(model.add_var(&var.name, kind, 0.0, lower, upper, std::iter::empty())?);
    }

    for constraint in &problem.constraints {
        let lhs = linear(&constraint.expr, &vars);
        let rhs = constraint.rhs;
        let inequality = match constraint.sense {
            Sense::LessEqual => c!(lhs <= rhs),
            Sense::GreaterEqual => c!(lhs >= rhs),
            Sense::Equal => c!(lhs == rhs),
        };
        model.add_constr(&constraint.name, inequality)?;
    }

    model.set_objective(linear(&problem.objective, &vars), Minimize)?;
    model.update()?;

    for &(var, value) in &problem.hints {
        model.set_obj_attr(attr::Start, &vars[var.index()], value)?;
    }

    model.optimize()?;

    let status = model.status()?;
    if model.get_attr(attr::SolCount)? == 0 {
        return Ok((status, None));
    }

    let mut values = Vec::with_capacity(vars.len());
    for var in &vars {
        values.push(model.get_obj_attr(attr::X, var)?);
    }
    Ok((status, Some(values)))
}

fn linear(expr: &Expr, vars: &[Var]) -> LinExpr {
    let mut result = LinExpr::new();
    for &(var, coefficient) in &expr.terms {
        result.add_term(coefficient, vars[var.index()]);
    }
    result.add_constant(expr.constant);
    result
}
