//! Optimizer gateway.
//!
//! Pipelines describe their models as a solver-agnostic [`Problem`] and hand it to an
//! [`Optimizer`]. Backends translate the problem into their own API and report a
//! [`Status`] together with the variable values when a solution exists.

mod embedded;
#[cfg(feature = "gurobi")]
mod gurobi;
mod scripted;

pub use embedded::Embedded;
#[cfg(feature = "gurobi")]
pub use gurobi::Gurobi;
pub use scripted::{Reply, Scripted};

use crate::error::Result;
use serde::Serialize;
use std::time::Duration;

/// Handle of a variable inside a [`Problem`].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Var(usize);

impl Var {
    /// Index of the variable in [`Problem::variables`].
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Variable domain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Kind {
    Binary,
    Continuous { lower: f64, upper: Option<f64> },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Variable {
    pub name: String,
    pub kind: Kind,
}

/// Linear expression `Σ coefficient·var + constant`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Expr {
    pub terms: Vec<(Var, f64)>,
    pub constant: f64,
}

impl Expr {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            terms: Vec::with_capacity(capacity),
            constant: 0.0,
        }
    }

    /// Adds `coefficient·var`.
    #[must_use]
    pub fn term(mut self, var: Var, coefficient: f64) -> Self {
        self.terms.push((var, coefficient));
        self
    }

    /// Evaluates the expression for the given values indexed by variable.
    #[must_use]
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|&(var, coefficient)| coefficient * values[var.0])
            .sum::<f64>()
            + self.constant
    }
}

impl From<Var> for Expr {
    fn from(var: Var) -> Self {
        Self::new().term(var, 1.0)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Sense {
    LessEqual,
    GreaterEqual,
    Equal,
}

/// Linear constraint `expr (<=|>=|==) rhs`.
#[derive(Clone, Debug, PartialEq)]
pub struct Constraint {
    pub name: String,
    pub expr: Expr,
    pub sense: Sense,
    pub rhs: f64,
}

impl Constraint {
    #[must_use]
    pub fn at_most(name: impl Into<String>, expr: Expr, rhs: f64) -> Self {
        Self::with_sense(name, expr, Sense::LessEqual, rhs)
    }

    #[must_use]
    pub fn at_least(name: impl Into<String>, expr: Expr, rhs: f64) -> Self {
        Self::with_sense(name, expr, Sense::GreaterEqual, rhs)
    }

    #[must_use]
    pub fn equal(name: impl Into<String>, expr: Expr, rhs: f64) -> Self {
        Self::with_sense(name, expr, Sense::Equal, rhs)
    }

    fn with_sense(name: impl Into<String>, expr: Expr, sense: Sense, rhs: f64) -> Self {
        Self {
            name: name.into(),
            expr,
            sense,
            rhs,
        }
    }

    /// Whether the constraint holds for the given values, up to `tolerance`.
    #[must_use]
    pub fn satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        let lhs = self.expr.evaluate(values);
        match self.sense {
            Sense::LessEqual => lhs <= self.rhs + tolerance,
            Sense::GreaterEqual => lhs >= self.rhs - tolerance,
            Sense::Equal => (lhs - self.rhs).abs() <= tolerance,
        }
    }
}

/// A minimisation problem with linear constraints and binary or continuous variables.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Problem {
    pub name: String,
    pub variables: Vec<Variable>,
    pub constraints: Vec<Constraint>,
    pub objective: Expr,
    /// Warm-start values. Backends without MIP-start support ignore them.
    pub hints: Vec<(Var, f64)>,
}

impl Problem {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Reserves room for the expected number of constraints.
    pub fn reserve_constraints(&mut self, additional: usize) {
        self.constraints.reserve(additional);
    }

    pub fn binary(&mut self, name: impl Into<String>) -> Var {
        self.add_variable(name.into(), Kind::Binary)
    }

    pub fn continuous(&mut self, name: impl Into<String>, lower: f64, upper: Option<f64>) -> Var {
        self.add_variable(name.into(), Kind::Continuous { lower, upper })
    }

    fn add_variable(&mut self, name: String, kind: Kind) -> Var {
        self.variables.push(Variable { name, kind });
        Var(self.variables.len() - 1)
    }

    pub fn add(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn minimise(&mut self, objective: Expr) {
        self.objective = objective;
    }

    pub fn hint(&mut self, var: Var, value: f64) {
        self.hints.push((var, value));
    }

    #[must_use]
    pub fn binaries(&self) -> usize {
        let iter = self.variables.iter();
        iter.filter(|variable| variable.kind == Kind::Binary).count()
    }
}

/// Time and optimality-gap budget of a single solve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Budget {
    pub time_limit: Duration,
    /// Relative MIP gap at which the backend may stop.
    pub gap: f64,
}

impl Budget {
    #[must_use]
    pub const fn new(time_limit: Duration, gap: f64) -> Self {
        Self { time_limit, gap }
    }
}

/// Termination status reported by a backend.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Optimal,
    /// A valid, possibly suboptimal assignment. Covers a time limit hit with a solution.
    Feasible,
    Infeasible,
    /// Time budget exhausted without any solution.
    Timeout,
}

impl Status {
    /// Whether the status comes with an assignment.
    #[must_use]
    pub const fn has_solution(self) -> bool {
        matches!(self, Self::Optimal | Self::Feasible)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Optimal => "optimal",
            Self::Feasible => "feasible",
            Self::Infeasible => "infeasible",
            Self::Timeout => "timeout",
        };
        f.write_str(name)
    }
}

/// Result of a solve: the status and, when it has one, the value of every variable.
#[derive(Clone, Debug, PartialEq)]
pub struct Outcome {
    pub status: Status,
    values: Option<Vec<f64>>,
}

impl Outcome {
    /// Creates an outcome carrying a solution.
    #[must_use]
    pub const fn solved(status: Status, values: Vec<f64>) -> Self {
        Self {
            status,
            values: Some(values),
        }
    }

    /// Creates an outcome without a solution.
    #[must_use]
    pub const fn failed(status: Status) -> Self {
        Self {
            status,
            values: None,
        }
    }

    #[must_use]
    pub fn values(&self) -> Option<&[f64]> {
        self.values.as_deref()
    }

    /// Value of a variable, if a solution exists.
    #[must_use]
    pub fn value(&self, var: Var) -> Option<f64> {
        self.values.as_ref().and_then(|values| values.get(var.0).copied())
    }

    /// Whether a binary variable is set in the solution.
    #[must_use]
    pub fn is_set(&self, var: Var) -> bool {
        self.value(var).is_some_and(|value| value > 0.5)
    }
}

/// Backend able to solve a [`Problem`].
pub trait Optimizer {
    /// Solves the problem within the budget. A single attempt: callers never retry.
    ///
    /// # Errors
    /// - [`crate::Error::Optimizer`] if the backend fails for reasons other than
    ///   infeasibility or timeout.
    fn solve(&mut self, problem: &Problem, budget: Budget) -> Result<Outcome>;

    /// Returns the name of the backend.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn constraint_evaluation() {
        let mut problem = Problem::new("check");
        let x = problem.binary("x");
        let y = problem.continuous("y", 0.0, None);

        let mut sum = Expr::from(x).term(y, 2.0);
        sum.constant = 1.0;
        let values = [1.0, 3.0];
        assert!((sum.evaluate(&values) - 8.0).abs() < 1e-9);
        assert!(Constraint::at_most("c", sum.clone(), 8.0).satisfied(&values, 1e-9));
        assert!(!Constraint::at_least("c", sum.clone(), 9.0).satisfied(&values, 1e-9));
        assert!(Constraint::equal("c", sum, 8.0).satisfied(&values, 1e-9));
        assert_eq!(problem.binaries(), 1);
    }

    #[test]
    fn outcome_values() {
        let solved = Outcome::solved(Status::Feasible, vec![0.0, 1.0]);
        assert!(solved.status.has_solution());
        assert!(solved.is_set(Var(1)));
        assert!(!solved.is_set(Var(0)));
        assert_eq!(solved.value(Var(2)), None);

        let failed = Outcome::failed(Status::Timeout);
        assert!(!failed.status.has_solution());
        assert_eq!(failed.values(), None);
    }
}
