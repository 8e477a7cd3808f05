use super::{Budget, Embedded, Optimizer, Outcome, Problem, Status};
use crate::error::Result;
use std::collections::VecDeque;

/// Scripted reply of a [`Scripted`] backend.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Reply {
    /// Report the status without a solution.
    Fail(Status),
    /// Solve the problem with the embedded backend.
    Solve,
    /// Solve with the embedded backend and report the solution as [`Status::Feasible`],
    /// as a backend stopped by its time limit with an incumbent would.
    Feasible,
}

/// Backend replaying a fixed sequence of replies.
///
/// Used to drive the status branches of the pipelines. Once the script runs out every call
/// is solved by [`Embedded`]. The problems it received are kept for inspection.
#[derive(Clone, Debug, Default)]
pub struct Scripted {
    script: VecDeque<Reply>,
    received: Vec<Problem>,
}

impl Scripted {
    #[must_use]
    pub fn new(script: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            script: script.into_iter().collect(),
            received: Vec::new(),
        }
    }

    /// Problems received so far, in call order.
    #[must_use]
    pub fn received(&self) -> &[Problem] {
        &self.received
    }
}

impl Optimizer for Scripted {
    fn solve(&mut self, problem: &Problem, budget: Budget) -> Result<Outcome> {
        self.received.push(problem.clone());
        match self.script.pop_front().unwrap_or(Reply::Solve) {
            Reply::Fail(status) => Ok(Outcome::failed(status)),
            Reply::Solve => Embedded.solve(problem, budget),
            Reply::Feasible => {
                let mut outcome = Embedded.solve(problem, budget)?;
                if outcome.status.has_solution() {
                    outcome.status = Status::Feasible;
                }
                Ok(outcome)
            }
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::solver::{Constraint, Expr};
    use std::time::Duration;

    #[test]
    fn feasible_reply_keeps_the_assignment() -> anyhow::Result<()> {
        let mut problem = Problem::new("single");
        let x = problem.binary("x");
        problem.add(Constraint::at_least("pick", Expr::from(x), 1.0));
        problem.minimise(Expr::from(x));

        let mut optimizer = Scripted::new([Reply::Feasible, Reply::Fail(Status::Timeout)]);
        let budget = Budget::new(Duration::from_secs(30), 0.0);

        let outcome = optimizer.solve(&problem, budget)?;
        assert_eq!(outcome.status, Status::Feasible);
        assert!(outcome.is_set(x));

        let outcome = optimizer.solve(&problem, budget)?;
        assert_eq!(outcome, Outcome::failed(Status::Timeout));

        let outcome = optimizer.solve(&problem, budget)?;
        assert_eq!(outcome.status, Status::Optimal);
        assert_eq!(optimizer.received().len(), 3);
        Ok(())
    }
}
