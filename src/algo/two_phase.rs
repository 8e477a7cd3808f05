use super::disjunctive::{generate, grid_domains};
use super::greedy::greedy_starts;
use super::grid::{coarse_grid, coarse_points};
use super::refine::left_shift;
use crate::core::{Instance, Scheduler, Settings, Solution};
use crate::error::Result;
use crate::solver::{Budget, Constraint, Expr, Optimizer, Outcome, Problem, Var};

/// Discrete model over the coarse grid:
/// one start point per task, no overlapping placements on a unit,
/// `MS ≥ Σ_g (t_g + τ_k) · x[k,g]` for every task.
#[derive(Clone, Debug)]
pub struct CoarseModel {
    pub problem: Problem,
    pub grid: Vec<f64>,
    /// `assign[task][g]` is the binary of grid point `g`.
    pub assign: Vec<Vec<Var>>,
    pub makespan: Var,
}

impl CoarseModel {
    #[must_use]
    pub fn new(instance: &Instance, grid: Vec<f64>) -> Self {
        let domains = grid_domains(instance, &grid);
        let disjunctions = generate(instance, &domains);

        let mut problem = Problem::new("coarse");
        let assign: Vec<Vec<Var>> = (0..instance.tasks().len())
            .map(|k| (0..grid.len()).map(|g| problem.binary(format!("x_{k}_{g}"))).collect())
            .collect();
        let makespan = problem.continuous("MS", 0.0, None);

        disjunctions.encode(&mut problem, &assign);

        for (k, task) in instance.tasks().iter().enumerate() {
            let finish = grid.iter().zip(&assign[k]).fold(Expr::from(makespan), |expr, (&time, &x)| {
                expr.term(x, -(time + task.duration))
            });
            problem.add(Constraint::at_least(format!("ms_{k}"), finish, 0.0));
        }

        problem.minimise(Expr::from(makespan));

        Self {
            problem,
            grid,
            assign,
            makespan,
        }
    }

    /// Grid start chosen for every task.
    #[must_use]
    pub fn starts(&self, outcome: &Outcome) -> Vec<f64> {
        let iter = self.assign.iter();
        iter.map(|vars| {
            let chosen = vars.iter().position(|&x| outcome.is_set(x)).unwrap_or_default();
            self.grid[chosen]
        })
        .collect()
    }
}

/// Two-phase heuristic.
///
/// Solves the coarse grid model, falls back to the greedy baseline when that solve yields no
/// assignment, and refines whichever estimate it got with the left-shift model.
#[derive(Clone, Copy, Debug)]
pub struct TwoPhase {
    pub coarse: Budget,
    pub refine: Budget,
}

impl From<&Settings> for TwoPhase {
    fn from(settings: &Settings) -> Self {
        Self {
            coarse: settings.coarse,
            refine: settings.refine,
        }
    }
}

impl Default for TwoPhase {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl Scheduler for TwoPhase {
    fn schedule<'a>(
        &mut self,
        instance: &'a Instance,
        optimizer: &mut dyn Optimizer,
    ) -> Result<Solution<'a>> {
        let _span = tracing::info_span!("two_phase", backend = optimizer.name()).entered();

        let grid = coarse_grid(instance.horizon(), coarse_points(instance.slots()));
        let model = CoarseModel::new(instance, grid);
        tracing::debug!(
            points = model.grid.len(),
            constraints = model.problem.constraints.len(),
            "coarse model generated"
        );

        let outcome = optimizer.solve(&model.problem, self.coarse)?;
        let fallback = !outcome.status.has_solution();
        let estimates = if fallback {
            tracing::warn!(status = %outcome.status, "coarse phase failed, using greedy baseline");
            greedy_starts(instance)
        } else {
            tracing::debug!(status = %outcome.status, "coarse phase solved");
            model.starts(&outcome)
        };

        let solution = left_shift(instance, &estimates, optimizer, self.refine)?;
        tracing::info!(status = %solution.status, makespan = ?solution.makespan(), fallback, "two-phase finished");
        Ok(solution.with_fallback(fallback))
    }

    fn configure(&mut self, settings: &Settings) {
        *self = Self::from(settings);
    }

    fn name(&self) -> &'static str {
        "two-phase"
    }
}

#[allow(unsafe_code)]
#[linkme::distributed_slice(super::PIPELINES)]
static INSTANCE: fn() -> Box<dyn Scheduler> = || Box::new(TwoPhase::default());
