//! Left-shift refinement.
//!
//! Estimated starts fix the order of the tasks on every unit. A continuous linear program then
//! pulls the tasks as early as the order allows, never before their estimates:
//!
//! ```text
//! minimise   MS + ε · Σ S_k
//! subject to S_k ≥ estimate_k
//!            S_next ≥ S_prev + τ_prev      (consecutive tasks of a unit)
//!            MS ≥ S_k + τ_k
//! ```
//!
//! The earliest schedule for the order minimises both terms, so the small weight on the starts
//! only selects it among the makespan-optimal ones.

use crate::core::{Instance, Schedule, Solution, TaskId};
use crate::error::Result;
use crate::solver::{Budget, Constraint, Expr, Optimizer, Problem, Var};

const EARLY_WEIGHT: f64 = 1e-3;

/// Left-shift model with handles to its variables.
#[derive(Clone, Debug)]
pub struct Refinement {
    pub problem: Problem,
    pub starts: Vec<Var>,
    pub makespan: Var,
}

/// Per unit, tasks sorted by estimated start. Ties keep the declared order.
#[must_use]
pub fn unit_sequences(instance: &Instance, estimates: &[f64]) -> Vec<Vec<TaskId>> {
    let iter = instance.units().iter();
    iter.map(|unit| {
        let mut sequence = unit.tasks.clone();
        sequence.sort_by(|&a, &b| estimates[a].total_cmp(&estimates[b]));
        sequence
    })
    .collect()
}

/// Builds the continuous left-shift model.
#[must_use]
pub fn refinement_problem(instance: &Instance, estimates: &[f64]) -> Refinement {
    let tasks = instance.tasks();
    let mut problem = Problem::new("left_shift");

    let starts: Vec<Var> = estimates
        .iter()
        .enumerate()
        .map(|(k, &estimate)| problem.continuous(format!("S_{k}"), estimate.max(0.0), None))
        .collect();
    let makespan = problem.continuous("MS", 0.0, None);

    problem.reserve_constraints(2 * tasks.len());

    for (unit, sequence) in unit_sequences(instance, estimates).iter().enumerate() {
        for (position, pair) in sequence.windows(2).enumerate() {
            let (prev, next) = (pair[0], pair[1]);
            let gap = Expr::from(starts[next]).term(starts[prev], -1.0);
            let name = format!("chain_{unit}_{position}");
            problem.add(Constraint::at_least(name, gap, tasks[prev].duration));
        }
    }

    for (k, task) in tasks.iter().enumerate() {
        let slack = Expr::from(makespan).term(starts[k], -1.0);
        problem.add(Constraint::at_least(format!("ms_{k}"), slack, task.duration));
    }

    let objective = starts
        .iter()
        .fold(Expr::from(makespan), |expr, &start| expr.term(start, EARLY_WEIGHT));
    problem.minimise(objective);

    Refinement {
        problem,
        starts,
        makespan,
    }
}

/// Refines estimated starts into the earliest continuous schedule that keeps their order.
///
/// # Errors
/// - If the optimizer backend fails.
pub fn left_shift<'a>(
    instance: &'a Instance,
    estimates: &[f64],
    optimizer: &mut dyn Optimizer,
    budget: Budget,
) -> Result<Solution<'a>> {
    let refinement = refinement_problem(instance, estimates);
    tracing::debug!(
        constraints = refinement.problem.constraints.len(),
        "left-shift model built"
    );

    let outcome = optimizer.solve(&refinement.problem, budget)?;
    if !outcome.status.has_solution() {
        tracing::warn!(status = %outcome.status, "left-shift solve returned no schedule");
        return Ok(Solution::unsolved(outcome.status));
    }

    let starts: Vec<f64> = refinement
        .starts
        .iter()
        .zip(estimates)
        .map(|(&var, &estimate)| outcome.value(var).unwrap_or(estimate).max(estimate))
        .collect();

    let schedule = Schedule::from_starts(instance, &starts);
    tracing::debug!(makespan = schedule.makespan(), "left-shift extracted");
    Ok(Solution::scheduled(outcome.status, schedule))
}
