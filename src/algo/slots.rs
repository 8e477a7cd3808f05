//! Full-fidelity slot model.
//!
//! Slots `1..=P` are ordered positions on every unit. Each task picks one slot of its domain,
//! slot starts are continuous and bounded by the big-M, and a slot starts only after the task
//! in the previous slot of the same unit has finished:
//!
//! ```text
//! minimise   MS
//! subject to Σ_p z[k,p] = 1                                one-hot
//!            z[a] + z[b] ≤ 1                               same unit, same slot
//!            Bmin_k · z[k,p] ≤ Q[k,p] ≤ Bmax_k · z[k,p]    batch size
//!            T[u,p+1] ≥ T[u,p] + Σ_k τ_k · z[k,p]          slot sequencing
//!            F_k ≥ T[u,p] + τ_k − M · (1 − z[k,p])         finish linking
//!            MS ≥ F_k
//!            0 ≤ T[u,p] ≤ M
//! ```
//!
//! `M` is the instance big-M (`H + max τ`). With `T ≤ M` a relaxed finish row reads
//! `F_k ≥ T + τ_k − M ≤ τ_k`, so it never binds. The horizon only sizes the bound: schedules
//! may finish after `H`.

use super::disjunctive::{generate, Domain};
use crate::core::{Assignment, Instance, Schedule};
use crate::solver::{Constraint, Expr, Outcome, Problem, Var};

/// Slot model with handles to its variables.
#[derive(Clone, Debug)]
pub struct SlotModel {
    pub problem: Problem,
    pub domains: Vec<Domain>,
    /// `assign[task][index]` is the binary of the `index`-th slot of the task domain.
    pub assign: Vec<Vec<Var>>,
    pub quantity: Vec<Vec<Var>>,
    pub makespan: Var,
}

impl SlotModel {
    /// Builds the model over the given per-task slot domains.
    #[must_use]
    pub fn new(name: &str, instance: &Instance, domains: Vec<Domain>) -> Self {
        let disjunctions = generate(instance, &domains);
        let tasks = instance.tasks();
        let slots = instance.slots();
        let big_m = instance.big_m();

        let mut problem = Problem::new(name);

        let assign: Vec<Vec<Var>> = domains
            .iter()
            .enumerate()
            .map(|(k, domain)| {
                let iter = domain.iter();
                iter.map(|slot| problem.binary(format!("z_{k}_{}", slot.key))).collect()
            })
            .collect();

        let quantity: Vec<Vec<Var>> = domains
            .iter()
            .enumerate()
            .map(|(k, domain)| {
                let upper = Some(tasks[k].batch_max);
                let iter = domain.iter();
                iter.map(|slot| problem.continuous(format!("Q_{k}_{}", slot.key), 0.0, upper))
                    .collect()
            })
            .collect();

        let slot_starts: Vec<Vec<Var>> = (0..instance.units().len())
            .map(|u| {
                let iter = 1..=slots;
                iter.map(|p| problem.continuous(format!("T_{u}_{p}"), 0.0, Some(big_m)))
                    .collect()
            })
            .collect();

        let finish: Vec<Var> = (0..tasks.len())
            .map(|k| problem.continuous(format!("F_{k}"), 0.0, None))
            .collect();
        let makespan = problem.continuous("MS", 0.0, None);

        disjunctions.encode(&mut problem, &assign);

        for (k, task) in tasks.iter().enumerate() {
            for (i, slot) in domains[k].iter().enumerate() {
                let (z, q, p) = (assign[k][i], quantity[k][i], slot.key);

                let lower = Expr::from(q).term(z, -task.batch_min);
                problem.add(Constraint::at_least(format!("size_lower_{k}_{p}"), lower, 0.0));

                let upper = Expr::from(q).term(z, -task.batch_max);
                problem.add(Constraint::at_most(format!("size_upper_{k}_{p}"), upper, 0.0));

                let linking = Expr::from(finish[k])
                    .term(slot_starts[task.unit][p - 1], -1.0)
                    .term(z, -big_m);
                let name = format!("time_{k}_{p}");
                problem.add(Constraint::at_least(name, linking, task.duration - big_m));
            }

            let slack = Expr::from(makespan).term(finish[k], -1.0);
            problem.add(Constraint::at_least(format!("ms_{k}"), slack, 0.0));
        }

        for (u, unit) in instance.units().iter().enumerate() {
            for p in 1..slots {
                let mut gap = Expr::from(slot_starts[u][p]).term(slot_starts[u][p - 1], -1.0);
                for &k in &unit.tasks {
                    if let Some(i) = domains[k].iter().position(|slot| slot.key == p) {
                        gap = gap.term(assign[k][i], -tasks[k].duration);
                    }
                }
                problem.add(Constraint::at_least(format!("sequence_{u}_{p}"), gap, 0.0));
            }
        }

        problem.minimise(Expr::from(makespan));

        Self {
            problem,
            domains,
            assign,
            quantity,
            makespan,
        }
    }

    /// Sets the warm-start hint of a task to the slot `key`, if it is part of its domain.
    pub fn hint(&mut self, task: usize, key: usize) {
        if let Some(i) = self.domains[task].iter().position(|slot| slot.key == key) {
            self.problem.hint(self.assign[task][i], 1.0);
        }
    }

    /// Reads the chosen slots and derives the schedule.
    ///
    /// Every unit runs its tasks in slot order from time zero, each one starting as soon as
    /// the previous one finishes. These are the smallest slot starts the model admits for
    /// the chosen assignment.
    #[must_use]
    pub fn extract<'a>(&self, instance: &'a Instance, outcome: &Outcome) -> Schedule<'a> {
        let chosen: Vec<usize> = self
            .assign
            .iter()
            .map(|vars| {
                let value = |i: &usize| outcome.value(vars[*i]).unwrap_or_default();
                (0..vars.len()).max_by(|a, b| value(a).total_cmp(&value(b))).unwrap_or_default()
            })
            .collect();

        let mut assignments: Vec<Option<Assignment>> = vec![None; instance.tasks().len()];

        for unit in instance.units() {
            let mut order = unit.tasks.clone();
            order.sort_by_key(|&k| self.domains[k][chosen[k]].key);

            let mut free = 0.0;
            for k in order {
                let task = instance.task(k);
                let i = chosen[k];
                let quantity = outcome
                    .value(self.quantity[k][i])
                    .unwrap_or(task.batch_min)
                    .clamp(task.batch_min, task.batch_max);

                let slot = Some(self.domains[k][i].key);
                let assignment = Assignment::new(instance, k, slot, free, quantity);
                free = assignment.finish;
                assignments[k] = Some(assignment);
            }
        }

        Schedule::new(instance, assignments.into_iter().flatten().collect())
    }
}
