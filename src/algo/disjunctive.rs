//! Disjunctive constraints between candidate placements.
//!
//! Every task owns a domain of candidate placements. The generator emits one one-hot group
//! per task and one exclusion for every pair of overlapping candidates of two distinct tasks
//! on the same unit. The work is `O(units · tasks² · domain²)`, which is why the coarse grid
//! and the windows are kept small.

use crate::core::{Instance, TaskId};
use crate::solver::{Constraint, Expr, Problem, Var};
use rayon::prelude::*;

/// Candidate placement of a task.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    /// Grid index or full-domain slot.
    pub key: usize,
    /// Occupied interval `[start, start + length)`.
    pub start: f64,
    pub length: f64,
}

impl Candidate {
    #[must_use]
    pub const fn new(key: usize, start: f64, length: f64) -> Self {
        Self { key, start, length }
    }

    #[must_use]
    pub fn end(&self) -> f64 {
        self.start + self.length
    }

    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end() && other.start < self.end()
    }
}

/// Candidates of a single task.
pub type Domain = Vec<Candidate>;

/// Reference to the `index`-th candidate of a task domain.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Placement {
    pub task: TaskId,
    pub index: usize,
}

/// Two placements that must not be chosen together.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Exclusion(pub Placement, pub Placement);

/// Constraint set produced by [`generate`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Disjunctions {
    /// Per task, the placements of which exactly one is chosen.
    pub one_hot: Vec<Vec<Placement>>,
    pub exclusions: Vec<Exclusion>,
}

impl Disjunctions {
    /// Adds the constraints to a problem. `vars[task][index]` is the binary of a placement.
    pub fn encode(&self, problem: &mut Problem, vars: &[Vec<Var>]) {
        problem.reserve_constraints(self.one_hot.len() + self.exclusions.len());

        for (task, group) in self.one_hot.iter().enumerate() {
            let mut sum = Expr::with_capacity(group.len());
            for placement in group {
                sum = sum.term(vars[placement.task][placement.index], 1.0);
            }
            problem.add(Constraint::equal(format!("one_{task}"), sum, 1.0));
        }

        for (n, Exclusion(first, second)) in self.exclusions.iter().enumerate() {
            let pair = Expr::from(vars[first.task][first.index]).term(vars[second.task][second.index], 1.0);
            problem.add(Constraint::at_most(format!("no_{n}"), pair, 1.0));
        }
    }
}

/// Coarse grid domains: every task may start at any grid point.
#[must_use]
pub fn grid_domains(instance: &Instance, grid: &[f64]) -> Vec<Domain> {
    let iter = instance.tasks().iter();
    iter.map(|task| {
        let iter = grid.iter().enumerate();
        iter.map(|(g, &time)| Candidate::new(g, time, task.duration)).collect()
    })
    .collect()
}

fn pair_bound(tasks: &[TaskId], domains: &[Domain]) -> usize {
    let iter = tasks.iter().enumerate();
    iter.map(|(i, &first)| {
        let others = tasks[i + 1..].iter().map(|&second| domains[second].len());
        domains[first].len() * others.sum::<usize>()
    })
    .sum()
}

/// Generates one-hot groups and pairwise exclusions. Units are processed in parallel.
#[must_use]
pub fn generate(instance: &Instance, domains: &[Domain]) -> Disjunctions {
    let one_hot = domains
        .iter()
        .enumerate()
        .map(|(task, domain)| (0..domain.len()).map(|index| Placement { task, index }).collect())
        .collect();

    let per_unit: Vec<Vec<Exclusion>> = instance
        .units()
        .par_iter()
        .map(|unit| unit_exclusions(&unit.tasks, domains))
        .collect();

    let mut exclusions = Vec::with_capacity(per_unit.iter().map(Vec::len).sum());
    for chunk in per_unit {
        exclusions.extend(chunk);
    }

    Disjunctions {
        one_hot,
        exclusions,
    }
}

fn unit_exclusions(tasks: &[TaskId], domains: &[Domain]) -> Vec<Exclusion> {
    let mut exclusions = Vec::with_capacity(pair_bound(tasks, domains));

    for (i, &first) in tasks.iter().enumerate() {
        for &second in &tasks[i + 1..] {
            for (a, left) in domains[first].iter().enumerate() {
                for (b, right) in domains[second].iter().enumerate() {
                    if left.overlaps(right) {
                        exclusions.push(Exclusion(
                            Placement { task: first, index: a },
                            Placement { task: second, index: b },
                        ));
                    }
                }
            }
        }
    }

    exclusions
}
