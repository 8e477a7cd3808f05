use super::{Instance, TaskId};
use serde::Serialize;

/// Tolerance used when comparing times and quantities coming back from a solver.
pub const TOLERANCE: f64 = 1e-6;

/// Placement of a single task.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Assignment {
    pub task: TaskId,
    /// Full-domain slot (1-based) for slot models, `None` for continuous schedules.
    pub slot: Option<usize>,
    pub start: f64,
    pub finish: f64,
    pub quantity: f64,
}

impl Assignment {
    /// Creates an assignment. Finish is derived from the task duration.
    #[must_use]
    pub fn new(instance: &Instance, task: TaskId, slot: Option<usize>, start: f64, quantity: f64) -> Self {
        Self {
            task,
            slot,
            start,
            finish: start + instance.task(task).duration,
            quantity,
        }
    }
}

/// Schedule of the whole instance: one assignment per task.
#[derive(Clone, Debug)]
pub struct Schedule<'a> {
    instance: &'a Instance,
    assignments: Vec<Assignment>,
}

impl<'a> Schedule<'a> {
    /// Creates a schedule from assignments indexed by task id.
    #[must_use]
    pub fn new(instance: &'a Instance, assignments: Vec<Assignment>) -> Self {
        Self {
            instance,
            assignments,
        }
    }

    /// Creates a continuous schedule from start times indexed by task id.
    /// Batch quantities are set to the lower bound of each task.
    #[must_use]
    pub fn from_starts(instance: &'a Instance, starts: &[f64]) -> Self {
        let assignments = starts
            .iter()
            .enumerate()
            .map(|(task, &start)| {
                let quantity = instance.task(task).batch_min;
                Assignment::new(instance, task, None, start, quantity)
            })
            .collect();
        Self::new(instance, assignments)
    }

    #[must_use]
    pub const fn instance(&self) -> &'a Instance {
        self.instance
    }

    #[must_use]
    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    #[must_use]
    pub fn assignment(&self, task: TaskId) -> Option<&Assignment> {
        self.assignments.get(task)
    }

    /// Start times indexed by task id.
    #[must_use]
    pub fn starts(&self) -> Vec<f64> {
        self.assignments.iter().map(|a| a.start).collect()
    }

    /// Maximum finish time over all assignments.
    #[must_use]
    pub fn makespan(&self) -> f64 {
        self.assignments.iter().map(|a| a.finish).fold(0.0, f64::max)
    }

    /// Checks every invariant of a valid schedule:
    /// one assignment per task, finish equal to start plus duration, non-negative starts,
    /// batch quantity within bounds, no two tasks of a unit overlapping in time and no two
    /// tasks of a unit sharing a slot.
    #[must_use]
    pub fn verify(&self) -> bool {
        if self.assignments.len() != self.instance.tasks().len() {
            return false;
        }

        let consistent = self.assignments.iter().enumerate().all(|(id, a)| {
            let task = self.instance.task(id);
            a.task == id
                && a.start >= -TOLERANCE
                && (a.finish - a.start - task.duration).abs() <= TOLERANCE
                && a.quantity >= task.batch_min - TOLERANCE
                && a.quantity <= task.batch_max + TOLERANCE
        });

        consistent && (0..self.instance.units().len()).all(|unit| self.verify_unit(unit))
    }

    fn verify_unit(&self, unit: usize) -> bool {
        let tasks = self.instance.unit_tasks(unit);
        tasks.iter().enumerate().all(|(i, &first)| {
            tasks[i + 1..].iter().all(|&second| {
                let a = &self.assignments[first];
                let b = &self.assignments[second];
                let disjoint = a.finish <= b.start + TOLERANCE || b.finish <= a.start + TOLERANCE;
                let shared_slot = a.slot.is_some() && a.slot == b.slot;
                disjoint && !shared_slot
            })
        })
    }
}
