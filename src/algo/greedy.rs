use crate::core::{Instance, Schedule};

/// Serial baseline: every unit runs its tasks back to back in declared order from time zero.
/// Returns start times indexed by task id. Always feasible.
#[must_use]
pub fn greedy_starts(instance: &Instance) -> Vec<f64> {
    let mut starts = vec![0.0; instance.tasks().len()];

    for unit in instance.units() {
        let mut free = 0.0;
        for &task in &unit.tasks {
            starts[task] = free;
            free += instance.task(task).duration;
        }
    }

    starts
}

/// Baseline schedule built from [`greedy_starts`].
#[must_use]
pub fn greedy_schedule(instance: &Instance) -> Schedule<'_> {
    Schedule::from_starts(instance, &greedy_starts(instance))
}
