use super::Schedule;
use crate::solver::Status;

/// Result of a pipeline run.
#[derive(Clone, Debug)]
pub struct Solution<'a> {
    /// Status of the final solve.
    pub status: Status,
    /// Present whenever the final solve produced an assignment.
    pub schedule: Option<Schedule<'a>>,
    /// Whether the greedy baseline replaced the coarse phase.
    pub fallback: bool,
}

impl<'a> Solution<'a> {
    /// Creates a solution from a schedule.
    #[must_use]
    pub const fn scheduled(status: Status, schedule: Schedule<'a>) -> Self {
        Self {
            status,
            schedule: Some(schedule),
            fallback: false,
        }
    }

    /// Creates a solution without a schedule.
    #[must_use]
    pub const fn unsolved(status: Status) -> Self {
        Self {
            status,
            schedule: None,
            fallback: false,
        }
    }

    #[must_use]
    pub fn with_fallback(mut self, fallback: bool) -> Self {
        self.fallback = fallback;
        self
    }

    /// Makespan of the schedule, if there is one.
    #[must_use]
    pub fn makespan(&self) -> Option<f64> {
        self.schedule.as_ref().map(Schedule::makespan)
    }
}
