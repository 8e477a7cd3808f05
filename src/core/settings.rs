use crate::solver::Budget;
use std::time::Duration;

/// Budgets of every solve site and the window width of the hybrid pipeline.
///
/// Each budget is handed to exactly one solve; a stage is never retried.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Settings {
    /// Full-domain slot model.
    pub exact: Budget,
    /// Coarse grid model of the two-phase heuristic.
    pub coarse: Budget,
    /// Left-shift refinement.
    pub refine: Budget,
    /// Windowed slot model.
    pub windowed: Budget,
    /// Slots on each side of a window centre.
    pub width: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            exact: Budget::new(Duration::from_secs(3600), 1e-4),
            coarse: Budget::new(Duration::from_secs(1), 0.05),
            refine: Budget::new(Duration::from_secs(60), 0.0),
            windowed: Budget::new(Duration::from_secs(60), 1e-2),
            width: 1,
        }
    }
}

impl Settings {
    /// Applies the same time limit to every solve site, keeping the gaps.
    #[must_use]
    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.exact.time_limit = time_limit;
        self.coarse.time_limit = time_limit;
        self.refine.time_limit = time_limit;
        self.windowed.time_limit = time_limit;
        self
    }
}
