mod instance;
mod schedule;
mod settings;
mod solution;

pub use instance::*;
pub use schedule::*;
pub use settings::*;
pub use solution::*;

use crate::error::Result;
use crate::solver::Optimizer;

/// A scheduling pipeline.
pub trait Scheduler {
    /// Schedules the tasks of the given instance using the optimizer for every solve.
    ///
    /// # Errors
    /// - If the optimizer backend fails. Infeasibility and timeouts are reported through
    ///   [`Solution::status`] instead.
    fn schedule<'a>(
        &mut self,
        instance: &'a Instance,
        optimizer: &mut dyn Optimizer,
    ) -> Result<Solution<'a>>;

    /// Replaces the budgets (and any other tunables) with the given settings.
    fn configure(&mut self, settings: &Settings);

    /// Returns the name of the pipeline.
    fn name(&self) -> &'static str;
}
