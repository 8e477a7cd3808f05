use super::greedy::greedy_starts;
use super::slots::SlotModel;
use super::window::{build_windows, slot_domains};
use crate::core::{Instance, Scheduler, Settings, Solution};
use crate::error::Result;
use crate::solver::{Budget, Optimizer};

/// Windowed hybrid.
///
/// The greedy baseline ranks the tasks of every unit, each task may only use the slots within
/// `width` of its rank, and the slot model is solved over these windows with the centres as
/// warm start. There is no fallback: an infeasible or timed-out solve is returned as is.
#[derive(Clone, Copy, Debug)]
pub struct Windowed {
    pub width: usize,
    pub budget: Budget,
}

impl From<&Settings> for Windowed {
    fn from(settings: &Settings) -> Self {
        Self {
            width: settings.width,
            budget: settings.windowed,
        }
    }
}

impl Default for Windowed {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl Windowed {
    #[must_use]
    pub fn with_width(width: usize) -> Self {
        Self {
            width,
            ..Self::default()
        }
    }

    /// Builds the windowed slot model with its warm start.
    #[must_use]
    pub fn model(&self, instance: &Instance) -> SlotModel {
        let windows = build_windows(instance, &greedy_starts(instance), self.width);
        let mut model = SlotModel::new("windowed", instance, slot_domains(&windows));
        for (task, window) in windows.iter().enumerate() {
            model.hint(task, window.center);
        }
        model
    }
}

impl Scheduler for Windowed {
    fn schedule<'a>(
        &mut self,
        instance: &'a Instance,
        optimizer: &mut dyn Optimizer,
    ) -> Result<Solution<'a>> {
        let _span =
            tracing::info_span!("windowed", width = self.width, backend = optimizer.name()).entered();

        let model = self.model(instance);
        tracing::debug!(
            candidates = model.domains.iter().map(Vec::len).sum::<usize>(),
            constraints = model.problem.constraints.len(),
            "windowed model generated"
        );

        let outcome = optimizer.solve(&model.problem, self.budget)?;
        if !outcome.status.has_solution() {
            tracing::warn!(status = %outcome.status, "windowed model returned no schedule");
            return Ok(Solution::unsolved(outcome.status));
        }

        let schedule = model.extract(instance, &outcome);
        tracing::info!(status = %outcome.status, makespan = schedule.makespan(), "windowed finished");
        Ok(Solution::scheduled(outcome.status, schedule))
    }

    fn configure(&mut self, settings: &Settings) {
        *self = Self::from(settings);
    }

    fn name(&self) -> &'static str {
        "windowed"
    }
}

#[allow(unsafe_code)]
#[linkme::distributed_slice(super::PIPELINES)]
static INSTANCE: fn() -> Box<dyn Scheduler> = || Box::new(Windowed::default());

#[cfg(test)]
mod test {
    use super::*;
    use crate::solver::{Embedded, Reply, Scripted, Status};

    #[test]
    fn default_window_reaches_optimum() -> anyhow::Result<()> {
        let instance = Instance::with_durations(40.0, 4, &[&[10.0, 20.0], &[15.0]])?;
        let solution = Windowed::default().schedule(&instance, &mut Embedded)?;

        assert_eq!(solution.status, Status::Optimal);
        assert!(!solution.fallback);
        let schedule = solution.schedule.ok_or_else(|| anyhow::anyhow!("no schedule"))?;
        assert!(schedule.verify());
        assert!((schedule.makespan() - 30.0).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn hints_sit_at_window_centres() -> anyhow::Result<()> {
        let instance = Instance::with_durations(40.0, 4, &[&[10.0, 20.0], &[15.0]])?;
        let model = Windowed::default().model(&instance);

        let hinted = vec![
            (model.assign[0][0], 1.0),
            (model.assign[1][1], 1.0),
            (model.assign[2][0], 1.0),
        ];
        assert_eq!(model.problem.hints, hinted);
        Ok(())
    }

    #[test]
    fn zero_width_can_be_infeasible() -> anyhow::Result<()> {
        // Ranks 0 and 1 both map to slot 1.
        let instance = Instance::with_durations(40.0, 2, &[&[10.0, 20.0, 5.0]])?;
        let solution = Windowed::with_width(0).schedule(&instance, &mut Embedded)?;
        assert_eq!(solution.status, Status::Infeasible);
        assert!(solution.schedule.is_none());
        assert!(!solution.fallback);
        Ok(())
    }

    #[test]
    fn wider_windows_never_hurt() -> anyhow::Result<()> {
        let instance = Instance::with_durations(100.0, 4, &[&[10.0, 20.0, 5.0], &[7.0, 7.0]])?;
        let mut previous = f64::INFINITY;
        for width in 0..=instance.slots() {
            let solution = Windowed::with_width(width).schedule(&instance, &mut Embedded)?;
            if let Some(makespan) = solution.makespan() {
                assert!(makespan <= previous + 1e-6, "width {width}: {makespan} > {previous}");
                previous = makespan;
            }
        }
        assert!((previous - 35.0).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn feasible_solve_is_returned_as_success() -> anyhow::Result<()> {
        let instance = Instance::with_durations(40.0, 4, &[&[10.0, 20.0], &[15.0]])?;
        let mut optimizer = Scripted::new([Reply::Feasible]);
        let solution = Windowed::default().schedule(&instance, &mut optimizer)?;

        assert_eq!(solution.status, Status::Feasible);
        assert!(!solution.fallback);
        let schedule = solution.schedule.ok_or_else(|| anyhow::anyhow!("no schedule"))?;
        assert!(schedule.verify());
        assert!((schedule.makespan() - 30.0).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn timeout_is_surfaced_without_fallback() -> anyhow::Result<()> {
        let instance = Instance::with_durations(40.0, 4, &[&[10.0, 20.0]])?;
        let mut optimizer = Scripted::new([Reply::Fail(Status::Timeout)]);
        let solution = Windowed::default().schedule(&instance, &mut optimizer)?;
        assert_eq!(solution.status, Status::Timeout);
        assert!(solution.schedule.is_none());
        assert_eq!(optimizer.received().len(), 1);
        Ok(())
    }
}
