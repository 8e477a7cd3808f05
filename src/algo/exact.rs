use super::disjunctive::{Candidate, Domain};
use super::slots::SlotModel;
use crate::core::{Instance, Scheduler, Settings, Solution};
use crate::error::Result;
use crate::solver::{Budget, Optimizer};

/// Every slot `1..=P` for every task.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn full_domains(instance: &Instance) -> Vec<Domain> {
    let domain: Domain = (1..=instance.slots())
        .map(|p| Candidate::new(p, p as f64, 1.0))
        .collect();
    vec![domain; instance.tasks().len()]
}

/// Exact pipeline: the slot model over the full domain, solved once.
/// Infeasibility and timeouts are reported as they are.
#[derive(Clone, Copy, Debug)]
pub struct Exact {
    pub budget: Budget,
}

impl From<&Settings> for Exact {
    fn from(settings: &Settings) -> Self {
        Self {
            budget: settings.exact,
        }
    }
}

impl Default for Exact {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl Scheduler for Exact {
    fn schedule<'a>(
        &mut self,
        instance: &'a Instance,
        optimizer: &mut dyn Optimizer,
    ) -> Result<Solution<'a>> {
        let _span = tracing::info_span!("exact", backend = optimizer.name()).entered();

        let model = SlotModel::new("exact", instance, full_domains(instance));
        tracing::debug!(
            variables = model.problem.variables.len(),
            constraints = model.problem.constraints.len(),
            "slot model generated"
        );

        let outcome = optimizer.solve(&model.problem, self.budget)?;
        if !outcome.status.has_solution() {
            tracing::warn!(status = %outcome.status, "exact model returned no schedule");
            return Ok(Solution::unsolved(outcome.status));
        }

        let schedule = model.extract(instance, &outcome);
        tracing::info!(status = %outcome.status, makespan = schedule.makespan(), "exact finished");
        Ok(Solution::scheduled(outcome.status, schedule))
    }

    fn configure(&mut self, settings: &Settings) {
        *self = Self::from(settings);
    }

    fn name(&self) -> &'static str {
        "exact"
    }
}

#[allow(unsafe_code)]
#[linkme::distributed_slice(super::PIPELINES)]
static INSTANCE: fn() -> Box<dyn Scheduler> = || Box::new(Exact::default());
