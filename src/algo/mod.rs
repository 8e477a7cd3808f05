pub mod disjunctive;
pub mod greedy;
pub mod grid;
pub mod refine;
pub mod slots;
pub mod window;

mod exact;
mod hybrid;
mod two_phase;

pub use exact::{full_domains, Exact};
pub use hybrid::Windowed;
pub use two_phase::{CoarseModel, TwoPhase};

use crate::core::Scheduler;

/// Every pipeline with its default configuration.
#[allow(unsafe_code)]
#[linkme::distributed_slice]
pub static PIPELINES: [fn() -> Box<dyn Scheduler>];

/// Instantiates the registered pipelines, ordered by name.
#[must_use]
pub fn pipelines() -> Vec<Box<dyn Scheduler>> {
    let mut pipelines: Vec<Box<dyn Scheduler>> = PIPELINES.iter().map(|init| init()).collect();
    pipelines.sort_by(|a, b| a.name().cmp(b.name()));
    pipelines
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn registry_holds_every_pipeline() {
        let names: Vec<String> = pipelines().iter().map(|p| p.name().to_owned()).collect();
        assert_eq!(names, ["exact", "two-phase", "windowed"]);
        assert_eq!(PIPELINES.len(), names.len());
    }
}
