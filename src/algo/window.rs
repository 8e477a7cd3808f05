use super::disjunctive::{Candidate, Domain};
use crate::core::Instance;
use std::ops::RangeInclusive;

/// Candidate slots of a task in the windowed model.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Window {
    /// Estimated slot, used as the warm-start hint.
    pub center: usize,
    pub slots: RangeInclusive<usize>,
}

impl Window {
    /// Window of width `width` around `center`, clipped to `1..=slots`.
    #[must_use]
    pub fn around(center: usize, width: usize, slots: usize) -> Self {
        let low = center.saturating_sub(width).max(1);
        let high = center.saturating_add(width).min(slots);
        Self {
            center,
            slots: low..=high,
        }
    }
}

/// Centre slot of the `idx`-th of `count` tasks, spread linearly over `1..=slots`.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn center_slot(idx: usize, count: usize, slots: usize) -> usize {
    if count <= 1 {
        return 1;
    }
    let offset = (idx * (slots - 1)) as f64 / (count - 1) as f64;
    offset.round_ties_even() as usize + 1
}

/// Windows indexed by task id.
///
/// Tasks of every unit are ranked by their baseline start (ties broken by declared order),
/// the rank is mapped to a centre slot and the window spans `width` slots on each side.
/// A width of at least `P` yields the full domain.
#[must_use]
pub fn build_windows(instance: &Instance, starts: &[f64], width: usize) -> Vec<Window> {
    let slots = instance.slots();
    let mut windows = vec![Window::around(1, width, slots); instance.tasks().len()];

    for unit in instance.units() {
        let mut order = unit.tasks.clone();
        order.sort_by(|&a, &b| starts[a].total_cmp(&starts[b]));

        let count = order.len();
        for (idx, task) in order.into_iter().enumerate() {
            windows[task] = Window::around(center_slot(idx, count, slots), width, slots);
        }
    }

    windows
}

/// Slot candidates of each window. A slot occupies `[p, p + 1)` so that candidates of two
/// tasks overlap exactly when they share a slot.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn slot_domains(windows: &[Window]) -> Vec<Domain> {
    let iter = windows.iter();
    iter.map(|window| window.slots.clone().map(|p| Candidate::new(p, p as f64, 1.0)).collect())
        .collect()
}
