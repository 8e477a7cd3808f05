/// Maximum number of points of the coarse grid.
pub const COARSE_POINTS: usize = 8;

/// Number of coarse points used for `slots` full-fidelity slots.
#[must_use]
pub fn coarse_points(slots: usize) -> usize {
    slots.min(COARSE_POINTS)
}

/// Evenly spaced points over `[0, horizon]`, both ends included.
/// Points are rounded to whole time units, ties to even. A single point yields `[0]`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn coarse_grid(horizon: f64, points: usize) -> Vec<f64> {
    if points <= 1 {
        return vec![0.0];
    }

    let last = (points - 1) as f64;
    (0..points)
        .map(|k| (horizon * k as f64 / last).round_ties_even())
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn grid_spans_horizon() {
        assert_eq!(coarse_grid(40.0, 4), vec![0.0, 13.0, 27.0, 40.0]);
        assert_eq!(coarse_grid(30.0, 4), vec![0.0, 10.0, 20.0, 30.0]);
        assert_eq!(coarse_grid(200.0, 2), vec![0.0, 200.0]);
    }

    #[test]
    fn single_point_grid() {
        assert_eq!(coarse_grid(40.0, 1), vec![0.0]);
        assert_eq!(coarse_grid(40.0, 0), vec![0.0]);
    }

    #[test]
    fn point_count_is_capped() {
        assert_eq!(coarse_points(4), 4);
        assert_eq!(coarse_points(8), 8);
        assert_eq!(coarse_points(20), 8);
    }
}
