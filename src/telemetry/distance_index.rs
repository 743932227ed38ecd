use super::TelemetrySample;

/// Ascending lap distance percentages of a lap, one per sample.
///
/// Lets a lap be sampled by track position instead of by index, which is how laps
/// with different sample counts get compared frame by frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LapDistanceIndex {
    distances: Vec<f64>,
}

impl LapDistanceIndex {
    /// `samples` must already be sorted by `lap_dist_pct`.
    pub fn from_samples(samples: &[TelemetrySample]) -> Self {
        Self {
            distances: samples.iter().map(|s| s.lap_dist_pct).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.distances
    }

    pub fn closest(&self, lap_dist_pct: f64) -> Option<usize> {
        closest_index(&self.distances, lap_dist_pct)
    }
}

/// Index of the value in `sorted` closest to `target`, in O(log n).
///
/// Targets outside the array clamp to the first or last index. When several
/// entries are equally close the lowest index wins, which matches
/// [`closest_index_linear`] exactly. `None` only for an empty slice.
pub fn closest_index(sorted: &[f64], target: f64) -> Option<usize> {
    closest_index_by(sorted, |value| *value, target)
}

/// [`closest_index`] over items sorted ascending by `key`.
pub fn closest_index_by<T>(sorted: &[T], key: impl Fn(&T) -> f64, target: f64) -> Option<usize> {
    let last = key(sorted.last()?);

    // first entry that is >= target
    let upper = sorted.partition_point(|item| key(item) < target);
    if upper == 0 {
        return Some(0);
    }
    if upper == sorted.len() {
        return Some(sorted.partition_point(|item| key(item) < last));
    }

    let below = key(&sorted[upper - 1]);
    let above = key(&sorted[upper]);
    if target - below <= above - target {
        // leftmost duplicate of the lower neighbour
        Some(sorted.partition_point(|item| key(item) < below))
    } else {
        Some(upper)
    }
}

/// Reference implementation of [`closest_index`] using a full scan.
pub fn closest_index_linear(values: &[f64], target: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, value) in values.iter().enumerate() {
        let distance = (value - target).abs();
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((index, distance)),
        }
    }
    best.map(|(index, _)| index)
}
