use serde::{Deserialize, Serialize};

use crate::config::MIN_VISIBLE_POINTS;
use crate::telemetry::TelemetrySample;

pub const MIN_ZOOM: u8 = 1;
pub const MAX_ZOOM: u8 = 5;

/// Share of the lap visible at zoom 1, in percent
const BASE_DATA_PERCENTAGE: f64 = 15.;
/// Percentage points removed per zoom step
const ZOOM_STEP_PERCENTAGE: f64 = 3.25;

/// Contiguous range of reference lap samples on screen. Both ends inclusive.
///
/// `start_idx` is "now"; higher indices are further along the lap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleWindow {
    pub start_idx: usize,
    pub end_idx: usize,
}

impl VisibleWindow {
    pub fn len(&self) -> usize {
        (self.end_idx + 1).saturating_sub(self.start_idx)
    }

    pub fn is_empty(&self) -> bool {
        self.end_idx < self.start_idx
    }

    /// Samples of the reference lap covered by the window.
    pub fn data<'a>(&self, samples: &'a [TelemetrySample]) -> &'a [TelemetrySample] {
        let end = (self.end_idx + 1).min(samples.len());
        samples.get(self.start_idx.min(end)..end).unwrap_or(&[])
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.start_idx..=self.end_idx).contains(&index)
    }
}

/// Percentage of the lap shown at `zoom_level`: 15% at zoom 1 down to 2% at zoom 5.
pub fn data_percentage(zoom_level: u8) -> f64 {
    let zoom = zoom_level.clamp(MIN_ZOOM, MAX_ZOOM);
    BASE_DATA_PERCENTAGE - (zoom - 1) as f64 * ZOOM_STEP_PERCENTAGE
}

/// Number of samples on screen, never fewer than `min_points`.
pub fn points_to_show(total_points: usize, zoom_level: u8, min_points: usize) -> usize {
    let share = (total_points as f64 * data_percentage(zoom_level) / 100.).floor() as usize;
    share.max(min_points)
}

/// Computes the window for a scrub `position` (fractional sample index).
///
/// `None` when the lap has no samples.
pub fn compute_window(
    total_points: usize,
    position: f64,
    zoom_level: u8,
    min_points: usize,
) -> Option<VisibleWindow> {
    if total_points == 0 {
        return None;
    }
    let points = points_to_show(total_points, zoom_level, min_points);
    let max_start = total_points.saturating_sub(points);
    let floor = position.floor();
    let start_idx = if floor.is_nan() || floor <= 0. {
        0
    } else {
        (floor as usize).min(max_start)
    };
    let end_idx = (start_idx + points - 1).min(total_points - 1);
    Some(VisibleWindow { start_idx, end_idx })
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct WindowKey {
    position: u64,
    zoom_level: u8,
    total_points: usize,
}

/// Memoizes [`compute_window`] on `(position, zoom, total_points)`.
///
/// Including `total_points` in the key means switching the reference lap
/// invalidates the cached window.
#[derive(Clone, Debug)]
pub struct VisibleWindowCache {
    min_points: usize,
    cached: Option<(WindowKey, Option<VisibleWindow>)>,
    computations: usize,
}

impl Default for VisibleWindowCache {
    fn default() -> Self {
        Self::new(MIN_VISIBLE_POINTS)
    }
}

impl VisibleWindowCache {
    pub fn new(min_points: usize) -> Self {
        Self {
            min_points: min_points.max(1),
            cached: None,
            computations: 0,
        }
    }

    pub fn window(
        &mut self,
        total_points: usize,
        position: f64,
        zoom_level: u8,
    ) -> Option<VisibleWindow> {
        let key = WindowKey {
            position: position.to_bits(),
            zoom_level,
            total_points,
        };
        if let Some((cached_key, window)) = self.cached {
            if cached_key == key {
                return window;
            }
        }

        let window = compute_window(total_points, position, zoom_level, self.min_points);
        self.computations += 1;
        self.cached = Some((key, window));
        window
    }

    /// How many times the window was actually recomputed.
    pub fn computations(&self) -> usize {
        self.computations
    }

    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}
