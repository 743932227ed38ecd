pub mod coordinator;
pub mod source;

use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

pub use coordinator::{LapCompletion, LoadCoordinator};
pub use source::{FileTelemetrySource, TelemetrySource};

use crate::errors::SourceError;
use crate::telemetry::ProcessedLapData;

/// What the lap metadata collaborator knows about a lap.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LapMetadata {
    pub id: String,
    /// Lap duration in seconds, when known
    pub lap_time_s: Option<f64>,
}

impl LapMetadata {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            lap_time_s: None,
        }
    }

    pub fn with_lap_time(mut self, lap_time_s: f64) -> Self {
        self.lap_time_s = Some(lap_time_s);
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum LapStatus {
    NotStarted,
    InFlight,
    /// Completed with telemetry
    Loaded,
    /// Completed, but the telemetry had no usable samples
    NoData,
    Failed(SourceError),
}

impl LapStatus {
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            LapStatus::Loaded | LapStatus::NoData | LapStatus::Failed(_)
        )
    }
}

/// Result of one lap's load pipeline.
#[derive(Debug)]
pub enum LapOutcome {
    Loaded(ProcessedLapData),
    NoData,
    Failed(SourceError),
}

/// Aggregate progress over the selected laps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadProgress {
    /// Laps whose pipeline has finished, with or without data
    pub loaded: usize,
    pub total: usize,
}

impl LoadProgress {
    pub fn is_complete(&self) -> bool {
        self.loaded >= self.total
    }

    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.
        } else {
            self.loaded as f64 / self.total as f64
        }
    }
}

/// Lap id to processed data, plus the load status of every known lap.
///
/// Grows monotonically: once a lap is finished its entry is never touched again,
/// so out-of-order completions cannot clobber each other.
#[derive(Debug, Default)]
pub struct LapStore {
    order: Vec<String>,
    statuses: HashMap<String, LapStatus>,
    laps: HashMap<String, ProcessedLapData>,
}

impl LapStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes a lap known to the store. Returns `false` if it already was.
    pub fn register(&mut self, lap_id: &str) -> bool {
        if self.statuses.contains_key(lap_id) {
            return false;
        }
        self.order.push(lap_id.to_string());
        self.statuses
            .insert(lap_id.to_string(), LapStatus::NotStarted);
        true
    }

    pub fn mark_in_flight(&mut self, lap_id: &str) {
        if let Some(status) = self.statuses.get_mut(lap_id) {
            if !status.is_finished() {
                *status = LapStatus::InFlight;
            }
        }
    }

    /// Records the outcome of a lap. Only the first completion of a lap counts;
    /// later ones are ignored and return `false`.
    pub fn complete(&mut self, lap_id: &str, outcome: LapOutcome) -> bool {
        self.register(lap_id);
        let Some(status) = self.statuses.get_mut(lap_id) else {
            return false;
        };
        if status.is_finished() {
            debug!("Ignoring repeated completion of lap {}", lap_id);
            return false;
        }

        match outcome {
            LapOutcome::Loaded(data) => {
                *status = LapStatus::Loaded;
                self.laps.insert(lap_id.to_string(), data);
            }
            LapOutcome::NoData => *status = LapStatus::NoData,
            LapOutcome::Failed(error) => *status = LapStatus::Failed(error),
        }
        true
    }

    pub fn status(&self, lap_id: &str) -> Option<&LapStatus> {
        self.statuses.get(lap_id)
    }

    pub fn get(&self, lap_id: &str) -> Option<&ProcessedLapData> {
        self.laps.get(lap_id)
    }

    /// Loaded laps in registration order.
    pub fn loaded_laps(&self) -> impl Iterator<Item = (&str, &ProcessedLapData)> {
        self.order
            .iter()
            .filter_map(|id| self.laps.get(id).map(|lap| (id.as_str(), lap)))
    }

    pub fn lap_ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|id| id.as_str())
    }

    /// Progress over `lap_ids`.
    pub fn progress_of<'a>(&self, lap_ids: impl IntoIterator<Item = &'a str>) -> LoadProgress {
        let mut progress = LoadProgress {
            loaded: 0,
            total: 0,
        };
        for lap_id in lap_ids {
            progress.total += 1;
            if self.status(lap_id).is_some_and(|s| s.is_finished()) {
                progress.loaded += 1;
            }
        }
        progress
    }

    /// Progress over every lap the store knows.
    pub fn progress(&self) -> LoadProgress {
        self.progress_of(self.order.iter().map(|id| id.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::TelemetrySample;

    fn lap_with_points(points: usize) -> ProcessedLapData {
        let samples = (0..points)
            .map(|i| TelemetrySample {
                lap_dist_pct: i as f64,
                ..TelemetrySample::default()
            })
            .collect();
        ProcessedLapData::from_samples(samples, 0).unwrap()
    }

    #[test]
    fn test_completion_is_idempotent() {
        let mut store = LapStore::new();
        store.register("lap-1");

        assert!(store.complete("lap-1", LapOutcome::Loaded(lap_with_points(10))));
        assert!(!store.complete("lap-1", LapOutcome::Loaded(lap_with_points(20))));
        assert!(!store.complete("lap-1", LapOutcome::NoData));

        assert_eq!(store.get("lap-1").unwrap().total_points(), 10);
        assert_eq!(store.status("lap-1"), Some(&LapStatus::Loaded));
    }

    #[test]
    fn test_failures_are_kept_per_lap() {
        let mut store = LapStore::new();
        store.register("good");
        store.register("bad");
        store.register("empty");

        let error = SourceError::FetchFailed {
            lap_id: "bad".to_string(),
            description: "timeout".to_string(),
        };
        store.complete("bad", LapOutcome::Failed(error.clone()));
        store.complete("empty", LapOutcome::NoData);

        assert_eq!(store.status("bad"), Some(&LapStatus::Failed(error)));
        assert_eq!(store.status("empty"), Some(&LapStatus::NoData));
        assert_eq!(store.status("good"), Some(&LapStatus::NotStarted));
        assert_eq!(store.progress(), LoadProgress { loaded: 2, total: 3 });
        assert!(store.get("bad").is_none());
    }

    #[test]
    fn test_in_flight_does_not_override_finished() {
        let mut store = LapStore::new();
        store.register("lap-1");
        store.mark_in_flight("lap-1");
        assert_eq!(store.status("lap-1"), Some(&LapStatus::InFlight));

        store.complete("lap-1", LapOutcome::NoData);
        store.mark_in_flight("lap-1");
        assert_eq!(store.status("lap-1"), Some(&LapStatus::NoData));
    }

    #[test]
    fn test_loaded_laps_keep_registration_order() {
        let mut store = LapStore::new();
        for id in ["c", "a", "b"] {
            store.register(id);
        }
        store.complete("b", LapOutcome::Loaded(lap_with_points(3)));
        store.complete("c", LapOutcome::Loaded(lap_with_points(3)));

        let ids = store.loaded_laps().map(|(id, _)| id).collect::<Vec<_>>();
        assert_eq!(ids, vec!["c", "b"]);
        assert!(!store.register("a"));
    }

    #[test]
    fn test_progress_fraction() {
        let progress = LoadProgress { loaded: 1, total: 4 };
        assert_eq!(progress.fraction(), 0.25);
        assert!(!progress.is_complete());
        assert!(LoadProgress { loaded: 0, total: 0 }.is_complete());
    }
}
