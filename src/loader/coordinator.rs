use std::{rc::Rc, time::Duration};

use itertools::Itertools;
use log::{debug, error, info, warn};
use tokio::{
    sync::mpsc::{self, UnboundedSender},
    time,
};

use super::{LapMetadata, LapOutcome, LapStatus, LapStore, LoadProgress, TelemetrySource};
use crate::config::EngineConfig;
use crate::errors::SourceError;
use crate::telemetry::{ProcessedLapData, process_lap};

/// Handed to the completion callback exactly once per lap.
#[derive(Debug)]
pub struct LapCompletion<'a> {
    pub lap_id: &'a str,
    /// `None` when the lap had no usable telemetry or the fetch failed
    pub data: Option<&'a ProcessedLapData>,
    pub error: Option<&'a SourceError>,
    pub progress: LoadProgress,
}

#[derive(Debug)]
enum LoadEvent {
    Started(String),
    Finished(String, LapOutcome),
}

/// Runs one fetch-and-process pipeline per selected lap.
///
/// Pipelines start `stagger * position` apart so a large selection does not hit
/// the telemetry source all at once. They run as local tasks on the current
/// thread and report back over a channel; the coordinator is the only writer of
/// its [`LapStore`].
#[derive(Debug)]
pub struct LoadCoordinator {
    stagger: Duration,
    store: LapStore,
}

impl LoadCoordinator {
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_stagger(Duration::from_millis(config.stagger_delay_ms))
    }

    pub fn with_stagger(stagger: Duration) -> Self {
        Self {
            stagger,
            store: LapStore::new(),
        }
    }

    pub fn store(&self) -> &LapStore {
        &self.store
    }

    pub fn into_store(self) -> LapStore {
        self.store
    }

    pub fn progress_of(&self, laps: &[LapMetadata]) -> LoadProgress {
        self.store
            .progress_of(laps.iter().map(|lap| lap.id.as_str()).unique())
    }

    /// Loads every lap in `laps` that has not finished loading yet.
    ///
    /// `on_complete` fires once per lap as soon as its pipeline is done, in
    /// completion order. A failing lap never stops the others. Must be awaited
    /// inside a `tokio::task::LocalSet`.
    pub async fn load_laps<S, F>(
        &mut self,
        laps: &[LapMetadata],
        source: Rc<S>,
        mut on_complete: F,
    ) -> LoadProgress
    where
        S: TelemetrySource + 'static,
        F: FnMut(&LapCompletion<'_>),
    {
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();

        for (lane_index, lap) in laps.iter().unique_by(|lap| lap.id.clone()).enumerate() {
            self.store.register(&lap.id);
            if self.store.status(&lap.id).is_some_and(|s| s.is_finished()) {
                debug!("Lap {} already loaded, skipping", lap.id);
                continue;
            }
            let delay = self.stagger * lane_index as u32;
            tokio::task::spawn_local(run_pipeline(
                lap.clone(),
                lane_index,
                delay,
                Rc::clone(&source),
                events_tx.clone(),
            ));
        }
        // the channel closes once every pipeline has reported back
        drop(events_tx);

        while let Some(event) = events_rx.recv().await {
            match event {
                LoadEvent::Started(lap_id) => {
                    info!("Loading telemetry for lap {}", lap_id);
                    self.store.mark_in_flight(&lap_id);
                }
                LoadEvent::Finished(lap_id, outcome) => {
                    match &outcome {
                        LapOutcome::Loaded(data) => info!(
                            "Loaded lap {} with {} samples",
                            lap_id,
                            data.total_points()
                        ),
                        LapOutcome::NoData => warn!("No telemetry data for lap {}", lap_id),
                        LapOutcome::Failed(e) => error!("Could not load lap {}: {}", lap_id, e),
                    }
                    if !self.store.complete(&lap_id, outcome) {
                        continue;
                    }

                    let progress = self.progress_of(laps);
                    let error = match self.store.status(&lap_id) {
                        Some(LapStatus::Failed(e)) => Some(e),
                        _ => None,
                    };
                    on_complete(&LapCompletion {
                        lap_id: &lap_id,
                        data: self.store.get(&lap_id),
                        error,
                        progress,
                    });
                }
            }
        }

        self.progress_of(laps)
    }
}

async fn run_pipeline<S: TelemetrySource>(
    lap: LapMetadata,
    lane_index: usize,
    delay: Duration,
    source: Rc<S>,
    events: UnboundedSender<LoadEvent>,
) {
    if !delay.is_zero() {
        time::sleep(delay).await;
    }
    let _ = events.send(LoadEvent::Started(lap.id.clone()));

    let outcome = match source.fetch_telemetry(&lap).await {
        Ok(raw) => match process_lap(&raw, lane_index) {
            Some(data) => LapOutcome::Loaded(data),
            None => LapOutcome::NoData,
        },
        Err(e) => LapOutcome::Failed(e),
    };

    let _ = events
        .send(LoadEvent::Finished(lap.id, outcome))
        .map_err(|e| debug!("Load coordinator went away before lap finished: {}", e));
}
