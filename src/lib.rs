// Library interface for lapsync
// Multi-lap telemetry synchronization and playback engine

pub mod config;
pub mod errors;
pub mod loader;
pub mod playback;
pub mod telemetry;
pub mod track_map;
pub mod writer;

// Re-export commonly used types
pub use config::EngineConfig;
pub use errors::{LapSyncError, SourceError};
pub use loader::{LapMetadata, LapStatus, LapStore, LoadCoordinator, LoadProgress, TelemetrySource};
pub use playback::{
    AlignedFrame, PlaybackController, PlaybackState, ReferenceLap, VisibleWindow, align_window,
};
pub use telemetry::{Channel, ProcessedLapData, TelemetrySample, process_lap};
pub use track_map::TrackMap;
