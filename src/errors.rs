// Error types for lapsync

use snafu::Snafu;
use std::io;

#[derive(Debug, Snafu)]
pub enum LapSyncError {
    // Config management errors
    #[snafu(display("Could not find application data directory to save config file"))]
    NoConfigDir,
    #[snafu(display("Error reading or writing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error serializing config file"))]
    ConfigSerializeError { source: serde_json::Error },

    // Telemetry input errors
    #[snafu(display("Invalid telemetry file: {path}"))]
    InvalidTelemetryFile { path: String },
    #[snafu(display("Error loading telemetry file"))]
    TelemetryLoaderError { source: io::Error },
    #[snafu(display("No telemetry data available for lap {lap_id}"))]
    NoTelemetryData { lap_id: String },

    // Frame export errors
    #[snafu(display("Error writing frames file"))]
    WriterError { source: io::Error },

    // Runtime errors
    #[snafu(display("Could not start the playback runtime"))]
    RuntimeError { source: io::Error },

    // User input validation errors
    #[snafu(display("Invalid user input: {field} - {reason}"))]
    InvalidUserInput { field: String, reason: String },
}

/// Failure reported by a [`crate::loader::TelemetrySource`] while fetching one lap.
///
/// Cloneable so it can live in the lap status table and still be handed to the
/// completion callback.
#[derive(Debug, Clone, PartialEq, Snafu)]
pub enum SourceError {
    #[snafu(display("Telemetry for lap {lap_id} not found"))]
    NotFound { lap_id: String },
    #[snafu(display("Telemetry fetch for lap {lap_id} failed: {description}"))]
    FetchFailed { lap_id: String, description: String },
}
