use std::path::Path;

use log::info;

use crate::{LapSyncError, playback::AlignedFrame};

/// Writes aligned frames as JSON lines, one frame per line.
pub fn write_frames(file: &Path, frames: &[AlignedFrame]) -> Result<(), LapSyncError> {
    serde_jsonlines::write_json_lines(file, frames)
        .map_err(|e| LapSyncError::WriterError { source: e })?;
    info!("Wrote {} frames to {:?}", frames.len(), file);
    Ok(())
}

/// Reads frames previously written by [`write_frames`].
pub fn read_frames(file: &Path) -> Result<Vec<AlignedFrame>, LapSyncError> {
    serde_jsonlines::json_lines(file)
        .map_err(|e| LapSyncError::TelemetryLoaderError { source: e })?
        .collect::<Result<Vec<AlignedFrame>, std::io::Error>>()
        .map_err(|e| LapSyncError::TelemetryLoaderError { source: e })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::LapFrameValue;
    use crate::telemetry::TelemetrySample;

    #[test]
    fn test_frames_written_one_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frames.jsonl");
        let frames = (0..3)
            .map(|i| AlignedFrame {
                reference_index: i,
                lap_dist_pct: i as f64 * 10.,
                laps: vec![LapFrameValue {
                    lap_id: "ref".to_string(),
                    sample_index: i,
                    sample: TelemetrySample {
                        lap_dist_pct: i as f64 * 10.,
                        gear: 3,
                        ..TelemetrySample::default()
                    },
                }],
            })
            .collect::<Vec<_>>();

        write_frames(&path, &frames).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 3);
        assert_eq!(read_frames(&path).unwrap(), frames);
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("frames.jsonl");

        match write_frames(&path, &[]) {
            Err(LapSyncError::WriterError { .. }) => {}
            other => panic!("Expected WriterError, got {:?}", other),
        }
    }
}
