use std::{collections::HashMap, io, path::PathBuf};

use crate::errors::SourceError;

use super::LapMetadata;

/// Supplies the raw telemetry text of a lap.
///
/// The engine only consumes the resolved result: text on success, a
/// [`SourceError`] otherwise. Retries and transport belong to the implementor.
#[allow(async_fn_in_trait)]
pub trait TelemetrySource {
    async fn fetch_telemetry(&self, lap: &LapMetadata) -> Result<String, SourceError>;
}

/// Reads each lap's telemetry from a CSV file on disk without blocking the
/// runtime thread.
#[derive(Debug, Default, Clone)]
pub struct FileTelemetrySource {
    files: HashMap<String, PathBuf>,
}

impl FileTelemetrySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, lap_id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.files.insert(lap_id.into(), path.into());
        self
    }

    pub fn insert(&mut self, lap_id: impl Into<String>, path: impl Into<PathBuf>) {
        self.files.insert(lap_id.into(), path.into());
    }
}

impl TelemetrySource for FileTelemetrySource {
    async fn fetch_telemetry(&self, lap: &LapMetadata) -> Result<String, SourceError> {
        let Some(path) = self.files.get(&lap.id) else {
            return Err(SourceError::NotFound {
                lap_id: lap.id.clone(),
            });
        };
        tokio::fs::read_to_string(path).await.map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => SourceError::NotFound {
                lap_id: lap.id.clone(),
            },
            _ => SourceError::FetchFailed {
                lap_id: lap.id.clone(),
                description: e.to_string(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_reads_registered_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "LapDistPct,Lat").unwrap();
        file.flush().unwrap();

        let source = FileTelemetrySource::new().with_file("lap-1", file.path());
        let raw = source
            .fetch_telemetry(&LapMetadata::new("lap-1"))
            .await
            .unwrap();
        assert_eq!(raw, "LapDistPct,Lat");
    }

    #[tokio::test]
    async fn test_read_yields_to_the_runtime() {
        let mut file = NamedTempFile::new().unwrap();
        let row = "0.5,52.0,4.5,0.0,1.0,7000,0.0,60.0,5\n";
        for _ in 0..100_000 {
            file.write_all(row.as_bytes()).unwrap();
        }
        file.flush().unwrap();

        let source = FileTelemetrySource::new().with_file("lap-1", file.path());
        let lap = LapMetadata::new("lap-1");
        let mut fetch = std::pin::pin!(source.fetch_telemetry(&lap));

        // the first poll hands the read off instead of finishing it in place
        let first = std::future::poll_fn(|cx| std::task::Poll::Ready(fetch.as_mut().poll(cx))).await;
        assert!(first.is_pending());

        let raw = fetch.await.unwrap();
        assert_eq!(raw.len(), row.len() * 100_000);
    }

    #[tokio::test]
    async fn test_unknown_lap_is_not_found() {
        let source = FileTelemetrySource::new();
        let result = source.fetch_telemetry(&LapMetadata::new("missing")).await;
        assert_eq!(
            result,
            Err(SourceError::NotFound {
                lap_id: "missing".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let source =
            FileTelemetrySource::new().with_file("lap-1", dir.path().join("does-not-exist.csv"));
        let result = source.fetch_telemetry(&LapMetadata::new("lap-1")).await;
        assert!(matches!(result, Err(SourceError::NotFound { .. })));
    }
}
