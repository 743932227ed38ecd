use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::LapSyncError;

const CONFIG_DIR_NAME: &str = "lapsync";
const CONFIG_FILE_NAME: &str = "config.json";

pub const TICK_INTERVAL_MS: u64 = 16;
pub const MIN_TICK_INTERVAL_MS: u64 = 5;
pub const MAX_TICK_INTERVAL_MS: u64 = 30;
pub const NOMINAL_SAMPLES_PER_TICK: f64 = 1.;
pub const STAGGER_DELAY_MS: u64 = 150;
pub const MIN_VISIBLE_POINTS: usize = 50;

/// Tunables of the synchronization engine, persisted as JSON.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub tick_interval_ms: u64,
    /// Advancement per tick at speed 1 when the lap duration is unknown
    pub nominal_samples_per_tick: f64,
    pub stagger_delay_ms: u64,
    pub min_visible_points: usize,
    pub default_speed: f64,
    pub default_zoom: u8,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: TICK_INTERVAL_MS,
            nominal_samples_per_tick: NOMINAL_SAMPLES_PER_TICK,
            stagger_delay_ms: STAGGER_DELAY_MS,
            min_visible_points: MIN_VISIBLE_POINTS,
            default_speed: 1.,
            default_zoom: 1,
        }
    }
}

impl EngineConfig {
    fn default_path() -> Option<PathBuf> {
        Some(
            dirs::config_dir()?
                .join(CONFIG_DIR_NAME)
                .join(CONFIG_FILE_NAME),
        )
    }

    /// Reads the user's config file, `None` when there is none or it is unreadable.
    pub fn from_local_file() -> Option<Self> {
        let config_path = Self::default_path()?;
        if !config_path.exists() {
            return None;
        }
        Self::from_path(&config_path)
            .map_err(|e| warn!("Ignoring config file {:?}: {}", config_path, e))
            .ok()
    }

    pub fn from_path(path: &Path) -> Result<Self, LapSyncError> {
        let file =
            std::fs::File::open(path).map_err(|e| LapSyncError::ConfigIOError { source: e })?;
        let config: Self = serde_json::from_reader(file)
            .map_err(|e| LapSyncError::ConfigSerializeError { source: e })?;
        Ok(config.sanitized())
    }

    pub fn save(&self) -> Result<(), LapSyncError> {
        let config_path = Self::default_path().ok_or(LapSyncError::NoConfigDir)?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), LapSyncError> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| LapSyncError::ConfigIOError { source: e })?;
            }
        }

        let file =
            std::fs::File::create(path).map_err(|e| LapSyncError::ConfigIOError { source: e })?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|e| LapSyncError::ConfigSerializeError { source: e })
    }

    /// Clamps every value into the range the engine supports.
    pub fn sanitized(self) -> Self {
        let nominal_samples_per_tick =
            if self.nominal_samples_per_tick.is_finite() && self.nominal_samples_per_tick > 0. {
                self.nominal_samples_per_tick
            } else {
                NOMINAL_SAMPLES_PER_TICK
            };
        let default_speed = if self.default_speed.is_finite() {
            self.default_speed.clamp(-5., 5.)
        } else {
            1.
        };

        Self {
            tick_interval_ms: self
                .tick_interval_ms
                .clamp(MIN_TICK_INTERVAL_MS, MAX_TICK_INTERVAL_MS),
            nominal_samples_per_tick,
            stagger_delay_ms: self.stagger_delay_ms,
            min_visible_points: self.min_visible_points.max(1),
            default_speed,
            default_zoom: self.default_zoom.clamp(1, 5),
        }
    }
}
