pub mod colors;
pub mod csv_parser;
pub mod distance_index;
pub mod normalizer;

use serde::{Deserialize, Serialize};

pub use colors::{ChannelColors, Rgb, lane_colors};
pub use csv_parser::{REQUIRED_COLUMNS, parse_telemetry_csv};
pub use distance_index::LapDistanceIndex;
pub use normalizer::{NormalizedSeries, normalize_series};

use crate::track_map::{TrackMap, project_track_map};

/// One measurement instant of a lap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    /// Percentage distance around lap, 0 to 100
    pub lap_dist_pct: f64,
    /// Latitude in decimal degrees
    pub lat: f64,
    /// Longitude in decimal degrees
    pub lon: f64,
    /// Brake use. 0=brake released to 1=max pedal force
    pub brake: f64,
    /// Throttle use. 0=off throttle to 1=full throttle
    pub throttle: f64,
    /// Engine RPM
    pub rpm: f64,
    /// Steering wheel angle
    pub steering_wheel_angle: f64,
    /// Speed
    pub speed: f64,
    /// Current gear
    pub gear: i32,
}

/// A telemetry signal that gets its own normalized series.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    Brake,
    Throttle,
    Rpm,
    SteeringWheelAngle,
    Speed,
    Gear,
}

impl Channel {
    pub const ALL: [Channel; 6] = [
        Channel::Brake,
        Channel::Throttle,
        Channel::Rpm,
        Channel::SteeringWheelAngle,
        Channel::Speed,
        Channel::Gear,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Channel::Brake => "brake",
            Channel::Throttle => "throttle",
            Channel::Rpm => "rpm",
            Channel::SteeringWheelAngle => "steeringWheelAngle",
            Channel::Speed => "speed",
            Channel::Gear => "gear",
        }
    }

    pub fn value(&self, sample: &TelemetrySample) -> f64 {
        match self {
            Channel::Brake => sample.brake,
            Channel::Throttle => sample.throttle,
            Channel::Rpm => sample.rpm,
            Channel::SteeringWheelAngle => sample.steering_wheel_angle,
            Channel::Speed => sample.speed,
            Channel::Gear => sample.gear as f64,
        }
    }
}

/// Everything derived from one lap's telemetry.
///
/// Built once by [`process_lap`] when the lap finishes loading and never mutated
/// afterwards. A new load replaces the whole value.
#[derive(Clone, Debug)]
pub struct ProcessedLapData {
    samples: Vec<TelemetrySample>,
    series: Vec<NormalizedSeries>,
    distance_index: LapDistanceIndex,
    track_map: Option<TrackMap>,
}

impl ProcessedLapData {
    /// Builds the processed lap from samples already sorted by lap distance.
    ///
    /// Returns `None` when there are no samples, which callers surface as
    /// "no data for this lap".
    pub fn from_samples(samples: Vec<TelemetrySample>, lane_index: usize) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let series = normalize_series(&samples, &Channel::ALL, &lane_colors(lane_index));
        let distance_index = LapDistanceIndex::from_samples(&samples);
        let track_map = project_track_map(&samples);
        Some(Self {
            samples,
            series,
            distance_index,
            track_map,
        })
    }

    pub fn samples(&self) -> &[TelemetrySample] {
        &self.samples
    }

    pub fn total_points(&self) -> usize {
        self.samples.len()
    }

    pub fn all_series(&self) -> &[NormalizedSeries] {
        &self.series
    }

    pub fn series(&self, channel: Channel) -> Option<&NormalizedSeries> {
        self.series.iter().find(|s| s.channel == channel)
    }

    /// Normalized value of `channel` at `index`, if both exist.
    pub fn normalized_value(&self, channel: Channel, index: usize) -> Option<f64> {
        self.series(channel)?.normalized.get(index).copied()
    }

    /// The `lapDistPct` of every sample, ascending.
    pub fn lap_dist_to_index(&self) -> &[f64] {
        self.distance_index.as_slice()
    }

    /// Index of the sample whose lap distance is closest to `lap_dist_pct`.
    pub fn closest_index(&self, lap_dist_pct: f64) -> Option<usize> {
        self.distance_index.closest(lap_dist_pct)
    }

    pub fn track_map(&self) -> Option<&TrackMap> {
        self.track_map.as_ref()
    }
}

/// Runs the whole per-lap pipeline: parse, normalize, index, project.
pub fn process_lap(raw: &str, lane_index: usize) -> Option<ProcessedLapData> {
    ProcessedLapData::from_samples(parse_telemetry_csv(raw), lane_index)
}
