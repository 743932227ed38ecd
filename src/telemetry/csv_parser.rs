use log::{debug, warn};

use super::TelemetrySample;

/// Header names every telemetry file must carry. Order in the file is free.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    "LapDistPct",
    "Lat",
    "Lon",
    "Brake",
    "Throttle",
    "RPM",
    "SteeringWheelAngle",
    "Speed",
    "Gear",
];

const FIELD_SEPARATOR: char = ',';

/// Position of each required column in the header row.
#[derive(Debug, Clone, Copy)]
struct ColumnLayout {
    lap_dist_pct: usize,
    lat: usize,
    lon: usize,
    brake: usize,
    throttle: usize,
    rpm: usize,
    steering_wheel_angle: usize,
    speed: usize,
    gear: usize,
}

impl ColumnLayout {
    fn from_header(header: &str) -> Option<Self> {
        let names = header
            .split(FIELD_SEPARATOR)
            .map(|name| name.trim())
            .collect::<Vec<_>>();
        let position = |column: &str| names.iter().position(|name| *name == column);

        let missing = REQUIRED_COLUMNS
            .iter()
            .filter(|column| position(column).is_none())
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            warn!("Telemetry header is missing columns {:?}", missing);
            return None;
        }

        Some(Self {
            lap_dist_pct: position("LapDistPct")?,
            lat: position("Lat")?,
            lon: position("Lon")?,
            brake: position("Brake")?,
            throttle: position("Throttle")?,
            rpm: position("RPM")?,
            steering_wheel_angle: position("SteeringWheelAngle")?,
            speed: position("Speed")?,
            gear: position("Gear")?,
        })
    }

    fn max_index(&self) -> usize {
        [
            self.lap_dist_pct,
            self.lat,
            self.lon,
            self.brake,
            self.throttle,
            self.rpm,
            self.steering_wheel_angle,
            self.speed,
            self.gear,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }

    fn parse_row(&self, fields: &[&str]) -> Option<TelemetrySample> {
        let number = |index: usize| -> Option<f64> {
            fields
                .get(index)?
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
        };

        Some(TelemetrySample {
            lap_dist_pct: (number(self.lap_dist_pct)? * 100.).clamp(0., 100.),
            lat: number(self.lat)?,
            lon: number(self.lon)?,
            brake: number(self.brake)?,
            throttle: number(self.throttle)?,
            rpm: number(self.rpm)?,
            steering_wheel_angle: number(self.steering_wheel_angle)?,
            speed: number(self.speed)?,
            gear: number(self.gear)? as i32,
        })
    }
}

/// Parses comma separated lap telemetry into samples sorted by lap distance.
///
/// The first line is the header. Rows that are too short or carry a value that is
/// not a finite number are dropped without affecting the others, so malformed input
/// degrades to a partial or empty result instead of an error. `LapDistPct` arrives
/// as a 0-1 fraction and is stored as a 0-100 percentage.
pub fn parse_telemetry_csv(raw: &str) -> Vec<TelemetrySample> {
    let mut lines = raw.lines();
    let Some(layout) = lines.next().and_then(ColumnLayout::from_header) else {
        return Vec::new();
    };
    let max_index = layout.max_index();

    let mut samples = Vec::new();
    let mut dropped = 0usize;
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let fields = line.split(FIELD_SEPARATOR).collect::<Vec<_>>();
        if fields.len() <= max_index {
            dropped += 1;
            continue;
        }
        match layout.parse_row(&fields) {
            Some(sample) => samples.push(sample),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        debug!(
            "Dropped {} malformed telemetry rows, kept {}",
            dropped,
            samples.len()
        );
    }

    // raw files are not guaranteed to be ordered by distance
    samples.sort_by(|a, b| a.lap_dist_pct.total_cmp(&b.lap_dist_pct));
    samples
}
