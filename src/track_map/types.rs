// Core data structures for projected track maps

use serde::{Deserialize, Serialize};

use crate::telemetry::distance_index::closest_index_by;

/// One projected sample. `x` and `y` lie in [0, 1], `y` grows towards north.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct MapCoordinate {
    pub lat: f64,
    pub lon: f64,
    pub x: f64,
    pub y: f64,
    /// Lap distance percentage of the sample this point was projected from
    pub lap_dist_pct: f64,
}

/// Latitude/longitude bounds of a lap
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn new() -> Self {
        Self {
            min_lat: f64::INFINITY,
            max_lat: f64::NEG_INFINITY,
            min_lon: f64::INFINITY,
            max_lon: f64::NEG_INFINITY,
        }
    }

    pub fn update(&mut self, lat: f64, lon: f64) {
        self.min_lat = self.min_lat.min(lat);
        self.max_lat = self.max_lat.max(lat);
        self.min_lon = self.min_lon.min(lon);
        self.max_lon = self.max_lon.max(lon);
    }

    pub fn lat_range(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn lon_range(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Maps a position into the unit square. A flat axis collapses to 0.5.
    pub fn project(&self, lat: f64, lon: f64) -> (f64, f64) {
        let lon_range = self.lon_range();
        let lat_range = self.lat_range();
        let x = if lon_range == 0. {
            0.5
        } else {
            (lon - self.min_lon) / lon_range
        };
        // screen y grows downwards, north has to end up on top
        let y = if lat_range == 0. {
            0.5
        } else {
            1. - (lat - self.min_lat) / lat_range
        };
        (x, y)
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::new()
    }
}

/// Projected GPS trace of one lap
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TrackMap {
    pub coordinates: Vec<MapCoordinate>,
    pub bounds: BoundingBox,
}

impl TrackMap {
    /// Point of the trace closest to `lap_dist_pct`, used to place a lap's cursor.
    pub fn point_at(&self, lap_dist_pct: f64) -> Option<&MapCoordinate> {
        closest_index_by(&self.coordinates, |c| c.lap_dist_pct, lap_dist_pct)
            .and_then(|index| self.coordinates.get(index))
    }

    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }
}
