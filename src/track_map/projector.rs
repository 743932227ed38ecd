// Projects lap GPS samples into unit-square map coordinates

use log::debug;

use super::types::{BoundingBox, MapCoordinate, TrackMap};
use crate::telemetry::TelemetrySample;

/// Rescales every sample's latitude/longitude against the lap's own bounding box.
///
/// Returns `None` for a lap without samples. A lap with constant latitude or
/// longitude is still projected; the flat axis sits at 0.5.
pub fn project_track_map(samples: &[TelemetrySample]) -> Option<TrackMap> {
    if samples.is_empty() {
        return None;
    }

    let mut bounds = BoundingBox::new();
    for sample in samples {
        bounds.update(sample.lat, sample.lon);
    }

    if bounds.lat_range() == 0. || bounds.lon_range() == 0. {
        debug!(
            "Degenerate GPS trace: lat range {}, lon range {}",
            bounds.lat_range(),
            bounds.lon_range()
        );
    }

    let coordinates = samples
        .iter()
        .map(|sample| {
            let (x, y) = bounds.project(sample.lat, sample.lon);
            MapCoordinate {
                lat: sample.lat,
                lon: sample.lon,
                x,
                y,
                lap_dist_pct: sample.lap_dist_pct,
            }
        })
        .collect();

    Some(TrackMap {
        coordinates,
        bounds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn gps_sample(lap_dist_pct: f64, lat: f64, lon: f64) -> TelemetrySample {
        TelemetrySample {
            lap_dist_pct,
            lat,
            lon,
            ..TelemetrySample::default()
        }
    }

    #[test]
    fn test_empty_lap_has_no_map() {
        assert!(project_track_map(&[]).is_none());
    }

    #[test]
    fn test_projection_corners() {
        let samples = [
            gps_sample(0., 50.0, 5.0),
            gps_sample(50., 51.0, 6.0),
            gps_sample(100., 50.5, 5.5),
        ];
        let map = project_track_map(&samples).unwrap();

        // southernmost, westernmost point ends bottom left
        assert_eq!((map.coordinates[0].x, map.coordinates[0].y), (0., 1.));
        // northernmost, easternmost point ends top right
        assert_eq!((map.coordinates[1].x, map.coordinates[1].y), (1., 0.));
        assert_eq!((map.coordinates[2].x, map.coordinates[2].y), (0.5, 0.5));
        assert_eq!(map.bounds.min_lat, 50.0);
        assert_eq!(map.bounds.max_lon, 6.0);
    }

    #[test]
    fn test_constant_latitude_collapses_to_midpoint() {
        let samples = [gps_sample(0., 50.0, 5.0), gps_sample(10., 50.0, 6.0)];
        let map = project_track_map(&samples).unwrap();

        assert!(map.coordinates.iter().all(|c| c.y == 0.5));
        assert_eq!(map.coordinates[0].x, 0.);
        assert_eq!(map.coordinates[1].x, 1.);
    }

    #[test]
    fn test_single_sample_sits_in_the_middle() {
        let map = project_track_map(&[gps_sample(0., 50.0, 5.0)]).unwrap();
        assert_eq!((map.coordinates[0].x, map.coordinates[0].y), (0.5, 0.5));
    }

    // **Projected coordinates stay in the unit square**
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_projection_in_unit_square(
            points in prop::collection::vec((-90.0f64..90.0, -180.0f64..180.0), 1..100)
        ) {
            let samples = points
                .iter()
                .enumerate()
                .map(|(i, (lat, lon))| gps_sample(i as f64, *lat, *lon))
                .collect::<Vec<_>>();
            let map = project_track_map(&samples).unwrap();

            prop_assert_eq!(map.coordinates.len(), samples.len());
            for coordinate in &map.coordinates {
                prop_assert!((0.0..=1.0).contains(&coordinate.x));
                prop_assert!((0.0..=1.0).contains(&coordinate.y));
            }
        }
    }
}
