use serde::{Deserialize, Serialize};

use super::window::VisibleWindow;
use crate::telemetry::{ProcessedLapData, TelemetrySample};

/// Value of one lap at a frame of the reference lap.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LapFrameValue {
    pub lap_id: String,
    /// Index into that lap's own samples
    pub sample_index: usize,
    pub sample: TelemetrySample,
}

/// One x-axis position: a reference sample plus every other lap resampled to it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlignedFrame {
    /// Index into the reference lap's samples
    pub reference_index: usize,
    pub lap_dist_pct: f64,
    /// Reference lap first, then the other laps in the order given
    pub laps: Vec<LapFrameValue>,
}

impl AlignedFrame {
    pub fn lap(&self, lap_id: &str) -> Option<&LapFrameValue> {
        self.laps.iter().find(|value| value.lap_id == lap_id)
    }
}

/// Resamples `others` onto the reference lap for every sample in `window`.
///
/// Other laps are matched by lap distance, not by index, so laps with different
/// sample counts line up at the same place on track.
pub fn align_window<'a>(
    reference_id: &str,
    reference: &ProcessedLapData,
    window: &VisibleWindow,
    others: impl IntoIterator<Item = (&'a str, &'a ProcessedLapData)>,
) -> Vec<AlignedFrame> {
    let others = others
        .into_iter()
        .filter(|(lap_id, _)| *lap_id != reference_id)
        .collect::<Vec<_>>();
    let data = window.data(reference.samples());

    data.iter()
        .enumerate()
        .map(|(offset, reference_sample)| {
            let reference_index = window.start_idx + offset;
            let mut laps = Vec::with_capacity(others.len() + 1);
            laps.push(LapFrameValue {
                lap_id: reference_id.to_string(),
                sample_index: reference_index,
                sample: *reference_sample,
            });
            for (lap_id, lap) in &others {
                if let Some(sample_index) = lap.closest_index(reference_sample.lap_dist_pct) {
                    laps.push(LapFrameValue {
                        lap_id: lap_id.to_string(),
                        sample_index,
                        sample: lap.samples()[sample_index],
                    });
                }
            }
            AlignedFrame {
                reference_index,
                lap_dist_pct: reference_sample.lap_dist_pct,
                laps,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MIN_VISIBLE_POINTS;
    use crate::playback::window::compute_window;

    fn uniform_lap(points: usize, speed: f64) -> ProcessedLapData {
        let samples = (0..points)
            .map(|i| TelemetrySample {
                lap_dist_pct: i as f64 * 100. / points as f64,
                speed,
                ..TelemetrySample::default()
            })
            .collect();
        ProcessedLapData::from_samples(samples, 0).unwrap()
    }

    #[test]
    fn test_frames_cover_the_window() {
        let reference = uniform_lap(1000, 50.);
        let window = compute_window(1000, 500., 3, MIN_VISIBLE_POINTS).unwrap();
        let frames = align_window(
            "ref",
            &reference,
            &window,
            Vec::<(&str, &ProcessedLapData)>::new(),
        );

        assert_eq!(frames.len(), 85);
        assert_eq!(frames[0].reference_index, 500);
        assert_eq!(frames[84].reference_index, 584);
        assert!(frames.iter().all(|f| f.laps.len() == 1));
    }

    #[test]
    fn test_other_lap_matched_by_distance() {
        let reference = uniform_lap(1000, 50.);
        let other = uniform_lap(800, 40.);
        let window = compute_window(1000, 420., 1, MIN_VISIBLE_POINTS).unwrap();
        let frames = align_window("ref", &reference, &window, [("other", &other)]);

        let frame = &frames[0];
        assert!((frame.lap_dist_pct - 42.).abs() < 1e-9);
        let matched = frame.lap("other").unwrap();
        // 42% of an 800 sample lap spaced at 0.125% is sample 336
        assert_eq!(matched.sample_index, 336);
        assert_eq!(matched.sample.speed, 40.);
        assert!((matched.sample.lap_dist_pct - 42.).abs() < 1e-9);
    }

    #[test]
    fn test_reference_is_not_resampled_against_itself() {
        let reference = uniform_lap(200, 50.);
        let window = compute_window(200, 0., 1, MIN_VISIBLE_POINTS).unwrap();
        let frames = align_window("ref", &reference, &window, [("ref", &reference)]);

        assert!(frames.iter().all(|f| f.laps.len() == 1));
    }
}
