use itertools::{Itertools, MinMaxResult};
use serde::Serialize;

use super::{Channel, ChannelColors, Rgb, TelemetrySample};

/// One channel of one lap scaled to [0, 1], index-aligned with the lap samples.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NormalizedSeries {
    pub channel: Channel,
    pub color: Rgb,
    pub min_val: f64,
    pub max_val: f64,
    pub range: f64,
    pub normalized: Vec<f64>,
}

impl NormalizedSeries {
    pub fn key(&self) -> &'static str {
        self.channel.key()
    }
}

/// Min-max scales a single channel. A constant channel collapses to all zeros.
pub fn normalize_channel(
    samples: &[TelemetrySample],
    channel: Channel,
    color: Rgb,
) -> NormalizedSeries {
    let (min_val, max_val) = match samples
        .iter()
        .map(|sample| channel.value(sample))
        .minmax_by(|a, b| a.total_cmp(b))
    {
        MinMaxResult::NoElements => (0., 0.),
        MinMaxResult::OneElement(value) => (value, value),
        MinMaxResult::MinMax(min, max) => (min, max),
    };
    let range = max_val - min_val;

    let normalized = samples
        .iter()
        .map(|sample| {
            if range == 0. {
                0.
            } else {
                ((channel.value(sample) - min_val) / range).clamp(0., 1.)
            }
        })
        .collect();

    NormalizedSeries {
        channel,
        color,
        min_val,
        max_val,
        range,
        normalized,
    }
}

/// Normalizes every requested channel independently.
pub fn normalize_series(
    samples: &[TelemetrySample],
    channels: &[Channel],
    colors: &ChannelColors,
) -> Vec<NormalizedSeries> {
    channels
        .iter()
        .map(|channel| normalize_channel(samples, *channel, colors.color(*channel)))
        .collect()
}
