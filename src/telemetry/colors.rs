// Per-lap colour scheme so overlaid laps stay distinguishable

use palette::{Hsl, IntoColor, Srgb};
use serde::{Deserialize, Serialize};

use super::Channel;

/// Hue shift applied per lane, in degrees.
const LANE_HUE_SHIFT: f32 = 24.;
/// Saturation lost per lane, floored at MIN_SATURATION.
const LANE_SATURATION_STEP: f32 = 0.12;
const MIN_SATURATION: f32 = 0.35;
const BASE_SATURATION: f32 = 0.85;
const BASE_LIGHTNESS: f32 = 0.55;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Converts hue (degrees), saturation and lightness (0-1) to sRGB.
    pub fn from_hsl(hue: f32, saturation: f32, lightness: f32) -> Self {
        let hsl: Hsl = Hsl::new(hue, saturation.clamp(0., 1.), lightness.clamp(0., 1.));
        let rgb: Srgb = hsl.into_color();
        let rgb: Srgb<u8> = rgb.into_format();
        Self::new(rgb.red, rgb.green, rgb.blue)
    }
}

fn base_hue(channel: Channel) -> f32 {
    match channel {
        Channel::Brake => 0.,
        Channel::Throttle => 120.,
        Channel::Rpm => 30.,
        Channel::SteeringWheelAngle => 270.,
        Channel::Speed => 210.,
        Channel::Gear => 55.,
    }
}

/// Colour assigned to every channel of one lap.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelColors {
    colors: Vec<(Channel, Rgb)>,
}

impl ChannelColors {
    pub fn color(&self, channel: Channel) -> Rgb {
        self.colors
            .iter()
            .find(|(c, _)| *c == channel)
            .map(|(_, rgb)| *rgb)
            .unwrap_or(Rgb::new(255, 255, 255))
    }
}

/// Colours for the lap drawn in lane `lane_index`.
///
/// Lane 0 keeps the base channel hues; each following lane rotates the hue and
/// loses some saturation. Pure: the same lane always gets the same colours.
pub fn lane_colors(lane_index: usize) -> ChannelColors {
    let lane = (lane_index % 15) as f32;
    let saturation = (BASE_SATURATION - lane * LANE_SATURATION_STEP).max(MIN_SATURATION);
    let lightness = if lane_index % 2 == 0 {
        BASE_LIGHTNESS
    } else {
        BASE_LIGHTNESS + 0.1
    };

    ChannelColors {
        colors: Channel::ALL
            .iter()
            .map(|channel| {
                let hue = base_hue(*channel) + lane * LANE_HUE_SHIFT;
                (*channel, Rgb::from_hsl(hue, saturation, lightness))
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hsl_primaries() {
        assert_eq!(Rgb::from_hsl(0., 1., 0.5), Rgb::new(255, 0, 0));
        assert_eq!(Rgb::from_hsl(120., 1., 0.5), Rgb::new(0, 255, 0));
        assert_eq!(Rgb::from_hsl(240., 1., 0.5), Rgb::new(0, 0, 255));
        assert_eq!(Rgb::from_hsl(360., 1., 0.5), Rgb::new(255, 0, 0));
        assert_eq!(Rgb::from_hsl(0., 0., 1.), Rgb::new(255, 255, 255));
    }

    #[test]
    fn test_hex_formatting() {
        assert_eq!(Rgb::new(242, 97, 63).to_hex(), "#f2613f");
    }

    #[test]
    fn test_lane_colors_are_deterministic() {
        assert_eq!(lane_colors(3), lane_colors(3));
    }

    #[test]
    fn test_lanes_differ() {
        let first = lane_colors(0);
        let second = lane_colors(1);
        for channel in Channel::ALL {
            assert_ne!(first.color(channel), second.color(channel));
        }
    }
}
