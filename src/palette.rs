//! Color Mapping Engine
//!
//! Pure functions from a normalized scalar in [0, 1] to an RGB triple in
//! [0, 1]^3. The palette set is closed; names from the outside world are
//! resolved once at the boundary and anything unrecognized becomes rainbow.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Linear RGB, each channel in [0, 1]
pub type Rgb = [f32; 3];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ColorScale {
    /// red -> yellow -> green -> cyan -> blue
    #[default]
    Rainbow,
    /// black -> red -> yellow -> white
    Heatmap,
    /// blue -> red
    BlueRed,
}

impl ColorScale {
    pub const ALL: [ColorScale; 3] = [ColorScale::Rainbow, ColorScale::Heatmap, ColorScale::BlueRed];

    pub fn name(self) -> &'static str {
        match self {
            ColorScale::Rainbow => "rainbow",
            ColorScale::Heatmap => "heatmap",
            ColorScale::BlueRed => "blueRed",
        }
    }

    /// Resolve a palette name, defaulting to rainbow
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "rainbow" => ColorScale::Rainbow,
            "heatmap" => ColorScale::Heatmap,
            "bluered" | "blue_red" | "blue-red" => ColorScale::BlueRed,
            other => {
                tracing::debug!("Unknown palette '{}', using rainbow", other);
                ColorScale::Rainbow
            }
        }
    }

    /// Map a normalized value to a color. Out-of-range input is clamped.
    pub fn map(self, v: f32) -> Rgb {
        let v = v.clamp(0.0, 1.0);
        match self {
            ColorScale::Rainbow => rainbow(v),
            ColorScale::Heatmap => heatmap(v),
            ColorScale::BlueRed => blue_red(v),
        }
    }
}

impl FromStr for ColorScale {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ColorScale::from_name(s))
    }
}

impl From<String> for ColorScale {
    fn from(s: String) -> Self {
        ColorScale::from_name(&s)
    }
}

impl From<ColorScale> for String {
    fn from(scale: ColorScale) -> Self {
        scale.name().to_string()
    }
}

impl fmt::Display for ColorScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Five-band sweep. `a = 4v` picks the band, the fraction ramps one channel.
///
/// Band order runs red at low values through yellow, green and cyan to blue.
pub fn rainbow(v: f32) -> Rgb {
    let a = v * 4.0;
    let band = a.floor().clamp(0.0, 4.0);
    let y = 255.0 * (a - band);

    let (r, g, b) = match band as u8 {
        0 => (255.0, y, 0.0),
        1 => (255.0 - y, 255.0, 0.0),
        2 => (0.0, 255.0, y),
        3 => (0.0, 255.0 - y, 255.0),
        _ => (0.0, 0.0, 255.0),
    };

    [r / 255.0, g / 255.0, b / 255.0]
}

pub fn heatmap(v: f32) -> Rgb {
    const THIRD: f32 = 1.0 / 3.0;
    const TWO_THIRDS: f32 = 2.0 / 3.0;

    let rgb = if v < THIRD {
        [3.0 * v, 0.0, 0.0]
    } else if v < TWO_THIRDS {
        [1.0, 3.0 * (v - THIRD), 0.0]
    } else {
        [1.0, 1.0, 3.0 * (v - TWO_THIRDS)]
    };

    // float error at the band edges can overshoot by an ulp
    rgb.map(|c| c.clamp(0.0, 1.0))
}

pub fn blue_red(v: f32) -> Rgb {
    [v, 0.0, 1.0 - v]
}

/// Horizontal color bar, low values on the left
pub fn legend(scale: ColorScale, width: u32, height: u32) -> image::RgbImage {
    let span = width.saturating_sub(1).max(1) as f32;
    image::RgbImage::from_fn(width, height, |x, _| {
        let [r, g, b] = scale.map(x as f32 / span);
        image::Rgb([to_byte(r), to_byte(g), to_byte(b)])
    })
}

fn to_byte(c: f32) -> u8 {
    (c * 255.0).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Rgb, b: Rgb) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-5)
    }

    #[test]
    fn test_rainbow_endpoints() {
        assert!(close(rainbow(0.0), [1.0, 0.0, 0.0]));
        assert!(close(rainbow(1.0), [0.0, 0.0, 1.0]));
    }

    #[test]
    fn test_rainbow_band_boundaries() {
        assert!(close(rainbow(0.25), [1.0, 1.0, 0.0])); // yellow
        assert!(close(rainbow(0.5), [0.0, 1.0, 0.0])); // green
        assert!(close(rainbow(0.75), [0.0, 1.0, 1.0])); // cyan
        assert!(close(rainbow(0.125), [1.0, 0.5, 0.0]));
    }

    #[test]
    fn test_heatmap_endpoints() {
        assert!(close(heatmap(0.0), [0.0, 0.0, 0.0]));
        assert!(close(heatmap(1.0), [1.0, 1.0, 1.0]));
        assert!(close(heatmap(0.5), [1.0, 0.5, 0.0]));
    }

    #[test]
    fn test_blue_red_endpoints() {
        assert_eq!(blue_red(0.0), [0.0, 0.0, 1.0]);
        assert_eq!(blue_red(1.0), [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_all_palettes_stay_in_unit_cube() {
        for scale in ColorScale::ALL {
            for i in 0..=1000 {
                let rgb = scale.map(i as f32 / 1000.0);
                assert!(rgb.iter().all(|c| (0.0..=1.0).contains(c)), "{scale} at {i}");
            }
        }
    }

    #[test]
    fn test_map_clamps_input() {
        assert_eq!(ColorScale::BlueRed.map(-3.0), [0.0, 0.0, 1.0]);
        assert_eq!(ColorScale::BlueRed.map(7.0), [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_unknown_name_is_rainbow() {
        assert_eq!(ColorScale::from_name("viridis"), ColorScale::Rainbow);
        assert_eq!(ColorScale::from_name(""), ColorScale::Rainbow);
        assert_eq!("blueRed".parse::<ColorScale>().unwrap(), ColorScale::BlueRed);
        assert_eq!(ColorScale::from_name("HEATMAP"), ColorScale::Heatmap);
    }

    #[test]
    fn test_serde_uses_names() {
        let json = serde_json::to_string(&ColorScale::BlueRed).unwrap();
        assert_eq!(json, "\"blueRed\"");

        let scale: ColorScale = serde_json::from_str("\"plasma\"").unwrap();
        assert_eq!(scale, ColorScale::Rainbow);
    }

    #[test]
    fn test_legend_ends() {
        let img = legend(ColorScale::BlueRed, 16, 4);
        assert_eq!(img.dimensions(), (16, 4));
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 255]);
        assert_eq!(img.get_pixel(15, 3).0, [255, 0, 0]);
    }
}
