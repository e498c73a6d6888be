use serde::{Serialize, Serializer};
use std::fmt;

use similarity::{LabelUniverse, SimilarityMatrix};

use crate::rank::affinity_of;

/// Hue of the teal family used for affinity chips.
pub const TEAL_HUE: f64 = 162.0;
const TEAL_SATURATION: f64 = 60.0;
/// Lightness at affinity 0 (near-white).
const MAX_LIGHTNESS: f64 = 90.0;
/// Lightness drop across the full affinity range; affinity 1 lands on 45%.
const LIGHTNESS_SPAN: f64 = 45.0;

pub const TEAL: Rgb = Rgb::new(0x2a, 0x9d, 0x8f);
pub const LIGHT_GRAY: Rgb = Rgb::new(0xee, 0xee, 0xee);
pub const WHITE: Rgb = Rgb::new(0xff, 0xff, 0xff);
pub const DARK_GRAY: Rgb = Rgb::new(0x33, 0x33, 0x33);
pub const NEUTRAL_BACKGROUND: Rgb = Rgb::new(0xdd, 0xdd, 0xdd);
pub const NEUTRAL_FOREGROUND: Rgb = Rgb::new(0x44, 0x44, 0x44);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Per-channel linear blend from `self` (t = 0) to `target` (t = 1),
    /// rounded to the nearest integer.
    pub fn lerp(self, target: Rgb, t: f64) -> Rgb {
        let channel = |from: u8, to: u8| {
            let from = f64::from(from);
            (from + (f64::from(to) - from) * t).round().clamp(0.0, 255.0) as u8
        };
        Rgb::new(
            channel(self.r, target.r),
            channel(self.g, target.g),
            channel(self.b, target.b),
        )
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({},{},{})", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub hue: f64,
    pub saturation: f64,
    pub lightness: f64,
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hsl({}, {}%, {}%)",
            self.hue, self.saturation, self.lightness
        )
    }
}

/// A CSS color value. Serializes as its CSS text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Color {
    Rgb(Rgb),
    Hsl(Hsl),
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Rgb(rgb) => write!(f, "{}", rgb.to_hex()),
            Color::Hsl(hsl) => write!(f, "{hsl}"),
        }
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<Rgb> for Color {
    fn from(rgb: Rgb) -> Self {
        Color::Rgb(rgb)
    }
}

/// Background/foreground pair for an interest chip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColorPair {
    pub background: Color,
    pub foreground: Color,
}

/// Pair used when no affinity is known.
pub fn neutral_color_pair() -> ColorPair {
    ColorPair {
        background: NEUTRAL_BACKGROUND.into(),
        foreground: NEUTRAL_FOREGROUND.into(),
    }
}

/// Teal chip whose lightness falls from 90% (score 0) to 45% (score 1).
/// Text flips to white once the score passes 0.5.
pub fn affinity_color(score: f64) -> ColorPair {
    let score = if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) };
    let lightness = MAX_LIGHTNESS - score * LIGHTNESS_SPAN;
    let foreground = if score > 0.5 { WHITE } else { DARK_GRAY };
    ColorPair {
        background: Color::Hsl(Hsl {
            hue: TEAL_HUE,
            saturation: TEAL_SATURATION,
            lightness,
        }),
        foreground: foreground.into(),
    }
}

/// Chip colors for `label`, or the neutral pair when the label is outside the
/// universe or no matrix is available.
pub fn interest_color(
    label: &str,
    universe: &LabelUniverse,
    matrix: &SimilarityMatrix,
) -> ColorPair {
    match affinity_of(label, universe, matrix) {
        Some(score) => affinity_color(score),
        None => neutral_color_pair(),
    }
}

/// Heatmap cell color: light gray at 0, teal at 1, linear in between.
pub fn heatmap_color(value: f64) -> Rgb {
    if value.is_nan() || value <= 0.0 {
        return LIGHT_GRAY;
    }
    if value >= 1.0 {
        return TEAL;
    }
    LIGHT_GRAY.lerp(TEAL, value)
}
