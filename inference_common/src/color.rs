//! Color types shared by the analyzer, the summary and the database.

use std::fmt;

/// 8-bit RGB triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Rounds a floating point color to the nearest integer triple, clamped to `[0, 255]`.
    pub fn from_f64(channels: [f64; 3]) -> Self {
        let to_u8 = |c: f64| c.round().clamp(0.0, 255.0) as u8;
        Self::new(to_u8(channels[0]), to_u8(channels[1]), to_u8(channels[2]))
    }

    /// Euclidean distance in RGB space.
    pub fn distance(&self, other: &Rgb) -> f64 {
        let dr = self.r as f64 - other.r as f64;
        let dg = self.g as f64 - other.g as f64;
        let db = self.b as f64 - other.b as f64;
        (dr * dr + dg * dg + db * db).sqrt()
    }

    /// Coarse human-readable name, used for display only.
    pub fn name(&self) -> &'static str {
        let (r, g, b) = (self.r as f32, self.g as f32, self.b as f32);

        let brightness = (r + g + b) / 3.0;
        if brightness < 50.0 {
            return "black";
        }
        if brightness > 200.0 {
            return "white";
        }

        let max_val = r.max(g).max(b);
        let min_val = r.min(g).min(b);
        if max_val - min_val < 30.0 {
            return if brightness < 128.0 { "gray" } else { "light_gray" };
        }

        if r == max_val {
            if g > b * 1.5 {
                "orange"
            } else if g > b {
                "yellow"
            } else {
                "red"
            }
        } else if g == max_val {
            if r > b * 1.2 {
                "yellow"
            } else {
                "green"
            }
        } else if r > g * 1.2 {
            "purple"
        } else {
            "blue"
        }
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::new(r, g, b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

/// Dominant color of one detected object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorObservation {
    pub class_label: String,
    pub dominant_color: Rgb,
}
