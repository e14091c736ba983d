//! Colors and paints shared by the beam templates and every drawing surface.

use kurbo::Point;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a color string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorParseError {
    #[error("Color must start with '#': {0}")]
    MissingHash(String),
    #[error("Unsupported color length in {0} (expected #rgb or #rrggbb)")]
    BadLength(String),
    #[error("Invalid hex digit in {0}")]
    BadDigit(String),
}

/// Opaque RGB color, serialized as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build from a packed `0xRRGGBB` value.
    pub const fn from_u32(packed: u32) -> Self {
        Self {
            r: ((packed >> 16) & 0xff) as u8,
            g: ((packed >> 8) & 0xff) as u8,
            b: (packed & 0xff) as u8,
        }
    }

    /// Attach an alpha value (clamped to [0, 1]).
    pub fn with_alpha(self, alpha: f32) -> Rgba {
        Rgba {
            r: self.r,
            g: self.g,
            b: self.b,
            a: alpha.clamp(0.0, 1.0),
        }
    }

    pub fn opaque(self) -> Rgba {
        self.with_alpha(1.0)
    }

    /// Linear blend toward `other`; `t = 0` keeps `self`, `t = 1` yields `other`.
    pub fn mix(self, other: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb::new(lerp(self.r, other.r), lerp(self.g, other.g), lerp(self.b, other.b))
    }

    /// Format as `#rrggbb`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Rgb {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let hex = trimmed
            .strip_prefix('#')
            .ok_or_else(|| ColorParseError::MissingHash(s.to_string()))?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ColorParseError::BadDigit(s.to_string()));
        }
        let digit = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16)
                .map_err(|_| ColorParseError::BadDigit(s.to_string()))
        };
        match hex.len() {
            // #rgb -> #rrggbb
            3 => Ok(Rgb::new(digit(0..1)? * 17, digit(1..2)? * 17, digit(2..3)? * 17)),
            6 => Ok(Rgb::new(digit(0..2)?, digit(2..4)?, digit(4..6)?)),
            _ => Err(ColorParseError::BadLength(s.to_string())),
        }
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// RGB color with a straight (non-premultiplied) alpha in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba {
        r: 0,
        g: 0,
        b: 0,
        a: 0.0,
    };

    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Multiply the alpha channel, keeping the result in [0, 1].
    pub fn fade(self, factor: f32) -> Self {
        Self {
            a: (self.a * factor).clamp(0.0, 1.0),
            ..self
        }
    }

    /// Alpha as an 8-bit channel value.
    pub fn alpha_u8(self) -> u8 {
        (self.a.clamp(0.0, 1.0) * 255.0).round() as u8
    }
}

/// A color stop in a gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    /// Position along the gradient in [0, 1].
    pub offset: f32,
    pub color: Rgba,
}

impl GradientStop {
    pub const fn new(offset: f32, color: Rgba) -> Self {
        Self { offset, color }
    }
}

/// How a filled or stroked path is colored.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(Rgba),
    /// Linear gradient between two points in the path's local space.
    Linear {
        start: Point,
        end: Point,
        stops: Vec<GradientStop>,
    },
    /// Circular gradient from `center` out to `radius`.
    Radial {
        center: Point,
        radius: f64,
        stops: Vec<GradientStop>,
    },
}

impl Paint {
    /// Return a copy with every color's alpha multiplied by `factor`.
    pub fn faded(&self, factor: f32) -> Paint {
        if (factor - 1.0).abs() <= f32::EPSILON {
            return self.clone();
        }
        let fade_stops = |stops: &[GradientStop]| {
            stops
                .iter()
                .map(|s| GradientStop::new(s.offset, s.color.fade(factor)))
                .collect()
        };
        match self {
            Paint::Solid(color) => Paint::Solid(color.fade(factor)),
            Paint::Linear { start, end, stops } => Paint::Linear {
                start: *start,
                end: *end,
                stops: fade_stops(stops),
            },
            Paint::Radial {
                center,
                radius,
                stops,
            } => Paint::Radial {
                center: *center,
                radius: *radius,
                stops: fade_stops(stops),
            },
        }
    }
}

impl Paint {
    /// Whether a gradient has no extent (zero length or radius) or no stops.
    pub fn is_degenerate(&self) -> bool {
        match self {
            Paint::Solid(_) => false,
            Paint::Linear { start, end, stops } => stops.is_empty() || start == end,
            Paint::Radial { radius, stops, .. } => {
                stops.is_empty() || radius.is_nan() || *radius <= 0.0
            }
        }
    }

    /// Replace a degenerate gradient by its last stop's color.
    pub fn or_solid_fallback(self) -> Paint {
        if !self.is_degenerate() {
            return self;
        }
        match self {
            Paint::Linear { stops, .. } | Paint::Radial { stops, .. } => {
                Paint::Solid(stops.last().map(|s| s.color).unwrap_or(Rgba::TRANSPARENT))
            }
            solid => solid,
        }
    }
}

impl From<Rgba> for Paint {
    fn from(color: Rgba) -> Self {
        Paint::Solid(color)
    }
}

impl From<Rgb> for Paint {
    fn from(color: Rgb) -> Self {
        Paint::Solid(color.opaque())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_long_hex() {
        let c: Rgb = "#facc15".parse().unwrap();
        assert_eq!(c, Rgb::new(0xfa, 0xcc, 0x15));
        assert_eq!(c.to_hex(), "#facc15");
    }

    #[test]
    fn test_parse_short_hex() {
        let c: Rgb = "#fff".parse().unwrap();
        assert_eq!(c, Rgb::WHITE);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!("facc15".parse::<Rgb>(), Err(ColorParseError::MissingHash(_))));
        assert!(matches!("#facc1".parse::<Rgb>(), Err(ColorParseError::BadLength(_))));
        assert!(matches!("#zzzzzz".parse::<Rgb>(), Err(ColorParseError::BadDigit(_))));
    }

    #[test]
    fn test_serde_as_hex_string() {
        let json = serde_json::to_string(&Rgb::from_u32(0x38bdf8)).unwrap();
        assert_eq!(json, "\"#38bdf8\"");
        let back: Rgb = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Rgb::from_u32(0x38bdf8));
    }

    #[test]
    fn test_degenerate_gradient_falls_back_to_last_stop() {
        let stops = vec![
            GradientStop::new(0.0, Rgb::WHITE.opaque()),
            GradientStop::new(1.0, Rgb::BLACK.with_alpha(0.0)),
        ];
        let flat = Paint::Linear {
            start: Point::new(1.0, 1.0),
            end: Point::new(1.0, 1.0),
            stops: stops.clone(),
        };
        assert!(flat.is_degenerate());
        assert_eq!(flat.or_solid_fallback(), Paint::Solid(Rgb::BLACK.with_alpha(0.0)));

        let pool = Paint::Radial {
            center: Point::ZERO,
            radius: 3.0,
            stops,
        };
        assert!(!pool.is_degenerate());
        assert_eq!(pool.clone().or_solid_fallback(), pool);
    }

    #[test]
    fn test_faded_paint_scales_every_stop() {
        let paint = Paint::Linear {
            start: Point::ZERO,
            end: Point::new(0.0, 10.0),
            stops: vec![
                GradientStop::new(0.0, Rgb::WHITE.with_alpha(1.0)),
                GradientStop::new(1.0, Rgb::WHITE.with_alpha(0.5)),
            ],
        };
        let Paint::Linear { stops, .. } = paint.faded(0.5) else {
            panic!("expected linear paint");
        };
        assert!((stops[0].color.a - 0.5).abs() < 1e-6);
        assert!((stops[1].color.a - 0.25).abs() < 1e-6);
    }
}
