//! RGBA color values used by the settings model and the raster surface.

use crate::error::ColorParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A straight (non-premultiplied) RGBA color.
///
/// Serialized as `#RRGGBB` when fully opaque and `#RRGGBBAA` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel (255 = opaque).
    pub a: u8,
}

impl Color {
    /// Opaque black.
    pub const BLACK: Color = Color::rgb(0x00, 0x00, 0x00);
    /// Opaque white.
    pub const WHITE: Color = Color::rgb(0xFF, 0xFF, 0xFF);

    /// Create an opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xFF }
    }

    /// Create a color with an explicit alpha channel.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Alpha channel as a fraction in `[0, 1]`.
    pub fn alpha(self) -> f32 {
        f32::from(self.a) / 255.0
    }

    /// Return the same color with its alpha multiplied by `factor` (clamped to `[0, 1]`).
    pub fn with_opacity(self, factor: f32) -> Self {
        let factor = if factor.is_finite() {
            factor.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            a: (f32::from(self.a) * factor).round() as u8,
            ..self
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 0xFF {
            write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            write!(
                f,
                "#{:02X}{:02X}{:02X}{:02X}",
                self.r, self.g, self.b, self.a
            )
        }
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().strip_prefix('#').ok_or(ColorParseError::MissingHash)?;
        if !hex.is_ascii() {
            return Err(ColorParseError::BadDigit);
        }
        let byte = |i: usize| -> Result<u8, ColorParseError> {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| ColorParseError::BadDigit)
        };
        match hex.len() {
            6 => Ok(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Color::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            n => Err(ColorParseError::BadLength(n)),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_long_hex() {
        assert_eq!("#FF0000".parse::<Color>(), Ok(Color::rgb(0xFF, 0, 0)));
        assert_eq!(
            "#11223344".parse::<Color>(),
            Ok(Color::rgba(0x11, 0x22, 0x33, 0x44))
        );
        assert_eq!("#abcdef".parse::<Color>(), Ok(Color::rgb(0xAB, 0xCD, 0xEF)));
    }

    #[test]
    fn rejects_malformed_hex() {
        assert_eq!("FF0000".parse::<Color>(), Err(ColorParseError::MissingHash));
        assert_eq!("#FFF".parse::<Color>(), Err(ColorParseError::BadLength(3)));
        assert_eq!("#GG0000".parse::<Color>(), Err(ColorParseError::BadDigit));
        assert_eq!("#ÿÿÿ".parse::<Color>(), Err(ColorParseError::BadDigit));
    }

    #[test]
    fn display_omits_opaque_alpha() {
        assert_eq!(Color::rgb(0x12, 0x34, 0x56).to_string(), "#123456");
        assert_eq!(Color::rgba(0x12, 0x34, 0x56, 0x80).to_string(), "#12345680");
    }

    #[test]
    fn with_opacity_scales_alpha() {
        assert_eq!(Color::WHITE.with_opacity(0.5).a, 128);
        assert_eq!(Color::rgba(1, 2, 3, 100).with_opacity(0.5).a, 50);
        assert_eq!(Color::WHITE.with_opacity(f32::NAN).a, 0);
    }

    #[test]
    fn serde_uses_hex_strings() {
        let json = serde_json::to_string(&Color::rgb(0, 0x80, 0xFF)).unwrap();
        assert_eq!(json, "\"#0080FF\"");
        let back: Color = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Color::rgb(0, 0x80, 0xFF));
        assert!(serde_json::from_str::<Color>("\"red\"").is_err());
    }
}
