//! Render options and the fixed report palette

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 8-bit RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }
}

pub const MAIN_TEXT: Rgba = Rgba::rgb(255, 255, 255);
pub const LIGHT_TEXT: Rgba = Rgba::rgba(255, 255, 255, 153);
pub const BAR_FILL: Rgba = Rgba::rgb(0x3e, 0x90, 0xff);
pub const BAR_TRACK: Rgba = Rgba::rgba(255, 255, 255, 26);
/// Fill for the donut cutout
pub const BACKGROUND: Rgba = Rgba::rgb(0x1f, 0x20, 0x25);
pub const ICON_PLACEHOLDER: Rgba = Rgba::rgb(0x17, 0x20, 0x33);

/// Donut segment and legend swatch colors, cycled by rank
pub const PALETTE: [Rgba; 6] = [
    Rgba::rgb(0x3b, 0x82, 0xf6),
    Rgba::rgb(0x10, 0xb9, 0x81),
    Rgba::rgb(0xf9, 0x73, 0x16),
    Rgba::rgb(0xef, 0x44, 0x44),
    Rgba::rgb(0x8b, 0x5c, 0xf6),
    Rgba::rgb(0x06, 0xb6, 0xd4),
];

pub fn palette_color(index: usize) -> Rgba {
    PALETTE[index % PALETTE.len()]
}

const DEFAULT_GRADIENT: [&str; 3] = ["#1b0096ff", "#000e3aff", "#000000ff"];

/// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`
pub fn parse_hex_color(input: &str) -> Option<Rgba> {
    let hex = input.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        3 => {
            let mut digits = hex.chars().map(|c| c.to_digit(16).map(|d| (d * 17) as u8));
            Some(Rgba::rgb(digits.next()??, digits.next()??, digits.next()??))
        }
        6 => Some(Rgba::rgb(channel(0)?, channel(2)?, channel(4)?)),
        8 => Some(Rgba::rgba(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
        _ => None,
    }
}

/// Layout and appearance settings, read from the `[render]` config table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Surface width in pixels
    pub width: u32,
    /// Lower bound for the computed surface height
    pub min_height: u32,
    /// Three background gradient stops, top to bottom
    pub gradient_colors: Vec<String>,
    pub legend_name_max_chars: usize,
    /// Preferred system font family, tried before the built-in list
    pub font_family: Option<String>,
    /// Font file used for all text, bypassing system lookup
    pub font_path: Option<PathBuf>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 600,
            min_height: 750,
            gradient_colors: DEFAULT_GRADIENT.iter().map(|c| c.to_string()).collect(),
            legend_name_max_chars: 25,
            font_family: None,
            font_path: None,
        }
    }
}

impl RenderOptions {
    /// Gradient stops with missing or malformed entries replaced.
    ///
    /// A missing stop repeats the previous one; an unparsable one falls back to the default.
    pub fn gradient(&self) -> [Rgba; 3] {
        let mut stops = [Rgba::rgb(0, 0, 0); 3];
        for i in 0..3 {
            stops[i] = match self.gradient_colors.get(i) {
                Some(raw) => parse_hex_color(raw).unwrap_or_else(|| {
                    tracing::warn!(color = %raw, "Invalid gradient color, using default");
                    parse_hex_color(DEFAULT_GRADIENT[i]).unwrap_or(BACKGROUND)
                }),
                None if i > 0 => stops[i - 1],
                None => parse_hex_color(DEFAULT_GRADIENT[0]).unwrap_or(BACKGROUND),
            };
        }
        stops
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_forms() {
        assert_eq!(parse_hex_color("#3e90ff"), Some(Rgba::rgb(0x3e, 0x90, 0xff)));
        assert_eq!(parse_hex_color("#1b0096ff"), Some(Rgba::rgba(0x1b, 0x00, 0x96, 0xff)));
        assert_eq!(parse_hex_color("#fff"), Some(Rgba::rgb(255, 255, 255)));
        assert_eq!(parse_hex_color("3e90ff"), None);
        assert_eq!(parse_hex_color("#12345"), None);
        assert_eq!(parse_hex_color("#gggggg"), None);
    }

    #[test]
    fn gradient_fills_missing_stops() {
        let options = RenderOptions {
            gradient_colors: vec!["#ff0000".to_string()],
            ..Default::default()
        };
        let stops = options.gradient();
        assert_eq!(stops, [Rgba::rgb(255, 0, 0); 3]);

        let bad = RenderOptions {
            gradient_colors: vec!["nope".to_string(), "#00ff00".to_string(), "#0000ff".to_string()],
            ..Default::default()
        };
        assert_eq!(bad.gradient()[0], Rgba::rgba(0x1b, 0x00, 0x96, 0xff));
        assert_eq!(bad.gradient()[2], Rgba::rgb(0, 0, 255));
    }

    #[test]
    fn palette_cycles() {
        assert_eq!(palette_color(0), palette_color(6));
        assert_ne!(palette_color(0), palette_color(1));
    }
}
