//! PNG serialization of a finished surface

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{ImageFormat, RgbaImage};
use steamwrap_core::{Report, ReportError, Result};
use tiny_skia::Pixmap;

/// Encode the surface as PNG bytes (straight alpha).
pub fn encode_png(pixmap: &Pixmap) -> Result<Vec<u8>> {
    let data: Vec<u8> = pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();
    let image = RgbaImage::from_raw(pixmap.width(), pixmap.height(), data)
        .ok_or_else(|| ReportError::Encode("pixel buffer does not match surface size".to_string()))?;

    let mut buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| ReportError::Encode(format!("PNG: {}", e)))?;
    Ok(buffer)
}

pub fn to_data_url(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(png))
}

/// File name for a downloaded report: display name or steam id, filesystem safe
pub fn report_file_name(report: &Report) -> String {
    let base = report
        .profile
        .display_name
        .as_deref()
        .filter(|n| !n.is_empty())
        .unwrap_or(&report.profile.steam_id);
    let base = if base.is_empty() { "steam-report" } else { base };
    let safe: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}.png", safe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use steamwrap_core::{Period, PlayerProfile};

    fn report(name: Option<&str>) -> Report {
        Report {
            profile: PlayerProfile {
                steam_id: "76561198000000000".to_string(),
                display_name: name.map(str::to_string),
                avatar_url: None,
            },
            period: Period::TwoWeeks,
            period_label: Period::TwoWeeks.label().to_string(),
            games: vec![],
            total_hours: 0,
            total_achievements: 0,
            most_played_game: None,
        }
    }

    #[test]
    fn file_name_is_sanitized() {
        assert_eq!(report_file_name(&report(Some("Gabe N. <3"))), "Gabe_N.__3.png");
        assert_eq!(report_file_name(&report(Some("日本"))), "__.png");
        assert_eq!(report_file_name(&report(None)), "76561198000000000.png");
    }

    #[test]
    fn png_round_trips_pixels() {
        let mut pixmap = Pixmap::new(3, 2).unwrap();
        pixmap.fill(tiny_skia::Color::from_rgba8(10, 20, 30, 255));
        let png = encode_png(&pixmap).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

        let decoded = image::load_from_memory_with_format(&png, ImageFormat::Png).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(2, 1).0, [10, 20, 30, 255]);

        assert!(to_data_url(&png).starts_with("data:image/png;base64,iVBORw0KGgo"));
    }
}
