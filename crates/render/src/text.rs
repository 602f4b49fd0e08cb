//! Text rasterization through font outlines
//!
//! Faces come from the system font database (or an explicit font file) and
//! each string is turned into one tiny-skia path. There is no shaping: glyphs
//! are placed by their horizontal advance, which is enough for report labels.

use std::path::Path;
use std::sync::Arc;

use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use tiny_skia::PathBuilder;

/// Families tried after the configured one
const FALLBACK_FAMILIES: [&str; 2] = ["Segoe UI", "Arial"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// A parsed-on-demand font face
#[derive(Clone)]
pub struct Font {
    data: Arc<Vec<u8>>,
    index: u32,
}

impl Font {
    pub fn from_bytes(data: Vec<u8>, index: u32) -> Option<Self> {
        ttf_parser::Face::parse(&data, index).ok()?;
        Some(Self {
            data: Arc::new(data),
            index,
        })
    }

    fn face(&self) -> Option<ttf_parser::Face<'_>> {
        ttf_parser::Face::parse(&self.data, self.index).ok()
    }

    /// Advance width of `text` at `size` pixels
    pub fn measure(&self, text: &str, size: f32) -> f32 {
        let Some(face) = self.face() else {
            return 0.0;
        };
        let scale = size / face.units_per_em() as f32;
        text.chars()
            .map(|c| {
                let glyph = face.glyph_index(c).unwrap_or(ttf_parser::GlyphId(0));
                face.glyph_hor_advance(glyph).unwrap_or(0) as f32 * scale
            })
            .sum()
    }

    /// Outline of `text` with its baseline starting at (`x`, `baseline`).
    ///
    /// `None` when nothing visible would be drawn (empty or whitespace-only text).
    pub fn outline(&self, text: &str, size: f32, x: f32, baseline: f32) -> Option<tiny_skia::Path> {
        let face = self.face()?;
        let scale = size / face.units_per_em() as f32;
        let mut builder = PathBuilder::new();
        let mut pen_x = x;

        for c in text.chars() {
            let glyph = face.glyph_index(c).unwrap_or(ttf_parser::GlyphId(0));
            let mut pen = GlyphPen {
                builder: &mut builder,
                scale,
                x: pen_x,
                y: baseline,
            };
            face.outline_glyph(glyph, &mut pen);
            pen_x += face.glyph_hor_advance(glyph).unwrap_or(0) as f32 * scale;
        }

        builder.finish()
    }
}

/// Maps design units (y-up) to device pixels (y-down) while building the path
struct GlyphPen<'a> {
    builder: &'a mut PathBuilder,
    scale: f32,
    x: f32,
    y: f32,
}

impl GlyphPen<'_> {
    fn map(&self, x: f32, y: f32) -> (f32, f32) {
        (self.x + x * self.scale, self.y - y * self.scale)
    }
}

impl ttf_parser::OutlineBuilder for GlyphPen<'_> {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x, y) = self.map(x, y);
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x2, y2) = self.map(x2, y2);
        let (x, y) = self.map(x, y);
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

/// Font lookup for the three weights the report uses
pub struct FontBook {
    db: Database,
    families: Vec<String>,
    pinned: Option<Font>,
}

impl FontBook {
    /// System fonts, preferring `family` and then the built-in fallbacks.
    ///
    /// A readable `font_path` is used for every weight instead.
    pub fn system(family: Option<&str>, font_path: Option<&Path>) -> Self {
        let pinned = font_path.and_then(|path| match std::fs::read(path) {
            Ok(data) => {
                let font = Font::from_bytes(data, 0);
                if font.is_none() {
                    tracing::warn!(path = %path.display(), "Font file could not be parsed");
                }
                font
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Font file could not be read");
                None
            }
        });

        let mut db = Database::new();
        if pinned.is_none() {
            db.load_system_fonts();
            tracing::debug!(faces = db.len(), "Loaded system fonts");
        }

        let families = family
            .into_iter()
            .map(str::to_string)
            .chain(FALLBACK_FAMILIES.iter().map(|f| f.to_string()))
            .collect();

        Self { db, families, pinned }
    }

    /// No fonts at all; text draws become no-ops
    pub fn empty() -> Self {
        Self {
            db: Database::new(),
            families: Vec::new(),
            pinned: None,
        }
    }

    pub fn resolve(&self, weight: u16) -> Option<Font> {
        if let Some(font) = &self.pinned {
            return Some(font.clone());
        }
        if self.db.is_empty() {
            return None;
        }

        let mut families: Vec<Family<'_>> = self.families.iter().map(|f| Family::Name(f)).collect();
        families.push(Family::SansSerif);
        let query = Query {
            families: &families,
            weight: Weight(weight),
            stretch: Stretch::Normal,
            style: Style::Normal,
        };

        let id = self.db.query(&query)?;
        self.db
            .with_face_data(id, |data, index| Font::from_bytes(data.to_vec(), index))
            .flatten()
    }
}

/// Faces resolved once per renderer
#[derive(Clone, Default)]
pub struct Fonts {
    pub regular: Option<Font>,
    pub medium: Option<Font>,
    pub semibold: Option<Font>,
}

impl Fonts {
    pub fn resolve(book: &FontBook) -> Self {
        let fonts = Self {
            regular: book.resolve(400),
            medium: book.resolve(500),
            semibold: book.resolve(600),
        };
        if fonts.regular.is_none() && fonts.medium.is_none() && fonts.semibold.is_none() {
            tracing::warn!("No usable font found, report text will be skipped");
        }
        fonts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_book_resolves_nothing() {
        let book = FontBook::empty();
        assert!(book.resolve(400).is_none());
        let fonts = Fonts::resolve(&book);
        assert!(fonts.regular.is_none() && fonts.semibold.is_none());
    }

    #[test]
    fn garbage_bytes_are_not_a_font() {
        assert!(Font::from_bytes(vec![0, 1, 2, 3], 0).is_none());
    }

    /// Bounding box of clearly painted pixels as (left, top, right, bottom)
    fn ink_box(canvas: &crate::canvas::Canvas) -> Option<(u32, u32, u32, u32)> {
        let width = canvas.width();
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for (i, p) in canvas.pixmap().pixels().iter().enumerate() {
            if p.alpha() < 128 {
                continue;
            }
            let (x, y) = (i as u32 % width, i as u32 / width);
            bounds = Some(match bounds {
                None => (x, y, x, y),
                Some((l, t, r, b)) => (l.min(x), t.min(y), r.max(x), b.max(y)),
            });
        }
        bounds
    }

    #[test]
    fn system_font_text_sits_on_its_anchor() {
        let Some(font) = FontBook::system(None, None).resolve(400) else {
            return;
        };
        let white = crate::style::Rgba::rgb(255, 255, 255);
        // symmetric glyphs without descenders
        let text = "HOH";
        let width = font.measure(text, 20.0);
        assert!(width > 20.0);

        let mut canvas = crate::canvas::Canvas::new(200, 60).unwrap();
        canvas.draw_text(Some(&font), text, 20.0, 100.0, 40.0, TextAlign::Center, white);
        let (left, top, right, bottom) = ink_box(&canvas).unwrap();
        let center = (left + right + 1) as f32 / 2.0;
        assert!((center - 100.0).abs() <= 3.0, "center {center}");
        // glyphs grow upward from the baseline
        assert!(bottom <= 40 && bottom >= 37, "bottom {bottom}");
        assert!(top < 32, "top {top}");

        let mut canvas = crate::canvas::Canvas::new(200, 60).unwrap();
        canvas.draw_text(Some(&font), text, 20.0, 150.0, 40.0, TextAlign::Right, white);
        let (left, _, right, _) = ink_box(&canvas).unwrap();
        assert!(right <= 150 && right >= 146, "right {right}");
        assert!((left as f32) >= 150.0 - width - 1.0);
    }

    #[test]
    fn missing_font_file_falls_back() {
        let book = FontBook::system(None, Some(Path::new("/definitely/not/here.ttf")));
        assert!(book.pinned.is_none());
        assert_eq!(book.families, vec!["Segoe UI".to_string(), "Arial".to_string()]);
    }
}
