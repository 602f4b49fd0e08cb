//! Drawing surface wrapper over a tiny-skia `Pixmap`
//!
//! Shapes are filled with anti-aliasing. Image clipping is done by filling the
//! clip shape with an image pattern, so no clip state is ever left on the
//! surface between draws.

use image::RgbaImage;
use steamwrap_core::{ReportError, Result};
use tiny_skia::{
    ColorU8, FillRule, FilterQuality, GradientStop, LinearGradient, Paint, Path, PathBuilder, Pattern, Pixmap,
    Point, Rect, SpreadMode, Transform,
};

use crate::style::Rgba;
use crate::text::{Font, TextAlign};

pub struct Canvas {
    pixmap: Pixmap,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let pixmap = Pixmap::new(width, height)
            .ok_or_else(|| ReportError::Render(format!("cannot allocate a {}x{} surface", width, height)))?;
        Ok(Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn into_pixmap(self) -> Pixmap {
        self.pixmap
    }

    fn solid(color: Rgba) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color_rgba8(color.r, color.g, color.b, color.a);
        paint.anti_alias = true;
        paint
    }

    /// Top-to-bottom three stop gradient over the whole surface
    pub fn fill_vertical_gradient(&mut self, stops: [Rgba; 3]) {
        let height = self.height() as f32;
        let shader = LinearGradient::new(
            Point::from_xy(0.0, 0.0),
            Point::from_xy(0.0, height),
            vec![
                GradientStop::new(0.0, stops[0].to_skia()),
                GradientStop::new(0.5, stops[1].to_skia()),
                GradientStop::new(1.0, stops[2].to_skia()),
            ],
            SpreadMode::Pad,
            Transform::identity(),
        );
        let Some(rect) = Rect::from_xywh(0.0, 0.0, self.width() as f32, height) else {
            return;
        };
        match shader {
            Some(shader) => {
                let paint = Paint {
                    shader,
                    ..Paint::default()
                };
                self.pixmap.fill_rect(rect, &paint, Transform::identity(), None);
            }
            None => self.pixmap.fill(stops[0].to_skia()),
        }
    }

    pub fn fill_path(&mut self, path: &Path, color: Rgba) {
        self.pixmap
            .fill_path(path, &Self::solid(color), FillRule::Winding, Transform::identity(), None);
    }

    pub fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Rgba) {
        if let Some(path) = PathBuilder::from_circle(cx, cy, radius) {
            self.fill_path(&path, color);
        }
    }

    pub fn fill_rounded_rect(&mut self, x: f32, y: f32, w: f32, h: f32, radius: f32, color: Rgba) {
        if let Some(path) = rounded_rect_path(x, y, w, h, radius) {
            self.fill_path(&path, color);
        }
    }

    /// Pie slice from `start` over `sweep` radians
    pub fn fill_wedge(&mut self, cx: f32, cy: f32, radius: f32, start: f64, sweep: f64, color: Rgba) {
        if let Some(path) = wedge_path(cx, cy, radius, start, sweep) {
            self.fill_path(&path, color);
        }
    }

    /// Image scaled to the circle's bounding square and clipped to the circle
    pub fn draw_image_in_circle(&mut self, image: &RgbaImage, cx: f32, cy: f32, radius: f32) {
        if let Some(path) = PathBuilder::from_circle(cx, cy, radius) {
            self.fill_with_image(&path, image, cx - radius, cy - radius, radius * 2.0, radius * 2.0);
        }
    }

    pub fn draw_image_in_rounded_rect(&mut self, image: &RgbaImage, x: f32, y: f32, w: f32, h: f32, radius: f32) {
        if let Some(path) = rounded_rect_path(x, y, w, h, radius) {
            self.fill_with_image(&path, image, x, y, w, h);
        }
    }

    fn fill_with_image(&mut self, clip: &Path, image: &RgbaImage, x: f32, y: f32, w: f32, h: f32) {
        let Some(source) = image_to_pixmap(image) else {
            return;
        };
        let transform = Transform::from_row(
            w / source.width() as f32,
            0.0,
            0.0,
            h / source.height() as f32,
            x,
            y,
        );
        let paint = Paint {
            shader: Pattern::new(source.as_ref(), SpreadMode::Pad, FilterQuality::Bilinear, 1.0, transform),
            anti_alias: true,
            ..Paint::default()
        };
        self.pixmap
            .fill_path(clip, &paint, FillRule::Winding, Transform::identity(), None);
    }

    /// Draw `text` with its anchor at (`x`, `baseline`). Without a font nothing is drawn.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_text(
        &mut self,
        font: Option<&Font>,
        text: &str,
        size: f32,
        x: f32,
        baseline: f32,
        align: TextAlign,
        color: Rgba,
    ) {
        let Some(font) = font else {
            return;
        };
        let start_x = match align {
            TextAlign::Left => x,
            TextAlign::Center => x - font.measure(text, size) / 2.0,
            TextAlign::Right => x - font.measure(text, size),
        };
        if let Some(path) = font.outline(text, size, start_x, baseline) {
            self.fill_path(&path, color);
        }
    }
}

/// Rounded rectangle; the radius shrinks to fit narrow or short boxes
pub fn rounded_rect_path(x: f32, y: f32, w: f32, h: f32, radius: f32) -> Option<Path> {
    if w <= 0.0 || h <= 0.0 {
        return None;
    }
    let r = radius.min(w / 2.0).min(h / 2.0).max(0.0);
    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(x + w - r, y);
    pb.quad_to(x + w, y, x + w, y + r);
    pb.line_to(x + w, y + h - r);
    pb.quad_to(x + w, y + h, x + w - r, y + h);
    pb.line_to(x + r, y + h);
    pb.quad_to(x, y + h, x, y + h - r);
    pb.line_to(x, y + r);
    pb.quad_to(x, y, x + r, y);
    pb.close();
    pb.finish()
}

/// Wedge from the center out to an arc. Arcs are split into quarter turns
/// and approximated with cubics.
pub fn wedge_path(cx: f32, cy: f32, radius: f32, start: f64, sweep: f64) -> Option<Path> {
    if sweep <= f64::EPSILON || radius <= 0.0 {
        return None;
    }
    let r = radius as f64;
    let (cx64, cy64) = (cx as f64, cy as f64);
    let point = |angle: f64| (cx64 + r * angle.cos(), cy64 + r * angle.sin());

    let mut pb = PathBuilder::new();
    pb.move_to(cx, cy);
    let (sx, sy) = point(start);
    pb.line_to(sx as f32, sy as f32);

    let pieces = (sweep / std::f64::consts::FRAC_PI_2).ceil().max(1.0) as usize;
    let step = sweep / pieces as f64;
    let k = 4.0 / 3.0 * (step / 4.0).tan() * r;
    for i in 0..pieces {
        let a0 = start + step * i as f64;
        let a1 = a0 + step;
        let (x0, y0) = point(a0);
        let (x3, y3) = point(a1);
        let c1 = (x0 - k * a0.sin(), y0 + k * a0.cos());
        let c2 = (x3 + k * a1.sin(), y3 - k * a1.cos());
        pb.cubic_to(
            c1.0 as f32,
            c1.1 as f32,
            c2.0 as f32,
            c2.1 as f32,
            x3 as f32,
            y3 as f32,
        );
    }
    pb.close();
    pb.finish()
}

/// Copy a straight-alpha image into a premultiplied pixmap
fn image_to_pixmap(image: &RgbaImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Some(pixmap)
}
