//! Report image composition
//!
//! The layout is computed first (see `layout`), then blocks are drawn top to
//! bottom. Image loads are awaited one at a time so the surface is only ever
//! touched by one draw step.

use steamwrap_core::{Report, Result};
use tiny_skia::Pixmap;

use crate::canvas::Canvas;
use crate::image_loader::{ImageFetcher, ImageLoader};
use crate::layout::*;
use crate::style::*;
use crate::text::{FontBook, Fonts, TextAlign};

const FOOTER_TEXT: &str = "Generated by SteamWrap";

pub struct ReportRenderer {
    options: RenderOptions,
    fonts: Fonts,
}

impl ReportRenderer {
    pub fn new(options: RenderOptions, fonts: &FontBook) -> Self {
        Self {
            options,
            fonts: Fonts::resolve(fonts),
        }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn plan(&self, report: &Report) -> LayoutPlan {
        LayoutPlan::compute(self.options.width, self.options.min_height, report.games.len())
    }

    pub async fn render<F: ImageFetcher>(&self, report: &Report, images: &ImageLoader<F>) -> Result<Pixmap> {
        let plan = self.plan(report);
        tracing::debug!(width = plan.width, height = plan.height, games = plan.visible_games, "Rendering report");

        let mut canvas = Canvas::new(plan.width, plan.height)?;
        canvas.fill_vertical_gradient(self.options.gradient());

        self.draw_header(&mut canvas, &plan, report);
        self.draw_avatar(&mut canvas, &plan, report, images).await;
        self.draw_stats(&mut canvas, &plan, report);
        self.draw_chart(&mut canvas, &plan, report);
        self.draw_rows(&mut canvas, &plan, report, images).await;

        canvas.draw_text(
            self.fonts.regular.as_ref(),
            FOOTER_TEXT,
            14.0,
            plan.center_x(),
            plan.footer_baseline,
            TextAlign::Center,
            LIGHT_TEXT,
        );

        Ok(canvas.into_pixmap())
    }

    fn draw_header(&self, canvas: &mut Canvas, plan: &LayoutPlan, report: &Report) {
        let font = self.fonts.medium.as_ref();
        canvas.draw_text(font, report.period.title(), 16.0, plan.center_x(), plan.title_baseline, TextAlign::Center, MAIN_TEXT);
        canvas.draw_text(font, "Top 5 Games", 16.0, plan.center_x(), plan.subtitle_baseline, TextAlign::Center, MAIN_TEXT);
    }

    async fn draw_avatar<F: ImageFetcher>(
        &self,
        canvas: &mut Canvas,
        plan: &LayoutPlan,
        report: &Report,
        images: &ImageLoader<F>,
    ) {
        let radius = AVATAR_SIZE / 2.0;
        let cx = plan.center_x();
        let cy = plan.avatar_top + radius;

        let avatar = images.load(report.profile.avatar_url.as_deref()).await;
        match avatar.image() {
            Some(image) => canvas.draw_image_in_circle(image, cx, cy, radius),
            None => canvas.fill_circle(cx, cy, radius, BAR_FILL),
        }
    }

    fn draw_stats(&self, canvas: &mut Canvas, plan: &LayoutPlan, report: &Report) {
        let cx = plan.center_x();
        canvas.draw_text(
            self.fonts.semibold.as_ref(),
            player_name(report),
            18.0,
            cx,
            plan.name_baseline,
            TextAlign::Center,
            MAIN_TEXT,
        );

        let lines = stat_lines(report);
        for (i, line) in lines.iter().enumerate() {
            let baseline = plan.first_stat_baseline + i as f32 * plan.stat_line_gap;
            canvas.draw_text(self.fonts.regular.as_ref(), line, 14.0, cx, baseline, TextAlign::Center, LIGHT_TEXT);
        }
    }

    fn draw_chart(&self, canvas: &mut Canvas, plan: &LayoutPlan, report: &Report) {
        canvas.draw_text(
            self.fonts.semibold.as_ref(),
            "Playtime Breakdown",
            16.0,
            PADDING_X,
            plan.chart_header_baseline,
            TextAlign::Left,
            MAIN_TEXT,
        );

        let visible = report.visible_games(MAX_VISIBLE_GAMES);
        let hours: Vec<u32> = visible.iter().map(|g| g.hours).collect();
        let segments = donut_segments(&hours);
        if segments.is_empty() {
            tracing::debug!("No recent playtime, skipping chart");
            return;
        }
        let total: u32 = hours.iter().sum();
        let geo = plan.chart_geometry(visible.len());

        for segment in &segments {
            canvas.fill_wedge(geo.cx, geo.cy, geo.radius, segment.start, segment.sweep, palette_color(segment.index));
        }
        canvas.fill_circle(geo.cx, geo.cy, geo.inner_radius, BACKGROUND);
        canvas.draw_text(
            self.fonts.semibold.as_ref(),
            &ring_label(total),
            14.0,
            geo.cx,
            geo.cy + 6.0,
            TextAlign::Center,
            MAIN_TEXT,
        );

        for (i, game) in visible.iter().enumerate() {
            let baseline = geo.legend_baseline(i);
            canvas.fill_rounded_rect(geo.legend_x, baseline - 8.0, LEGEND_SWATCH, LEGEND_SWATCH, 3.0, palette_color(i));
            let label = legend_label(game.name(), game.hours, total, self.options.legend_name_max_chars);
            canvas.draw_text(
                self.fonts.medium.as_ref(),
                &label,
                12.0,
                geo.legend_x + LEGEND_SWATCH + 6.0,
                baseline,
                TextAlign::Left,
                MAIN_TEXT,
            );
        }
    }

    async fn draw_rows<F: ImageFetcher>(
        &self,
        canvas: &mut Canvas,
        plan: &LayoutPlan,
        report: &Report,
        images: &ImageLoader<F>,
    ) {
        canvas.draw_text(
            self.fonts.semibold.as_ref(),
            "Games Completion Progress",
            16.0,
            PADDING_X,
            plan.list_header_baseline,
            TextAlign::Left,
            MAIN_TEXT,
        );

        let name_x = plan.row_text_x();
        let bar_width = plan.bar_width();
        let right_edge = PADDING_X + plan.content_width;

        for (i, game) in report.visible_games(MAX_VISIBLE_GAMES).iter().enumerate() {
            let y = plan.row_top(i);
            let icon_y = y + 8.0;

            let icon = images.load(game.activity.icon_url.as_deref()).await;
            match icon.image() {
                Some(image) => canvas.draw_image_in_rounded_rect(image, PADDING_X, icon_y, ICON_SIZE, ICON_SIZE, ICON_RADIUS),
                None => canvas.fill_rounded_rect(PADDING_X, icon_y, ICON_SIZE, ICON_SIZE, ICON_RADIUS, ICON_PLACEHOLDER),
            }

            let font = self.fonts.medium.as_ref();
            canvas.draw_text(font, row_title(game.name()), 16.0, name_x, y + 24.0, TextAlign::Left, MAIN_TEXT);
            canvas.draw_text(
                font,
                &percent_label(game.completion_percent),
                16.0,
                right_edge,
                y + 44.0,
                TextAlign::Right,
                MAIN_TEXT,
            );

            if bar_width > 0.0 {
                let bar_y = y + 36.0;
                canvas.fill_rounded_rect(name_x, bar_y, bar_width, BAR_HEIGHT, 4.0, BAR_TRACK);
                let fill = bar_fill_width(game.completion_percent, bar_width);
                canvas.fill_rounded_rect(name_x, bar_y, fill, BAR_HEIGHT, 4.0, BAR_FILL);
            }
        }
    }
}
