//! First layout pass: block sizes and positions computed before any drawing
//!
//! Everything here is pure geometry so the surface height is known before the
//! pixmap is allocated, and so the chart math can be checked without pixels.

use std::f64::consts::{FRAC_PI_2, TAU};

use steamwrap_core::Report;

pub const MAX_VISIBLE_GAMES: usize = 5;
pub const PADDING_X: f32 = 60.0;
pub const AVATAR_SIZE: f32 = 90.0;
pub const ROW_HEIGHT: f32 = 70.0;
pub const ICON_SIZE: f32 = 56.0;
pub const ICON_RADIUS: f32 = 8.0;
pub const BAR_HEIGHT: f32 = 8.0;
/// The filled part of a progress bar never gets narrower than this
pub const MIN_BAR_FILL: f32 = 4.0;
pub const INNER_RADIUS_RATIO: f32 = 0.6;
pub const LEGEND_ROW_GAP: f32 = 20.0;
pub const LEGEND_SWATCH: f32 = 12.0;

const TITLE_BLOCK: f32 = 80.0;
const AVATAR_BLOCK: f32 = AVATAR_SIZE + 25.0;
const NAME_LINE: f32 = 25.0;
const STAT_LINE: f32 = 20.0;
const STAT_LINES: f32 = 3.0;
const CHART_HEADER: f32 = 50.0;
const CHART_MARGIN: f32 = 12.0;
const LIST_HEADER: f32 = 60.0;
const FOOTER_MARGIN: f32 = 80.0;
const FOOTER_OFFSET: f32 = 40.0;
const LEGEND_GUTTER: f32 = 32.0;
/// Gap between a row icon and its name and bar
const ROW_GAP: f32 = 12.0;
/// Right-side room kept clear of the bar for the percentage
const PERCENT_COLUMN: f32 = 60.0;
/// Horizontal room held back for the legend when sizing the donut
const LEGEND_RESERVE: f32 = 120.0;

/// Donut radius for a content width, clamped to [56, 80]
pub fn donut_radius(content_width: f32) -> f32 {
    ((content_width - LEGEND_RESERVE) / 3.0).floor().clamp(56.0, 80.0)
}

/// Sum of every content block for `game_count` games (capped at the visible maximum).
pub fn content_height(content_width: f32, game_count: usize) -> f32 {
    let radius = donut_radius(content_width);
    let rows = game_count.min(MAX_VISIBLE_GAMES) as f32;
    TITLE_BLOCK
        + AVATAR_BLOCK
        + NAME_LINE
        + STAT_LINE * STAT_LINES
        + CHART_HEADER
        + radius * 2.0
        + CHART_MARGIN
        + LIST_HEADER
        + rows * ROW_HEIGHT
        + FOOTER_MARGIN
}

/// Positions of every block on the surface. Y values are text baselines or block tops.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutPlan {
    pub width: u32,
    pub height: u32,
    pub content_width: f32,
    pub visible_games: usize,
    pub title_baseline: f32,
    pub subtitle_baseline: f32,
    pub avatar_top: f32,
    pub name_baseline: f32,
    pub first_stat_baseline: f32,
    pub stat_line_gap: f32,
    pub chart_header_baseline: f32,
    pub chart_top: f32,
    pub radius: f32,
    pub list_header_baseline: f32,
    pub rows_top: f32,
    pub footer_baseline: f32,
}

impl LayoutPlan {
    pub fn compute(width: u32, min_height: u32, game_count: usize) -> Self {
        let content_width = width as f32 - 2.0 * PADDING_X;
        let radius = donut_radius(content_width);
        let visible_games = game_count.min(MAX_VISIBLE_GAMES);

        let avatar_top = TITLE_BLOCK;
        let name_baseline = avatar_top + AVATAR_BLOCK;
        let first_stat_baseline = name_baseline + NAME_LINE;
        let stats_end = first_stat_baseline + STAT_LINE * STAT_LINES;
        let chart_top = stats_end + CHART_HEADER;
        let chart_end = chart_top + radius * 2.0 + CHART_MARGIN;
        let rows_top = chart_end + LIST_HEADER;

        let needed = content_height(content_width, game_count).ceil() as u32;
        let height = min_height.max(needed);

        Self {
            width,
            height,
            content_width,
            visible_games,
            title_baseline: 20.0,
            subtitle_baseline: 40.0,
            avatar_top,
            name_baseline,
            first_stat_baseline,
            stat_line_gap: STAT_LINE,
            chart_header_baseline: stats_end + 20.0,
            chart_top,
            radius,
            list_header_baseline: chart_end + 40.0,
            rows_top,
            footer_baseline: height as f32 - FOOTER_OFFSET,
        }
    }

    pub fn center_x(&self) -> f32 {
        self.width as f32 / 2.0
    }

    pub fn row_top(&self, index: usize) -> f32 {
        self.rows_top + index as f32 * ROW_HEIGHT
    }

    /// Left edge shared by row names and progress bars
    pub fn row_text_x(&self) -> f32 {
        PADDING_X + ICON_SIZE + ROW_GAP
    }

    /// Progress bar track width; zero when the surface is too narrow for one
    pub fn bar_width(&self) -> f32 {
        (self.content_width - (ICON_SIZE + ROW_GAP) - PERCENT_COLUMN).max(0.0)
    }

    /// Donut and legend placement; the pair is centered as a group in the content area.
    pub fn chart_geometry(&self, legend_rows: usize) -> ChartGeometry {
        let radius = self.radius;
        let max_legend_width = self.content_width - radius * 2.0 - LEGEND_GUTTER;
        let legend_width = max_legend_width.min((self.content_width * 0.45).floor());
        let group_width = radius * 2.0 + LEGEND_GUTTER + legend_width;
        let left = PADDING_X + ((self.content_width - group_width) / 2.0).floor();

        let cx = (left + radius).floor();
        let cy = (self.chart_top + radius).floor();
        let legend_height = legend_rows as f32 * LEGEND_ROW_GAP;

        ChartGeometry {
            cx,
            cy,
            radius,
            inner_radius: (radius * INNER_RADIUS_RATIO).floor(),
            legend_x: left + radius * 2.0 + LEGEND_GUTTER,
            legend_first_baseline: cy - ((legend_height - LEGEND_ROW_GAP) / 2.0).floor(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartGeometry {
    pub cx: f32,
    pub cy: f32,
    pub radius: f32,
    pub inner_radius: f32,
    pub legend_x: f32,
    pub legend_first_baseline: f32,
}

impl ChartGeometry {
    pub fn legend_baseline(&self, index: usize) -> f32 {
        self.legend_first_baseline + index as f32 * LEGEND_ROW_GAP
    }
}

/// One donut slice. Angles are radians, clockwise from the positive x axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DonutSegment {
    pub index: usize,
    pub start: f64,
    pub sweep: f64,
}

/// Slices proportional to `hours`, laid end to end from the top of the circle.
///
/// Returns no segments when the total is zero.
pub fn donut_segments(hours: &[u32]) -> Vec<DonutSegment> {
    let total: u64 = hours.iter().map(|h| *h as u64).sum();
    if total == 0 {
        return Vec::new();
    }

    let mut start = -FRAC_PI_2;
    hours
        .iter()
        .enumerate()
        .map(|(index, h)| {
            let sweep = *h as f64 / total as f64 * TAU;
            let segment = DonutSegment { index, start, sweep };
            start += sweep;
            segment
        })
        .collect()
}

/// Character-count truncation with a `...` suffix
pub fn ellipsize(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

/// One decimal, or `<1` under an hour
pub fn format_hours(hours: f64) -> String {
    if hours >= 1.0 {
        format!("{:.1}", hours)
    } else {
        "<1".to_string()
    }
}

pub fn share_percent(part: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (part as f64 / total as f64 * 100.0).round() as u32
}

pub fn legend_label(name: &str, hours: u32, total: u32, max_chars: usize) -> String {
    let name = if name.is_empty() { "Unknown" } else { name };
    format!(
        "{} - {}h ({}%)",
        ellipsize(name, max_chars),
        format_hours(hours as f64),
        share_percent(hours, total)
    )
}

/// Width of the filled part of a progress bar, never wider than the track
pub fn bar_fill_width(completion_percent: u8, bar_width: f32) -> f32 {
    if bar_width <= 0.0 {
        return 0.0;
    }
    (completion_percent as f32 / 100.0 * bar_width)
        .max(MIN_BAR_FILL)
        .min(bar_width)
}

pub fn player_name(report: &Report) -> &str {
    report
        .profile
        .display_name
        .as_deref()
        .filter(|n| !n.is_empty())
        .unwrap_or("STEAM USER")
}

pub fn row_title(name: &str) -> &str {
    if name.is_empty() {
        "UNKNOWN GAME"
    } else {
        name
    }
}

/// The three centered lines under the player name
pub fn stat_lines(report: &Report) -> [String; 3] {
    [
        format!("Most Played Game: {}", report.most_played_game.as_deref().unwrap_or("N/A")),
        format!("Total Playtime: {:.1} hrs", report.total_hours as f64),
        format!("Total Achievements Earned: {}", report.total_achievements),
    ]
}

/// Label in the donut cutout
pub fn ring_label(visible_hours: u32) -> String {
    format!("{:.1} hrs", visible_hours as f64)
}

pub fn percent_label(completion_percent: u8) -> String {
    format!("{}%", completion_percent)
}
