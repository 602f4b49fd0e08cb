//! Normalization of fetched Steam data into a `Report`

use chrono::{DateTime, Duration, Utc};

use crate::models::*;

/// Length of the rolling window Steam reports recent playtime for
pub const RECENT_WINDOW_DAYS: i64 = 14;

const ICON_CDN_BASE: &str = "https://steamcdn-a.akamaihd.net/steamcommunity/public/images/apps";

/// Game icons live at: steamcdn-a.akamaihd.net/steamcommunity/public/images/apps/{appid}/{hash}.jpg
pub fn game_icon_url(appid: u64, icon_hash: &str) -> String {
    format!("{}/{}/{}.jpg", ICON_CDN_BASE, appid, icon_hash)
}

pub fn minutes_to_hours(minutes: u32) -> u32 {
    (minutes as f64 / 60.0).round() as u32
}

pub fn completion_percent(unlocked: u32, total: u32) -> u8 {
    let pct = (unlocked as f64 / total.max(1) as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

/// Scale the 14 day total to the requested period.
///
/// Weekly and monthly are estimates (half and double of the sample), not
/// independent measurements.
pub fn period_total(two_week_hours: u32, period: Period) -> u32 {
    match period {
        Period::TwoWeeks => two_week_hours,
        Period::Weekly => (two_week_hours as f64 / 2.0).round() as u32,
        Period::Monthly => (two_week_hours as f64 * 2.0).round() as u32,
    }
}

/// Records unlocked within `[now - 14 days, now]`. An unlock time of 0 means never.
pub fn recent_unlocks(records: &[Achievement], now: DateTime<Utc>) -> Vec<Achievement> {
    let window_start = (now - Duration::days(RECENT_WINDOW_DAYS)).timestamp();
    let now_ts = now.timestamp();
    records
        .iter()
        .filter(|a| {
            let at = a.unlocktime as i64;
            a.unlocktime > 0 && at >= window_start && at <= now_ts
        })
        .cloned()
        .collect()
}

impl GameActivity {
    pub fn from_recent(game: &RecentGame) -> Self {
        Self {
            appid: game.appid,
            name: game.name.clone(),
            recent_minutes: game.playtime_2weeks,
            icon_url: game.icon_hash().map(|hash| game_icon_url(game.appid, hash)),
        }
    }

    pub fn hours(&self) -> u32 {
        minutes_to_hours(self.recent_minutes)
    }
}

impl AchievementSet {
    /// Build from the player's records and the schema size, if the schema was fetched.
    ///
    /// A missing or empty schema falls back to the number of player records.
    pub fn from_records(records: Vec<Achievement>, schema_len: Option<usize>, now: DateTime<Utc>) -> Self {
        let unlocked_count = records.iter().filter(|a| a.is_unlocked()).count() as u32;
        let total_possible = match schema_len {
            Some(n) if n > 0 => n as u32,
            _ => records.len() as u32,
        };
        Self {
            total_possible,
            unlocked_count,
            recent_unlocks: recent_unlocks(&records, now),
            raw_records: records,
        }
    }
}

impl GameDetail {
    pub fn new(activity: GameActivity, achievements: AchievementSet) -> Self {
        let hours = activity.hours();
        let completion_percent = completion_percent(achievements.unlocked_count, achievements.total_possible);
        Self {
            activity,
            hours,
            achievements,
            completion_percent,
        }
    }
}

impl Report {
    /// Assemble a report from per-game details given in fetch order.
    pub fn build(
        profile: PlayerProfile,
        period: Period,
        mut games: Vec<GameDetail>,
        count: AchievementCount,
    ) -> Self {
        // sort_by is stable, so equal hours keep fetch order
        games.sort_by(|a, b| b.hours.cmp(&a.hours));

        let two_week_hours: u32 = games.iter().map(|g| g.hours).sum();
        let total_achievements = games
            .iter()
            .map(|g| match count {
                AchievementCount::AllTime => g.achievements.unlocked_count,
                AchievementCount::LastTwoWeeks => g.achievements.recent_unlocks.len() as u32,
            })
            .sum();
        let most_played_game = games.first().map(|g| g.activity.name.clone());

        Self {
            profile,
            period,
            period_label: period.label().to_string(),
            games,
            total_hours: period_total(two_week_hours, period),
            total_achievements,
            most_played_game,
        }
    }

    /// Top games drawn on the image
    pub fn visible_games(&self, limit: usize) -> &[GameDetail] {
        &self.games[..self.games.len().min(limit)]
    }
}
