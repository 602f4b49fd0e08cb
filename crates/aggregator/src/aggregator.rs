//! Fetch plan and normalization for a player report

use chrono::{DateTime, Utc};
use futures_util::future::{join, join_all};
use steamwrap_core::{
    AchievementCount, AchievementSet, GameActivity, GameDetail, Period, PlayerProfile, RecentGame, Report,
    ReportError, Result,
};

use crate::steam_api::SteamApi;

/// Validate a SteamID64 before any request is issued.
pub fn parse_steam_id(input: &str) -> Result<u64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ReportError::InvalidInput("Steam ID is empty".to_string()));
    }
    if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ReportError::InvalidInput(format!(
            "'{}' is not a numeric Steam ID",
            trimmed
        )));
    }
    trimmed
        .parse()
        .map_err(|_| ReportError::InvalidInput(format!("'{}' is out of range for a Steam ID", trimmed)))
}

pub struct ReportAggregator<A> {
    api: A,
    achievement_count: AchievementCount,
}

impl<A: SteamApi> ReportAggregator<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            achievement_count: AchievementCount::default(),
        }
    }

    pub fn with_achievement_count(mut self, count: AchievementCount) -> Self {
        self.achievement_count = count;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub async fn fetch_report(&self, player_id: &str, period: Period) -> Result<Report> {
        self.fetch_report_at(player_id, period, Utc::now()).await
    }

    /// Same as `fetch_report`, with the recency window anchored at `now`.
    pub async fn fetch_report_at(&self, player_id: &str, period: Period, now: DateTime<Utc>) -> Result<Report> {
        let steam_id = parse_steam_id(player_id)?;

        let (summary, recent) = join(
            self.api.player_summary(steam_id),
            self.api.recently_played(steam_id),
        )
        .await;
        let summary = summary.map_err(|e| ReportError::upstream("GetPlayerSummaries", e))?;
        let recent = recent.map_err(|e| ReportError::upstream("GetRecentlyPlayedGames", e))?;

        tracing::info!(
            steam_id,
            games = recent.len(),
            %period,
            "Fetched profile and recent activity"
        );

        // join_all yields results in input order, whatever order they complete in
        let details = join_all(
            recent
                .iter()
                .map(|game| self.fetch_game_detail(steam_id, game, now)),
        )
        .await;

        for detail in &details {
            tracing::debug!(
                appid = detail.activity.appid,
                name = %detail.activity.name,
                total = detail.achievements.total_possible,
                unlocked = detail.achievements.unlocked_count,
                recent = detail.achievements.recent_unlocks.len(),
                "Game achievement summary"
            );
        }

        let profile = PlayerProfile::from_summary(&steam_id.to_string(), summary.as_ref());
        Ok(Report::build(profile, period, details, self.achievement_count))
    }

    /// Achievements and schema for one game. Failures degrade to defaults.
    async fn fetch_game_detail(&self, steam_id: u64, game: &RecentGame, now: DateTime<Utc>) -> GameDetail {
        let (achievements, schema) = join(
            self.api.player_achievements(steam_id, game.appid),
            self.api.achievement_schema(game.appid),
        )
        .await;

        let achievements = match achievements {
            Ok(records) => {
                let schema_len = match schema {
                    Ok(schema) => Some(schema.len()),
                    Err(e) => {
                        tracing::warn!(appid = game.appid, error = %e, "Schema unavailable, counting player records");
                        None
                    }
                };
                AchievementSet::from_records(records, schema_len, now)
            }
            Err(e) => {
                tracing::warn!(appid = game.appid, error = %e, "Achievements unavailable, using empty set");
                AchievementSet::default()
            }
        };

        GameDetail::new(GameActivity::from_recent(game), achievements)
    }
}
