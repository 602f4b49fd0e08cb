use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use steamwrap_aggregator::{ApiError, ReportAggregator, SteamApi};
use steamwrap_core::{
    Achievement, AchievementCount, AchievementSchema, Period, PlayerSummary, RecentGame, ReportError,
};

const STEAM_ID: &str = "76561198000000000";

#[derive(Default)]
struct FakeSteam {
    summary: Option<PlayerSummary>,
    games: Vec<RecentGame>,
    achievements: HashMap<u64, Vec<Achievement>>,
    schemas: HashMap<u64, usize>,
    failing_achievements: HashSet<u64>,
    failing_schemas: HashSet<u64>,
    profile_status: Option<u16>,
    recent_status: Option<u16>,
    /// Per-app delay so responses complete out of fetch order
    delays_ms: HashMap<u64, u64>,
    /// Delay for the profile and recent-games calls
    top_level_delay_ms: Option<u64>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

/// Counts a call as in flight until dropped
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl FakeSteam {
    fn with_games(games: Vec<RecentGame>) -> Self {
        Self {
            summary: Some(PlayerSummary {
                steamid: STEAM_ID.to_string(),
                personaname: Some("gabe".to_string()),
                avatar: Some("https://avatars.example/a.jpg".to_string()),
                avatarmedium: None,
                avatarfull: None,
            }),
            games,
            ..Default::default()
        }
    }

    fn enter(&self) -> InFlight<'_> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        InFlight(&self.in_flight)
    }

    async fn delay(&self, appid: u64) {
        if let Some(ms) = self.delays_ms.get(&appid) {
            tokio::time::sleep(Duration::from_millis(*ms)).await;
        }
    }

    async fn top_level_delay(&self) {
        if let Some(ms) = self.top_level_delay_ms {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }
}

#[async_trait]
impl SteamApi for FakeSteam {
    async fn player_summary(&self, _steam_id: u64) -> Result<Option<PlayerSummary>, ApiError> {
        let _guard = self.enter();
        self.top_level_delay().await;
        match self.profile_status {
            Some(status) => Err(ApiError::Status { status }),
            None => Ok(self.summary.clone()),
        }
    }

    async fn recently_played(&self, _steam_id: u64) -> Result<Vec<RecentGame>, ApiError> {
        let _guard = self.enter();
        self.top_level_delay().await;
        match self.recent_status {
            Some(status) => Err(ApiError::Status { status }),
            None => Ok(self.games.clone()),
        }
    }

    async fn player_achievements(&self, _steam_id: u64, appid: u64) -> Result<Vec<Achievement>, ApiError> {
        let _guard = self.enter();
        self.delay(appid).await;
        if self.failing_achievements.contains(&appid) {
            return Err(ApiError::Status { status: 400 });
        }
        Ok(self.achievements.get(&appid).cloned().unwrap_or_default())
    }

    async fn achievement_schema(&self, appid: u64) -> Result<Vec<AchievementSchema>, ApiError> {
        let _guard = self.enter();
        self.delay(appid).await;
        if self.failing_schemas.contains(&appid) {
            return Err(ApiError::Decode("schema".to_string()));
        }
        let count = self.schemas.get(&appid).copied().unwrap_or(0);
        Ok((0..count)
            .map(|i| AchievementSchema {
                name: format!("ACH_{}", i),
                display_name: format!("Achievement {}", i),
                description: None,
                icon: String::new(),
                icongray: String::new(),
            })
            .collect())
    }
}

fn recent(appid: u64, name: &str, minutes: u32) -> RecentGame {
    RecentGame {
        appid,
        name: name.to_string(),
        playtime_2weeks: minutes,
        playtime_forever: minutes * 10,
        img_icon_url: Some(format!("hash{}", appid)),
        img_logo_url: None,
    }
}

fn unlocked(apiname: &str, unlocktime: u32) -> Achievement {
    Achievement {
        apiname: apiname.to_string(),
        achieved: 1,
        unlocktime,
    }
}

fn locked(apiname: &str) -> Achievement {
    Achievement {
        apiname: apiname.to_string(),
        achieved: 0,
        unlocktime: 0,
    }
}

#[tokio::test]
async fn builds_sorted_report_independent_of_completion_order() {
    let mut api = FakeSteam::with_games(vec![
        recent(10, "Slow Tie", 120),
        recent(20, "Most Played", 600),
        recent(30, "Fast Tie", 130),
    ]);
    // The first game in fetch order finishes last
    api.delays_ms.insert(10, 60);
    api.delays_ms.insert(20, 30);
    api.delays_ms.insert(30, 0);
    api.achievements.insert(20, vec![unlocked("A", 1), unlocked("B", 1), locked("C"), locked("D")]);
    api.schemas.insert(20, 4);

    let aggregator = ReportAggregator::new(api);
    let report = aggregator.fetch_report(STEAM_ID, Period::TwoWeeks).await.unwrap();

    let order: Vec<_> = report.games.iter().map(|g| g.activity.appid).collect();
    assert_eq!(order, vec![20, 10, 30]);
    assert_eq!(report.total_hours, 10 + 2 + 2);
    assert_eq!(report.most_played_game.as_deref(), Some("Most Played"));
    assert_eq!(report.total_achievements, 2);
    assert_eq!(report.games[0].completion_percent, 50);
    assert_eq!(report.profile.display_name.as_deref(), Some("gabe"));
    assert_eq!(
        report.games[0].activity.icon_url.as_deref(),
        Some("https://steamcdn-a.akamaihd.net/steamcommunity/public/images/apps/20/hash20.jpg")
    );
}

#[tokio::test]
async fn invalid_ids_issue_no_requests() {
    for bad in ["", "   ", "gaben", "7656-1198", "999999999999999999999999"] {
        let aggregator = ReportAggregator::new(FakeSteam::with_games(vec![recent(1, "g", 60)]));
        let err = aggregator.fetch_report(bad, Period::TwoWeeks).await.unwrap_err();
        assert!(matches!(err, ReportError::InvalidInput(_)), "{bad:?} gave {err:?}");
        assert_eq!(aggregator.api().calls.load(Ordering::SeqCst), 0);
    }
}

#[tokio::test]
async fn fans_out_two_requests_per_game() {
    let games = (1..=4).map(|i| recent(i, "g", 60)).collect();
    let aggregator = ReportAggregator::new(FakeSteam::with_games(games));
    let report = aggregator.fetch_report(" 76561198000000000 ", Period::TwoWeeks).await.unwrap();

    assert_eq!(report.games.len(), 4);
    // profile + recent, then achievements + schema for each game
    assert_eq!(aggregator.api().calls.load(Ordering::SeqCst), 2 + 4 * 2);
}

#[tokio::test]
async fn profile_and_recent_games_are_requested_together() {
    let mut api = FakeSteam::with_games(vec![]);
    api.top_level_delay_ms = Some(20);
    let aggregator = ReportAggregator::new(api);
    aggregator.fetch_report(STEAM_ID, Period::TwoWeeks).await.unwrap();

    assert_eq!(aggregator.api().peak_in_flight.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn every_game_request_is_in_flight_at_once() {
    let games: Vec<_> = (1..=6).map(|i| recent(i, "g", 60)).collect();
    let mut api = FakeSteam::with_games(games);
    for appid in 1..=6 {
        api.delays_ms.insert(appid, 20);
    }
    let aggregator = ReportAggregator::new(api);
    let report = aggregator.fetch_report(STEAM_ID, Period::TwoWeeks).await.unwrap();

    assert_eq!(report.games.len(), 6);
    // achievements + schema for all six games overlap
    assert_eq!(aggregator.api().peak_in_flight.load(Ordering::SeqCst), 2 * 6);
    assert_eq!(aggregator.api().in_flight.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn top_level_failures_are_fatal() {
    let mut api = FakeSteam::with_games(vec![recent(1, "g", 60)]);
    api.profile_status = Some(500);
    let err = ReportAggregator::new(api)
        .fetch_report(STEAM_ID, Period::TwoWeeks)
        .await
        .unwrap_err();
    assert!(matches!(err, ReportError::UpstreamUnavailable { endpoint: "GetPlayerSummaries", .. }));

    let mut api = FakeSteam::with_games(vec![recent(1, "g", 60)]);
    api.recent_status = Some(403);
    let err = ReportAggregator::new(api)
        .fetch_report(STEAM_ID, Period::TwoWeeks)
        .await
        .unwrap_err();
    assert!(matches!(err, ReportError::UpstreamUnavailable { endpoint: "GetRecentlyPlayedGames", .. }));
}

#[tokio::test]
async fn per_game_failures_degrade() {
    let mut api = FakeSteam::with_games(vec![recent(1, "No Stats", 120), recent(2, "No Schema", 60)]);
    api.failing_achievements.insert(1);
    api.achievements.insert(2, vec![unlocked("A", 1), locked("B"), locked("C")]);
    api.failing_schemas.insert(2);

    let report = ReportAggregator::new(api)
        .fetch_report(STEAM_ID, Period::TwoWeeks)
        .await
        .unwrap();

    let no_stats = &report.games[0];
    assert_eq!(no_stats.activity.appid, 1);
    assert_eq!(no_stats.achievements.total_possible, 0);
    assert_eq!(no_stats.achievements.unlocked_count, 0);
    assert!(no_stats.achievements.raw_records.is_empty());
    assert_eq!(no_stats.completion_percent, 0);

    let no_schema = &report.games[1];
    assert_eq!(no_schema.achievements.total_possible, 3);
    assert_eq!(no_schema.achievements.unlocked_count, 1);
    assert_eq!(no_schema.completion_percent, 33);
}

#[tokio::test]
async fn missing_player_entry_is_not_an_error() {
    let mut api = FakeSteam::with_games(vec![]);
    api.summary = None;

    let report = ReportAggregator::new(api)
        .fetch_report(STEAM_ID, Period::Monthly)
        .await
        .unwrap();
    assert_eq!(report.profile.steam_id, STEAM_ID);
    assert_eq!(report.profile.display_name, None);
    assert!(report.games.is_empty());
    assert_eq!(report.most_played_game, None);
}

#[tokio::test]
async fn recent_unlock_count_mode() {
    let now = Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap();
    let ts = now.timestamp() as u32;
    let mut api = FakeSteam::with_games(vec![recent(5, "g", 600)]);
    api.achievements.insert(
        5,
        vec![unlocked("NEW", ts - 3600), unlocked("OLD", ts - 30 * 86_400), locked("NOPE")],
    );
    api.schemas.insert(5, 3);

    let aggregator = ReportAggregator::new(api).with_achievement_count(AchievementCount::LastTwoWeeks);
    let report = aggregator
        .fetch_report_at(STEAM_ID, Period::Weekly, now)
        .await
        .unwrap();

    assert_eq!(report.total_achievements, 1);
    assert_eq!(report.games[0].achievements.recent_unlocks.len(), 1);
    assert_eq!(report.games[0].achievements.recent_unlocks[0].apiname, "NEW");
    assert_eq!(report.total_hours, 5);
}
