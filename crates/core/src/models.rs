//! Shared data models: raw Steam API payloads and the canonical report

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Player entry from `ISteamUser/GetPlayerSummaries`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub steamid: String,
    #[serde(default)]
    pub personaname: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub avatarmedium: Option<String>,
    #[serde(default)]
    pub avatarfull: Option<String>,
}

impl PlayerSummary {
    /// Largest avatar Steam returned, falling back to the smaller sizes
    pub fn best_avatar(&self) -> Option<&str> {
        [&self.avatarfull, &self.avatarmedium, &self.avatar]
            .into_iter()
            .filter_map(|a| a.as_deref())
            .find(|a| !a.is_empty())
    }
}

/// Game entry from `IPlayerService/GetRecentlyPlayedGames`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentGame {
    pub appid: u64,
    #[serde(default)]
    pub name: String,
    /// Minutes played in the last two weeks
    #[serde(default)]
    pub playtime_2weeks: u32,
    #[serde(default)]
    pub playtime_forever: u32,
    #[serde(default)]
    pub img_icon_url: Option<String>,
    #[serde(default)]
    pub img_logo_url: Option<String>,
}

impl RecentGame {
    pub fn icon_hash(&self) -> Option<&str> {
        [&self.img_icon_url, &self.img_logo_url]
            .into_iter()
            .filter_map(|h| h.as_deref())
            .find(|h| !h.is_empty())
    }
}

/// Achievement progress from Steam API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub apiname: String,
    #[serde(default)]
    pub achieved: u8,
    #[serde(default)]
    pub unlocktime: u32,
}

impl Achievement {
    pub fn is_unlocked(&self) -> bool {
        self.achieved == 1
    }
}

/// Achievement definition from Steam schema API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementSchema {
    pub name: String,
    #[serde(rename = "displayName", default)]
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub icongray: String,
}

/// Report period. Steam only exposes a 14 day sample; the other periods scale it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Period {
    #[default]
    #[serde(rename = "2weeks")]
    TwoWeeks,
    #[serde(rename = "weekly")]
    Weekly,
    #[serde(rename = "monthly")]
    Monthly,
}

impl Period {
    pub fn label(&self) -> &'static str {
        match self {
            Period::TwoWeeks => "Last 14 days",
            Period::Weekly => "Estimated last 7 days",
            Period::Monthly => "Estimated last 30 days",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Period::TwoWeeks => "14-Days Steam Report",
            Period::Weekly => "Weekly Steam Report (Estimated)",
            Period::Monthly => "Monthly Steam Report (Estimated)",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::TwoWeeks => "2weeks",
            Period::Weekly => "weekly",
            Period::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "2weeks" | "two-weeks" | "14d" => Ok(Period::TwoWeeks),
            "weekly" | "week" => Ok(Period::Weekly),
            "monthly" | "month" => Ok(Period::Monthly),
            other => Err(format!("unknown period '{}' (expected 2weeks, weekly or monthly)", other)),
        }
    }
}

/// Which achievement count the report headline shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AchievementCount {
    /// Every unlocked achievement in the recently played games
    #[default]
    AllTime,
    /// Only achievements unlocked inside the 14 day window
    LastTwoWeeks,
}

/// Player profile as shown on the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub steam_id: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl PlayerProfile {
    pub fn from_summary(steam_id: &str, summary: Option<&PlayerSummary>) -> Self {
        Self {
            steam_id: steam_id.to_string(),
            display_name: summary
                .and_then(|s| s.personaname.clone())
                .filter(|n| !n.is_empty()),
            avatar_url: summary.and_then(|s| s.best_avatar()).map(str::to_string),
        }
    }
}

/// One recently played game, normalized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameActivity {
    pub appid: u64,
    pub name: String,
    pub recent_minutes: u32,
    pub icon_url: Option<String>,
}

/// Achievement progress for one game
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AchievementSet {
    pub total_possible: u32,
    pub unlocked_count: u32,
    /// Unlocks inside the 14 day window, in record order
    pub recent_unlocks: Vec<Achievement>,
    pub raw_records: Vec<Achievement>,
}

/// Game activity joined with its achievement progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameDetail {
    #[serde(flatten)]
    pub activity: GameActivity,
    /// Recent playtime rounded to whole hours
    pub hours: u32,
    pub achievements: AchievementSet,
    pub completion_percent: u8,
}

impl GameDetail {
    pub fn name(&self) -> &str {
        &self.activity.name
    }
}

/// The canonical report, built fresh per request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub profile: PlayerProfile,
    pub period: Period,
    pub period_label: String,
    /// Sorted by hours, descending; ties keep fetch order
    pub games: Vec<GameDetail>,
    pub total_hours: u32,
    pub total_achievements: u32,
    pub most_played_game: Option<String>,
}
