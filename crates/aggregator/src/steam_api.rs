//! Steam Web API calls used by the report aggregator

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use steamwrap_core::{Achievement, AchievementSchema, PlayerSummary, RecentGame};
use thiserror::Error;

pub const DEFAULT_API_BASE: &str = "https://api.steampowered.com";

const API_PLAYER_SUMMARIES: &str = "/ISteamUser/GetPlayerSummaries/v2/";
const API_RECENTLY_PLAYED: &str = "/IPlayerService/GetRecentlyPlayedGames/v1/";
const API_ACHIEVEMENTS: &str = "/ISteamUserStats/GetPlayerAchievements/v0001/";
const API_SCHEMA: &str = "/ISteamUserStats/GetSchemaForGame/v2/";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Steam API returned HTTP {status}")]
    Status { status: u16 },

    #[error("unexpected payload: {0}")]
    Decode(String),
}

/// The four Steam endpoints a report is built from
#[async_trait]
pub trait SteamApi: Send + Sync {
    /// `None` when Steam knows no player with this id
    async fn player_summary(&self, steam_id: u64) -> Result<Option<PlayerSummary>, ApiError>;

    async fn recently_played(&self, steam_id: u64) -> Result<Vec<RecentGame>, ApiError>;

    async fn player_achievements(&self, steam_id: u64, appid: u64) -> Result<Vec<Achievement>, ApiError>;

    async fn achievement_schema(&self, appid: u64) -> Result<Vec<AchievementSchema>, ApiError>;
}

/// `SteamApi` over HTTP. The key is supplied by the caller, never read from the environment.
#[derive(Clone)]
pub struct SteamWebApi {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl SteamWebApi {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: DEFAULT_API_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self, path: &str, params: &[(&str, String)]) -> String {
        let mut url = format!("{}{}?key={}&format=json", self.base_url, path, urlencoding::encode(&self.api_key));
        for (name, value) in params {
            url.push('&');
            url.push_str(name);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    async fn get_json(&self, path: &'static str, params: &[(&str, String)]) -> Result<serde_json::Value, ApiError> {
        let url = self.url(path, params);
        tracing::debug!(endpoint = path, "Steam API request");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status { status: status.as_u16() });
        }

        let body: serde_json::Value = response.json().await?;
        Ok(body)
    }
}

/// Lenient array parse: entries that don't match `T` are skipped
fn parse_array<T: DeserializeOwned>(value: &serde_json::Value) -> Vec<T> {
    value
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|v| serde_json::from_value(v.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

fn require_object<'a>(body: &'a serde_json::Value, key: &str) -> Result<&'a serde_json::Value, ApiError> {
    let value = &body[key];
    if value.is_object() {
        Ok(value)
    } else {
        Err(ApiError::Decode(format!("missing '{}' object", key)))
    }
}

#[async_trait]
impl SteamApi for SteamWebApi {
    async fn player_summary(&self, steam_id: u64) -> Result<Option<PlayerSummary>, ApiError> {
        let body = self
            .get_json(API_PLAYER_SUMMARIES, &[("steamids", steam_id.to_string())])
            .await?;
        let response = require_object(&body, "response")?;
        let players: Vec<PlayerSummary> = parse_array(&response["players"]);
        Ok(players.into_iter().next())
    }

    async fn recently_played(&self, steam_id: u64) -> Result<Vec<RecentGame>, ApiError> {
        let body = self
            .get_json(API_RECENTLY_PLAYED, &[("steamid", steam_id.to_string())])
            .await?;
        // Private profiles answer with an empty `response` object
        let response = require_object(&body, "response")?;
        Ok(parse_array(&response["games"]))
    }

    async fn player_achievements(&self, steam_id: u64, appid: u64) -> Result<Vec<Achievement>, ApiError> {
        let body = self
            .get_json(
                API_ACHIEVEMENTS,
                &[("steamid", steam_id.to_string()), ("appid", appid.to_string())],
            )
            .await?;
        Ok(parse_array(&body["playerstats"]["achievements"]))
    }

    async fn achievement_schema(&self, appid: u64) -> Result<Vec<AchievementSchema>, ApiError> {
        let body = self
            .get_json(API_SCHEMA, &[("appid", appid.to_string())])
            .await?;
        Ok(parse_array(&body["game"]["availableGameStats"]["achievements"]))
    }
}
