//! Report aggregation against the Steam Web API
//!
//! Fans out the profile, recent-activity and per-game achievement requests
//! and normalizes the results into a `steamwrap_core::Report`.

pub mod aggregator;
pub mod steam_api;

pub use aggregator::{parse_steam_id, ReportAggregator};
pub use steam_api::{ApiError, SteamApi, SteamWebApi, DEFAULT_API_BASE};
