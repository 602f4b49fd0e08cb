//! Core shared types for SteamWrap
//!
//! This crate contains:
//! - Raw Steam Web API payload types and the canonical report model
//! - Normalization of fetched data into a `Report`
//! - Error types

pub mod models;
pub mod report;
pub mod error;

pub use models::*;
pub use report::*;
pub use error::*;
