//! Error types for valstats
//!
//! This module defines all error types used throughout the library.
//! A cache miss is not an error: `CacheStore::get` returns `Ok(None)`.
//! Errors implement Serialize (as their display string) so front ends can
//! ship them as JSON.

use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Errors raised by a cache backend
#[derive(Error, Debug)]
pub enum CacheError {
    /// The backend could not be reached
    #[error("cache connection failed: {0}")]
    Connection(String),

    /// A single-key command failed on an established connection
    #[error("cache command failed for key {key}: {message}")]
    Command { key: String, message: String },

    /// The store was closed and no longer accepts operations
    #[error("cache store is closed")]
    Closed,
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_refusal() || err.is_connection_dropped() || err.is_io_error() {
            CacheError::Connection(err.to_string())
        } else {
            CacheError::Command {
                key: String::new(),
                message: err.to_string(),
            }
        }
    }
}

/// Error type for valstats lookups
#[derive(Error, Debug)]
pub enum StatsError {
    /// Cache backend failure (connection or command)
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// HTTP request failed at the network level
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Transport-level failure reported by a scraping transport
    #[error("Transport failed: {0}")]
    Transport(String),

    /// Upstream answered with a non-200 status
    #[error("Upstream returned status {status}: {message}")]
    UpstreamStatus { status: u16, message: String },

    /// Payload did not have the expected shape
    #[error("Failed to parse payload: {0}")]
    Parse(String),

    /// Every scraping attempt was blocked or failed
    #[error("Gave up after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    /// Player identifier is not in `name#tag` form
    #[error("Invalid Riot ID: {0}")]
    InvalidRiotId(String),
}

impl StatsError {
    /// Whether the upstream reported the requested record as missing
    pub fn is_not_found(&self) -> bool {
        match self {
            StatsError::UpstreamStatus { status, message } => {
                *status == 404 || message.to_lowercase().contains("not found")
            }
            _ => false,
        }
    }
}

impl From<serde_json::Error> for StatsError {
    fn from(err: serde_json::Error) -> Self {
        StatsError::Parse(err.to_string())
    }
}

/// Serialize StatsError as a string
impl Serialize for StatsError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Result type alias for valstats operations
pub type Result<T> = std::result::Result<T, StatsError>;

/// Shown when the account lookup reports the Riot ID as unknown
pub const NOT_FOUND_MESSAGE: &str = "Account with this Riot ID not found";

/// Shown for every other failure
pub const GENERIC_MESSAGE: &str = "There was an error. Please try again later.";

/// Pipeline step at which a lookup failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LookupStage {
    Account,
    Mmr,
    TrackerStats,
}

impl fmt::Display for LookupStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            LookupStage::Account => "error fetching account data",
            LookupStage::Mmr => "error fetching rank data",
            LookupStage::TrackerStats => "error fetching tracker data",
        };
        f.write_str(stage)
    }
}

/// Fatal lookup failure, classified for display
///
/// `user_message` is safe to show; the source error is internal detail.
#[derive(Error, Debug)]
#[error("{stage}: {source}")]
pub struct LookupError {
    pub stage: LookupStage,
    pub user_message: String,
    #[source]
    pub source: StatsError,
}

impl LookupError {
    /// Classify a client error raised at `stage`
    pub fn classify(stage: LookupStage, source: StatsError) -> Self {
        let user_message = if stage == LookupStage::Account && source.is_not_found() {
            NOT_FOUND_MESSAGE
        } else {
            GENERIC_MESSAGE
        };

        Self {
            stage,
            user_message: user_message.to_string(),
            source,
        }
    }
}
