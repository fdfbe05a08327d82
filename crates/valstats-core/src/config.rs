//! Configuration for valstats clients
//!
//! Every component receives its configuration explicitly through its
//! constructor. Defaults hold the production constants.

use std::time::Duration;

use crate::transport::BrowserProfile;

/// Base URL for the HenrikDev Valorant API
pub const HENRIK_BASE_URL: &str = "https://api.henrikdev.xyz/valorant";

/// Base URL for tracker.gg Riot profiles
pub const TRACKER_BASE_URL: &str = "https://api.tracker.gg/api/v2/valorant/standard/profile/riot";

/// Public site used for the Origin and Referer headers
pub const TRACKER_SITE_URL: &str = "https://tracker.gg";

/// Per-record-class cache TTLs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheTtls {
    /// Account by name and tag (default: 12h)
    pub account: Duration,
    /// MMR by region and puuid (default: 1min)
    pub mmr: Duration,
    /// Detailed account by puuid (default: 4h)
    pub detailed_account: Duration,
    /// Scraped tracker stats by name and tag (default: 30min)
    pub tracker: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            account: Duration::from_secs(12 * 60 * 60),
            mmr: Duration::from_secs(60),
            detailed_account: Duration::from_secs(4 * 60 * 60),
            tracker: Duration::from_secs(30 * 60),
        }
    }
}

/// Configuration for the HenrikDev client
#[derive(Debug, Clone)]
pub struct HenrikConfig {
    /// API key sent verbatim in the `Authorization` header
    pub api_key: String,
    /// API root (default: [`HENRIK_BASE_URL`])
    pub base_url: String,
    /// Per-request timeout (default: 10s)
    pub timeout: Duration,
}

impl Default for HenrikConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: HENRIK_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl HenrikConfig {
    /// Default configuration with the given API key
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }
}

/// Body substrings used to classify scraped responses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeMarkers {
    /// Any of these means the request was blocked or rate limited
    pub blocked: Vec<String>,
    /// Present when the profile owner hid their stats
    pub private_profile: String,
}

impl Default for ScrapeMarkers {
    fn default() -> Self {
        Self {
            blocked: vec![
                "scrape our website".to_string(),
                "You are being rate lim".to_string(),
            ],
            private_profile: "CollectorResultStatus::Private".to_string(),
        }
    }
}

/// Configuration for the tracker.gg client
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Profile API root (default: [`TRACKER_BASE_URL`])
    pub base_url: String,
    /// Site root for Origin and Referer (default: [`TRACKER_SITE_URL`])
    pub site_url: String,
    /// Maximum fetch attempts per lookup (default: 5)
    pub max_attempts: u32,
    /// Sleep after a blocked response (default: 1s)
    pub blocked_backoff: Duration,
    /// Per-request timeout (default: 10s)
    pub timeout: Duration,
    /// Response classification markers
    pub markers: ScrapeMarkers,
    /// Transport identity presented to the upstream
    pub profile: BrowserProfile,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            base_url: TRACKER_BASE_URL.to_string(),
            site_url: TRACKER_SITE_URL.to_string(),
            max_attempts: 5,
            blocked_backoff: Duration::from_secs(1),
            timeout: Duration::from_secs(10),
            markers: ScrapeMarkers::default(),
            profile: BrowserProfile::default(),
        }
    }
}

/// Configuration for the lookup service
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    /// Pause before each progress step so updates stay readable (default: none)
    pub step_delay: Duration,
}
