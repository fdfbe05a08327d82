//! tracker.gg scraping client
//!
//! tracker.gg serves profile statistics as JSON but actively blocks
//! automated clients. Block pages arrive as ordinary bodies containing
//! recognizable markers rather than HTTP error codes, so every response is
//! classified by content:
//! - transport failure: logged, next attempt immediately
//! - blocked marker: back off, next attempt
//! - anything else: parsed and returned
//!
//! Results (including private profiles) are cached for the tracker TTL.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error, warn};

use crate::cache::{keys, read_record, write_record, CacheStore};
use crate::config::TrackerConfig;
use crate::error::{Result, StatsError};
use crate::parser::{contains_any, parse_tracker_stats};
use crate::transport::{ReqwestTransport, Transport};
use crate::types::TrackerStatsRecord;

/// Scraping client for tracker.gg profiles
pub struct TrackerClient {
    transport: Arc<dyn Transport>,
    config: TrackerConfig,
    ttl: Duration,
    cache: Arc<dyn CacheStore>,
}

impl TrackerClient {
    /// Create a client using the reqwest transport for `config.profile`
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created
    pub fn new(config: TrackerConfig, ttl: Duration, cache: Arc<dyn CacheStore>) -> Result<Self> {
        let transport = ReqwestTransport::new(&config.profile, config.timeout)?;
        Ok(Self::with_transport(config, ttl, cache, Arc::new(transport)))
    }

    /// Create a client with a custom transport.
    ///
    /// This is useful for testing or for a TLS stack able to replay the
    /// configured fingerprint.
    pub fn with_transport(
        config: TrackerConfig,
        ttl: Duration,
        cache: Arc<dyn CacheStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            transport,
            config,
            ttl,
            cache,
        }
    }

    /// Aggregate statistics for a Riot ID.
    ///
    /// # Returns
    /// * `Ok(TrackerStatsRecord)`; `is_private` is set for hidden profiles
    /// * `Err(StatsError::RetriesExhausted)` if every attempt was blocked or failed
    /// * `Err(StatsError::Parse)` if an unblocked response has no stats
    pub async fn get_player_stats(&self, name: &str, tag: &str) -> Result<TrackerStatsRecord> {
        let key = keys::tracker(name, tag);
        if let Some(stats) = read_record(self.cache.as_ref(), &key).await {
            return Ok(stats);
        }

        let stats = self.fetch_with_retry(name, tag).await?;
        write_record(self.cache.as_ref(), &key, &stats, self.ttl).await;
        Ok(stats)
    }

    async fn fetch_with_retry(&self, name: &str, tag: &str) -> Result<TrackerStatsRecord> {
        let url = self.profile_api_url(name, tag);
        let headers = self.request_headers(name, tag);
        let markers = &self.config.markers;

        for attempt in 1..=self.config.max_attempts {
            debug!(
                %url,
                attempt,
                profile = self.transport.profile_name(),
                "tracker request"
            );

            let response = match self.transport.get(&url, &headers).await {
                Ok(response) => response,
                Err(e) => {
                    error!(attempt, error = %e, "Failed to fetch player data");
                    continue;
                }
            };

            if contains_any(&response.body, &markers.blocked) {
                if attempt < self.config.max_attempts {
                    warn!(attempt, status = response.status, "Rate limited, retrying");
                    sleep(self.config.blocked_backoff).await;
                } else {
                    warn!(attempt, status = response.status, "Rate limited on final attempt");
                }
                continue;
            }

            return parse_tracker_stats(&response.body, &markers.private_profile);
        }

        Err(StatsError::RetriesExhausted {
            attempts: self.config.max_attempts,
        })
    }

    fn riot_id_path(name: &str, tag: &str) -> String {
        format!(
            "{}%23{}",
            urlencoding::encode(name),
            urlencoding::encode(tag)
        )
    }

    fn profile_api_url(&self, name: &str, tag: &str) -> String {
        format!("{}/{}", self.config.base_url, Self::riot_id_path(name, tag))
    }

    /// Browser-like request headers for a profile fetch.
    ///
    /// User-Agent and Accept-Language come from the transport identity.
    fn request_headers(&self, name: &str, tag: &str) -> Vec<(String, String)> {
        let site = self.config.site_url.as_str();
        let referer = format!(
            "{}/valorant/profile/riot/{}/overview",
            site,
            Self::riot_id_path(name, tag)
        );

        [
            ("Accept", "application/json".to_string()),
            ("Origin", site.to_string()),
            ("Referer", referer),
            ("Sec-Fetch-Dest", "empty".to_string()),
            ("Sec-Fetch-Mode", "cors".to_string()),
            ("Sec-Fetch-Site", "cross-site".to_string()),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
    }
}
