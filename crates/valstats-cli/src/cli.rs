//! Command-line arguments and client construction

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use valstats_core::{
    CacheStore, CacheTtls, HenrikClient, HenrikConfig, InMemoryCacheStore, RedisCacheStore,
    RedisConfig, RiotId, ServiceConfig, StatsService, TrackerClient, TrackerConfig,
};

/// Look up Valorant rank and tracker.gg statistics for a Riot ID
#[derive(Parser, Debug)]
#[command(name = "valstats", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// HenrikDev API key
    #[arg(long, env = "HENRIKDEV_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Redis connection URL; an in-process cache is used when unset
    #[arg(long, env = "REDIS_URL", hide_env_values = true)]
    pub redis_url: Option<String>,

    /// Prefix for every Redis key
    #[arg(long, env = "REDIS_PREFIX", default_value = "")]
    pub redis_prefix: String,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Pause before each progress step, in milliseconds
    #[arg(long, default_value_t = 0)]
    pub step_delay_ms: u64,

    /// tracker.gg attempts before giving up
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_attempts: u32,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Current competitive rank, RR and player card
    Rank {
        /// Player in `name#tag` form
        riot_id: RiotId,
    },
    /// Aggregate match statistics from tracker.gg
    Tracker {
        /// Player in `name#tag` form
        riot_id: RiotId,
    },
}

impl Cli {
    /// Open the configured cache backend.
    pub async fn cache(&self) -> Result<Arc<dyn CacheStore>> {
        match &self.redis_url {
            Some(url) => {
                let store = RedisCacheStore::connect(RedisConfig {
                    url: url.clone(),
                    prefix: self.redis_prefix.clone(),
                    ..RedisConfig::default()
                })
                .await
                .context("failed to connect to Redis")?;
                Ok(Arc::new(store))
            }
            None => {
                info!("REDIS_URL not set, using in-memory cache");
                Ok(Arc::new(InMemoryCacheStore::new()))
            }
        }
    }

    /// Build the lookup service over `cache`.
    pub fn service(&self, cache: Arc<dyn CacheStore>) -> Result<StatsService> {
        let api_key = self.api_key.clone().unwrap_or_default();
        if api_key.is_empty() {
            warn!("no HenrikDev API key configured");
        }

        let ttls = CacheTtls::default();
        let henrik = HenrikClient::new(
            HenrikConfig::with_api_key(api_key),
            ttls.clone(),
            Arc::clone(&cache),
        )
        .context("failed to build HenrikDev client")?;

        let tracker_config = TrackerConfig {
            max_attempts: self.max_attempts,
            ..TrackerConfig::default()
        };
        let tracker = TrackerClient::new(tracker_config, ttls.tracker, cache)
            .context("failed to build tracker.gg client")?;

        let config = ServiceConfig {
            step_delay: Duration::from_millis(self.step_delay_ms),
        };
        Ok(StatsService::new(henrik, tracker, config))
    }
}
