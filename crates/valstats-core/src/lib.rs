//! valstats Core Library
//!
//! This crate provides the lookup pipeline behind valstats: Valorant rank
//! data from the HenrikDev API and aggregate match statistics scraped from
//! tracker.gg.
//!
//! # Features
//! - Dependent account, MMR and detailed-account lookups
//! - Read-through caching with per-record TTLs (in-memory or Redis)
//! - Block-aware retry with a browser-like transport identity
//! - Live progress reporting with exactly one terminal event per lookup

pub mod cache;
pub mod config;
pub mod error;
pub mod henrik;
pub mod parser;
pub mod progress;
pub mod service;
pub mod tracker;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use cache::{CacheStore, InMemoryCacheStore, RedisCacheStore, RedisConfig};
pub use config::{CacheTtls, HenrikConfig, ScrapeMarkers, ServiceConfig, TrackerConfig};
pub use error::{CacheError, LookupError, LookupStage, Result, StatsError};
pub use henrik::HenrikClient;
pub use progress::{ProgressEvent, ProgressRenderer, ProgressTracker};
pub use service::StatsService;
pub use tracker::TrackerClient;
pub use transport::{BrowserProfile, ReqwestTransport, Transport, TransportResponse};
pub use types::{
    AccountRecord, Card, DetailedAccountRecord, RankRecord, RankView, RiotId, TrackerStatsRecord,
};
