//! Key/value cache with per-entry expiry
//!
//! Both fetch clients read through a [`CacheStore`]. A miss is `Ok(None)`;
//! only backend failures are errors. Backends:
//! - `InMemoryCacheStore`: process-local map, used for tests and when no
//!   Redis address is configured
//! - `RedisCacheStore`: shared Redis instance
//!
//! | Record | Key | Default TTL |
//! |--------|-----|-------------|
//! | Account | `account:{name}:{tag}` | 12h |
//! | MMR | `mmr:{region}:{puuid}` | 1min |
//! | Detailed account | `detailed_account:{puuid}` | 4h |
//! | Tracker stats | `tracker:{name}:{tag}` | 30min |

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::CacheError;

/// Result type for cache operations
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Cache keys, one prefix per record class
pub mod keys {
    pub fn account(name: &str, tag: &str) -> String {
        format!("account:{}:{}", name, tag)
    }

    pub fn mmr(region: &str, puuid: &str) -> String {
        format!("mmr:{}:{}", region, puuid)
    }

    pub fn detailed_account(puuid: &str) -> String {
        format!("detailed_account:{}", puuid)
    }

    pub fn tracker(name: &str, tag: &str) -> String {
        format!("tracker:{}:{}", name, tag)
    }
}

/// Single-key store with expiry
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Value under `key`, or `None` on a miss or after expiry
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Store `value` under `key` for `ttl`
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<()>;

    /// Release the backend; later operations fail with `CacheError::Closed`
    async fn close(&self) -> CacheResult<()>;
}

/// Decoded cache entry, or `None` on a miss.
///
/// Read failures and undecodable entries are logged and treated as misses so
/// the caller falls through to the upstream.
pub async fn read_record<T: DeserializeOwned>(cache: &dyn CacheStore, key: &str) -> Option<T> {
    match cache.get(key).await {
        Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
            Ok(record) => {
                debug!(key, "cache hit");
                Some(record)
            }
            Err(e) => {
                warn!(key, error = %e, "discarding undecodable cache entry");
                None
            }
        },
        Ok(None) => {
            debug!(key, "cache miss");
            None
        }
        Err(e) => {
            warn!(key, error = %e, "cache read failed");
            None
        }
    }
}

/// Store `record` under `key`; failures are logged, not returned.
pub async fn write_record<T: Serialize>(
    cache: &dyn CacheStore,
    key: &str,
    record: &T,
    ttl: Duration,
) {
    let bytes = match serde_json::to_vec(record) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(key, error = %e, "failed to encode record for cache");
            return;
        }
    };

    if let Err(e) = cache.set(key, &bytes, ttl).await {
        warn!(key, error = %e, "failed to cache record");
    }
}

struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// Entry count at which `set` sweeps out expired entries
const DEFAULT_SWEEP_THRESHOLD: usize = 1024;

/// Process-local cache
///
/// Expired entries are dropped when read, and in bulk by `set` once the map
/// reaches its sweep threshold.
pub struct InMemoryCacheStore {
    entries: RwLock<HashMap<String, Entry>>,
    closed: AtomicBool,
    sweep_threshold: usize,
}

impl Default for InMemoryCacheStore {
    fn default() -> Self {
        Self::with_sweep_threshold(DEFAULT_SWEEP_THRESHOLD)
    }
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that sweeps expired entries once it holds `threshold` of them
    pub fn with_sweep_threshold(threshold: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            closed: AtomicBool::new(false),
            sweep_threshold: threshold.max(1),
        }
    }

    /// Number of live (unexpired) entries
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|e| e.expires_at > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn ensure_open(&self) -> CacheResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CacheError::Closed);
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        self.ensure_open()?;

        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Ok(Some(entry.value.clone()));
                }
                Some(_) => {}
            }
        }

        // Expired: evict unless a writer refreshed it in the meantime.
        let mut entries = self.entries.write().await;
        if entries
            .get(key)
            .is_some_and(|entry| entry.expires_at <= Instant::now())
        {
            entries.remove(key);
            debug!(key, "evicted expired cache entry");
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<()> {
        self.ensure_open()?;

        let now = Instant::now();
        let entry = Entry {
            value: value.to_vec(),
            expires_at: now + ttl,
        };

        let mut entries = self.entries.write().await;
        if entries.len() >= self.sweep_threshold {
            let before = entries.len();
            entries.retain(|_, e| e.expires_at > now);
            debug!(swept = before - entries.len(), "swept expired cache entries");
        }
        entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn close(&self) -> CacheResult<()> {
        self.closed.store(true, Ordering::Release);
        self.entries.write().await.clear();
        Ok(())
    }
}

/// Redis connection configuration
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Connection URL, e.g. "redis://:password@localhost:6379/0"
    pub url: String,
    /// Prefix prepended to every key
    pub prefix: String,
    /// Timeout for the initial connection and PING
    pub connect_timeout: Duration,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            prefix: String::new(),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// Redis-backed cache
///
/// Uses one multiplexed connection shared by all callers. Expiry is
/// delegated to Redis via PSETEX.
pub struct RedisCacheStore {
    conn: RwLock<Option<MultiplexedConnection>>,
    prefix: String,
}

impl RedisCacheStore {
    /// Connect and verify the server answers PING.
    ///
    /// # Errors
    /// `CacheError::Connection` if the URL is invalid, the server is
    /// unreachable, or it does not answer within `connect_timeout`.
    pub async fn connect(config: RedisConfig) -> CacheResult<Self> {
        let client = redis::Client::open(config.url.as_str())
            .map_err(|e| CacheError::Connection(format!("invalid Redis URL: {}", e)))?;

        let handshake = async {
            let mut conn = client.get_multiplexed_async_connection().await?;
            let _: String = redis::cmd("PING").query_async(&mut conn).await?;
            Ok::<_, redis::RedisError>(conn)
        };

        let conn = tokio::time::timeout(config.connect_timeout, handshake)
            .await
            .map_err(|_| CacheError::Connection("timed out connecting to Redis".to_string()))?
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        info!("Successfully connected to Redis");
        Ok(Self {
            conn: RwLock::new(Some(conn)),
            prefix: config.prefix,
        })
    }

    fn prefixed_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    async fn connection(&self) -> CacheResult<MultiplexedConnection> {
        self.conn.read().await.clone().ok_or(CacheError::Closed)
    }
}

fn command_error(key: &str, err: redis::RedisError) -> CacheError {
    match CacheError::from(err) {
        CacheError::Command { message, .. } => CacheError::Command {
            key: key.to_string(),
            message,
        },
        other => other,
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let mut conn = self.connection().await?;
        let prefixed = self.prefixed_key(key);

        conn.get(&prefixed)
            .await
            .map_err(|e| command_error(key, e))
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<()> {
        let mut conn = self.connection().await?;
        let prefixed = self.prefixed_key(key);
        // PSETEX rejects a zero expiry.
        let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);

        conn.pset_ex::<_, _, ()>(&prefixed, value, millis)
            .await
            .map_err(|e| command_error(key, e))
    }

    async fn close(&self) -> CacheResult<()> {
        // Dropping the last clone of the multiplexed connection ends its driver task.
        self.conn.write().await.take();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[tokio::test]
    async fn test_miss_is_none() {
        let cache = InMemoryCacheStore::new();
        assert_eq!(cache.get("account:a:b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let cache = InMemoryCacheStore::new();
        cache
            .set("mmr:na:abc", b"{}", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.get("mmr:na:abc").await.unwrap(), Some(b"{}".to_vec()));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_entry_expires_after_ttl() {
        let cache = InMemoryCacheStore::new();
        cache
            .set("mmr:na:abc", b"1", Duration::from_millis(30))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(cache.get("mmr:na:abc").await.unwrap(), None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_set_overwrites_and_refreshes_ttl() {
        let cache = InMemoryCacheStore::new();
        cache.set("k", b"old", Duration::from_millis(20)).await.unwrap();
        cache.set("k", b"new", Duration::from_secs(60)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(cache.get("k").await.unwrap(), Some(b"new".to_vec()));
    }

    #[tokio::test]
    async fn test_set_sweeps_expired_entries_past_threshold() {
        let cache = InMemoryCacheStore::with_sweep_threshold(3);
        for key in ["a", "b", "c"] {
            cache.set(key, b"v", Duration::from_millis(20)).await.unwrap();
        }
        tokio::time::sleep(Duration::from_millis(40)).await;

        cache.set("d", b"v", Duration::from_secs(60)).await.unwrap();

        let entries = cache.entries.read().await;
        assert_eq!(entries.len(), 1);
        assert!(entries.contains_key("d"));
    }

    #[tokio::test]
    async fn test_sweep_keeps_live_entries() {
        let cache = InMemoryCacheStore::with_sweep_threshold(2);
        cache.set("live", b"1", Duration::from_secs(60)).await.unwrap();
        cache.set("stale", b"2", Duration::from_millis(10)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        cache.set("new", b"3", Duration::from_secs(60)).await.unwrap();

        assert_eq!(cache.entries.read().await.len(), 2);
        assert_eq!(cache.get("live").await.unwrap(), Some(b"1".to_vec()));
    }

    #[tokio::test]
    async fn test_closed_store_rejects_operations() {
        let cache = InMemoryCacheStore::new();
        cache.set("k", b"v", Duration::from_secs(60)).await.unwrap();
        cache.close().await.unwrap();

        assert!(matches!(cache.get("k").await, Err(CacheError::Closed)));
        assert!(matches!(
            cache.set("k", b"v", Duration::from_secs(1)).await,
            Err(CacheError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_redis_connect_failure_is_surfaced() {
        let config = RedisConfig {
            // Port 1 on loopback refuses connections.
            url: "redis://127.0.0.1:1".to_string(),
            connect_timeout: Duration::from_secs(2),
            ..RedisConfig::default()
        };
        let result = RedisCacheStore::connect(config).await;
        assert!(matches!(result, Err(CacheError::Connection(_))));
    }

    #[tokio::test]
    async fn test_redis_invalid_url() {
        let config = RedisConfig {
            url: "not a url".to_string(),
            ..RedisConfig::default()
        };
        let result = RedisCacheStore::connect(config).await;
        assert!(matches!(result, Err(CacheError::Connection(msg)) if msg.contains("invalid")));
    }

    #[test]
    fn test_key_formats() {
        assert_eq!(keys::account("Player", "1234"), "account:Player:1234");
        assert_eq!(keys::mmr("na", "abc"), "mmr:na:abc");
        assert_eq!(keys::detailed_account("abc"), "detailed_account:abc");
        assert_eq!(keys::tracker("Player", "1234"), "tracker:Player:1234");
    }

    proptest! {
        #[test]
        fn prop_key_classes_never_collide(a in "[a-z0-9#:]{0,12}", b in "[a-z0-9#:]{0,12}") {
            let generated = [
                keys::account(&a, &b),
                keys::mmr(&a, &b),
                keys::detailed_account(&a),
                keys::tracker(&a, &b),
            ];
            let prefixes = ["account:", "mmr:", "detailed_account:", "tracker:"];
            for (i, key) in generated.iter().enumerate() {
                prop_assert!(key.starts_with(prefixes[i]));
                for (j, prefix) in prefixes.iter().enumerate() {
                    if i != j {
                        prop_assert!(!key.starts_with(prefix));
                    }
                }
            }
        }
    }
}
