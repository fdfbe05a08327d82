//! HenrikDev API client
//!
//! Fetches account, MMR and detailed-account records. Every lookup is
//! cache-aside: the cache is consulted first, and a successful upstream
//! response is written back with its record-class TTL before it is returned.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::cache::{keys, read_record, write_record, CacheStore};
use crate::config::{CacheTtls, HenrikConfig};
use crate::error::Result;
use crate::parser::decode_envelope;
use crate::types::{AccountRecord, DetailedAccountRecord, RankRecord};

/// Client for the HenrikDev Valorant API
pub struct HenrikClient {
    client: reqwest::Client,
    config: HenrikConfig,
    ttls: CacheTtls,
    cache: Arc<dyn CacheStore>,
}

impl HenrikClient {
    /// Create a new client
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created
    pub fn new(config: HenrikConfig, ttls: CacheTtls, cache: Arc<dyn CacheStore>) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            config,
            ttls,
            cache,
        })
    }

    /// Account by Riot ID, cached for `ttls.account`
    pub async fn get_account(&self, name: &str, tag: &str) -> Result<AccountRecord> {
        let path = format!(
            "/v2/account/{}/{}",
            urlencoding::encode(name),
            urlencoding::encode(tag)
        );
        self.cached_fetch(&keys::account(name, tag), &path, self.ttls.account)
            .await
    }

    /// Competitive standing by region and puuid, cached for `ttls.mmr`
    pub async fn get_mmr(&self, region: &str, puuid: &str) -> Result<RankRecord> {
        let path = format!(
            "/v2/by-puuid/mmr/{}/{}",
            urlencoding::encode(region),
            urlencoding::encode(puuid)
        );
        self.cached_fetch(&keys::mmr(region, puuid), &path, self.ttls.mmr)
            .await
    }

    /// Detailed account by puuid, cached for `ttls.detailed_account`
    pub async fn get_detailed_account(&self, puuid: &str) -> Result<DetailedAccountRecord> {
        let path = format!("/v2/by-puuid/account/{}", urlencoding::encode(puuid));
        self.cached_fetch(
            &keys::detailed_account(puuid),
            &path,
            self.ttls.detailed_account,
        )
        .await
    }

    async fn cached_fetch<T>(&self, key: &str, path: &str, ttl: Duration) -> Result<T>
    where
        T: DeserializeOwned + Serialize,
    {
        if let Some(record) = read_record(self.cache.as_ref(), key).await {
            return Ok(record);
        }

        let record: T = self.request(path).await?;
        write_record(self.cache.as_ref(), key, &record, ttl).await;
        Ok(record)
    }

    async fn request<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.config.base_url, path);
        debug!(%url, "HenrikDev request");

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, self.config.api_key.as_str())
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        decode_envelope(status, &body)
    }
}
