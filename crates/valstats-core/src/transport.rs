//! Transport identity for scraped upstreams
//!
//! tracker.gg fingerprints clients at the TLS and header level. The scraping
//! client only depends on the [`Transport`] trait; [`ReqwestTransport`] is
//! the default implementation, configured from a [`BrowserProfile`].
//! Implementations backed by a TLS stack able to replay a JA3 fingerprint
//! can honor [`BrowserProfile::ja3`] directly.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::{Result, StatsError};

/// Default User-Agent mimicking desktop Opera on Chromium
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36 OPR/109.0.0.0";

/// Default Accept-Language header
const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// JA3 string of the Chromium build matching [`DEFAULT_USER_AGENT`]
const DEFAULT_JA3: &str = "771,4865-4866-4867-49195-49199-49196-49200-52393-52392-49171-49172-156-157-47-53,18-13-65281-65037-35-23-27-5-43-45-16-17513-51-10-0-11-21,29-23-24,0";

/// Browser identity presented to a scraped upstream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserProfile {
    /// Human-readable profile name, used in logs
    pub name: String,
    pub user_agent: String,
    pub accept_language: String,
    /// JA3 fingerprint string of the imitated browser
    pub ja3: String,
    /// Refuse TLS below 1.2, as current browsers do
    pub tls12_floor: bool,
    /// Stay on HTTP/1.1 instead of negotiating HTTP/2
    pub http1_only: bool,
    /// Keep cookies between attempts
    pub cookie_store: bool,
}

impl Default for BrowserProfile {
    fn default() -> Self {
        Self::chromium_desktop()
    }
}

impl BrowserProfile {
    /// Desktop Chromium (Opera 109 on Windows)
    pub fn chromium_desktop() -> Self {
        Self {
            name: "chromium-desktop".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            ja3: DEFAULT_JA3.to_string(),
            tls12_floor: true,
            http1_only: false,
            cookie_store: true,
        }
    }
}

/// Body and status of a completed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Issues GET requests under a fixed transport identity.
///
/// Errors returned from [`Transport::get`] are transport-level failures;
/// any response that arrived, whatever its status, is `Ok`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Name of the identity in use
    fn profile_name(&self) -> &str;

    async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<TransportResponse>;
}

/// reqwest-backed transport
///
/// Approximates the browser identity through User-Agent, TLS floor,
/// compression and cookie behavior. reqwest cannot replay a JA3 string.
pub struct ReqwestTransport {
    client: reqwest::Client,
    profile_name: String,
}

impl ReqwestTransport {
    /// Build a client for `profile`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created
    pub fn new(profile: &BrowserProfile, timeout: Duration) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        let language = HeaderValue::from_str(&profile.accept_language)
            .map_err(|e| StatsError::Transport(format!("invalid Accept-Language: {}", e)))?;
        default_headers.insert(reqwest::header::ACCEPT_LANGUAGE, language);

        let mut builder = reqwest::Client::builder()
            .user_agent(profile.user_agent.as_str())
            .default_headers(default_headers)
            .cookie_store(profile.cookie_store)
            .gzip(true)
            .brotli(true)
            .timeout(timeout);

        if profile.tls12_floor {
            builder = builder.min_tls_version(reqwest::tls::Version::TLS_1_2);
        }
        if profile.http1_only {
            builder = builder.http1_only();
        }

        Ok(Self {
            client: builder.build()?,
            profile_name: profile.name.clone(),
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    fn profile_name(&self) -> &str {
        &self.profile_name
    }

    async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<TransportResponse> {
        let mut header_map = HeaderMap::new();
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| StatsError::Transport(format!("invalid header name {}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| StatsError::Transport(format!("invalid header value: {}", e)))?;
            header_map.insert(name, value);
        }

        let response = self.client.get(url).headers(header_map).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(TransportResponse { status, body })
    }
}
