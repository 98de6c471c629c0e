// SPDX-License-Identifier: GPL-3.0-or-later

use std::time::Duration;

use async_trait::async_trait;
use moka::sync::Cache;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, instrument, trace};
use trackimport_config::HttpConfig;
use url::Url;

use crate::error::{HttpError, Result};
use crate::rate_limiter::RateLimiter;
use crate::request::{DownloadedImage, HttpRequest};

const USER_AGENT: &str = concat!("trackimport/", env!("CARGO_PKG_VERSION"));

/// Request/response channel used by the importers.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send a GET request and return the body of a successful response.
    async fn fetch(&self, request: &HttpRequest) -> Result<Vec<u8>>;
}

/// Fetches cover art pictures.
#[async_trait]
pub trait ImageDownloader: Send + Sync {
    async fn download(&self, url: &str) -> Result<DownloadedImage>;
}

/// reqwest based transport with rate limiting and a response cache.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    rate_limiter: RateLimiter,
    cache: Option<Cache<String, Vec<u8>>>,
}

impl HttpClient {
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    pub fn from_config(config: &HttpConfig) -> Result<Self> {
        Self::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .rate_limit_interval(Duration::from_millis(config.min_request_interval_ms))
            .cache_capacity(config.response_cache_capacity)
            .build()
    }

    async fn get(&self, url: Url, headers: &[(String, String)]) -> Result<reqwest::Response> {
        let host = url.host_str().unwrap_or_default().to_string();
        let _permit = self.rate_limiter.acquire(&host).await?;

        trace!(target: "http", "GET {}", url);

        let mut builder = self.client.get(url.clone());
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let response = builder.send().await?;

        let status = response.status();
        debug!(target: "http", url = %url, status = %status, "response received");

        if !status.is_success() {
            return Err(HttpError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl HttpTransport for HttpClient {
    #[instrument(skip(self, request), fields(host = %request.host))]
    async fn fetch(&self, request: &HttpRequest) -> Result<Vec<u8>> {
        let url = request.url()?;
        let key = request.cache_key()?;
        if let Some(cached) = self.cache.as_ref().and_then(|c| c.get(&key)) {
            trace!(target: "http", url = %url, "response served from cache");
            return Ok(cached);
        }

        let body = self.get(url, &request.headers).await?.bytes().await?.to_vec();
        trace!(target: "http", bytes = body.len(), "response body received");

        if let Some(cache) = &self.cache {
            cache.insert(key, body.clone());
        }
        Ok(body)
    }
}

#[async_trait]
impl ImageDownloader for HttpClient {
    #[instrument(skip(self))]
    async fn download(&self, url: &str) -> Result<DownloadedImage> {
        let parsed = Url::parse(url).map_err(|e| HttpError::InvalidUrl(format!("{url}: {e}")))?;
        let response = self.get(parsed, &[]).await?;
        let mime_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
            .unwrap_or_default();
        let data = response.bytes().await?.to_vec();
        debug!(target: "http", bytes = data.len(), mime = %mime_type, "image downloaded");

        Ok(DownloadedImage {
            data,
            mime_type,
            url: url.to_string(),
        })
    }
}

/// Builder for configuring an [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    user_agent: String,
    rate_limit_interval: Duration,
    cache_capacity: u64,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: USER_AGENT.to_string(),
            rate_limit_interval: Duration::from_secs(1),
            cache_capacity: 256,
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set rate limit interval between requests.
    pub fn rate_limit_interval(mut self, interval: Duration) -> Self {
        self.rate_limit_interval = interval;
        self
    }

    /// Number of cached responses, 0 disables caching.
    pub fn cache_capacity(mut self, capacity: u64) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn build(self) -> Result<HttpClient> {
        let client = Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .build()?;

        Ok(HttpClient {
            client,
            rate_limiter: RateLimiter::new(self.rate_limit_interval),
            cache: (self.cache_capacity > 0).then(|| Cache::new(self.cache_capacity)),
        })
    }
}
