//! HTTP plumbing: the transport seam and the per-request header template

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use std::time::Duration;
use tracing::debug;

use crate::config::Config;
use crate::error::Result;

/// One GET with an explicit header set, returning the raw body.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, url: &str, headers: HeaderMap) -> Result<Vec<u8>>;
}

/// Transport backed by a single long lived reqwest client.
pub struct HttpSession {
    client: Client,
}

impl HttpSession {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpSession {
    async fn fetch(&self, url: &str, headers: HeaderMap) -> Result<Vec<u8>> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .headers(headers)
            .send()
            .await?
            .error_for_status()?;
        let body = response.bytes().await?;
        debug!("GET {} -> {} bytes", url, body.len());
        Ok(body.to_vec())
    }
}

/// Headers every request starts from. Call specific headers are layered on a
/// fresh copy so nothing set for one request reaches the next one.
#[derive(Debug, Clone)]
pub struct HeaderTemplate {
    base: HeaderMap,
}

impl HeaderTemplate {
    pub fn new(user_agent: &str) -> Result<Self> {
        let mut base = HeaderMap::new();
        base.insert(USER_AGENT, HeaderValue::from_str(user_agent)?);
        Ok(Self { base })
    }

    pub fn base(&self) -> HeaderMap {
        self.base.clone()
    }

    pub fn with(&self, overrides: &[(HeaderName, &str)]) -> Result<HeaderMap> {
        let mut headers = self.base.clone();
        for (name, value) in overrides {
            headers.insert(name.clone(), HeaderValue::from_str(value)?);
        }
        Ok(headers)
    }
}
