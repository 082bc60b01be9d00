use std::time::Duration;

use async_trait::async_trait;
use crawl_common::CrawlError;

use crate::ports::{FetchResponse, UrlGetter};

/// `reqwest`-backed `UrlGetter`, grounded on the reference repo's
/// `HttpIngestor` HTTP client wiring: a single shared client with a
/// per-request timeout bound, built once at startup.
pub struct ReqwestUrlGetter {
    client: reqwest::Client,
}

impl ReqwestUrlGetter {
    pub fn new(timeout: Duration) -> Result<Self, CrawlError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CrawlError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl UrlGetter for ReqwestUrlGetter {
    async fn get(&self, url: &str) -> Result<Option<FetchResponse>, CrawlError> {
        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => return Err(CrawlError::Fetch(e.to_string())),
        };

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let body = response
            .bytes()
            .await
            .map_err(|e| CrawlError::Fetch(e.to_string()))?
            .to_vec();

        Ok(Some(FetchResponse {
            status,
            content_type,
            body,
        }))
    }
}
