use std::sync::Arc;

use async_trait::async_trait;
use crawl_common::CrawlError;
use crawl_pipeline::{Processor, StageContext};
use url::Url;

use crate::payload::CrawlPayload;
use crate::ports::{PrivateNetworkDetector, UrlGetter};
use crate::regexes::EXCLUSION_RE;

/// HTTP GET with safety filters: exclusion pattern, private-network
/// detection, status/content-type gating (§4.4). Every rejection here is a
/// silent drop — never a pipeline error (§7): individual URL failures are
/// the common case.
pub struct FetchProcessor {
    getter: Arc<dyn UrlGetter>,
    detector: Arc<dyn PrivateNetworkDetector>,
}

impl FetchProcessor {
    pub fn new(getter: Arc<dyn UrlGetter>, detector: Arc<dyn PrivateNetworkDetector>) -> Self {
        Self { getter, detector }
    }
}

#[async_trait]
impl Processor<CrawlPayload> for FetchProcessor {
    async fn process(
        &self,
        ctx: &StageContext,
        payload: &mut CrawlPayload,
    ) -> Result<bool, CrawlError> {
        if EXCLUSION_RE.is_match(&payload.url) {
            tracing::debug!(url = %payload.url, "dropped: excluded extension");
            return Ok(false);
        }

        let host = match Url::parse(&payload.url).ok().and_then(|u| u.host_str().map(str::to_string)) {
            Some(h) => h,
            None => {
                tracing::debug!(url = %payload.url, "dropped: unparseable URL");
                return Ok(false);
            }
        };

        if self.detector.is_private(&host).await {
            tracing::debug!(url = %payload.url, "dropped: private-network host");
            return Ok(false);
        }

        // HTTP I/O is a suspension point (§5) that must honor cancellation,
        // not just the getter's own request timeout — race the GET against
        // the shared token so a cancelled run never waits out a slow host.
        let response = tokio::select! {
            biased;
            _ = ctx.cancelled() => {
                tracing::debug!(url = %payload.url, "dropped: cancelled during fetch");
                return Ok(false);
            }
            res = self.getter.get(&payload.url) => match res {
                Ok(Some(resp)) => resp,
                Ok(None) => {
                    tracing::debug!(url = %payload.url, "dropped: null response");
                    return Ok(false);
                }
                Err(err) => {
                    tracing::debug!(url = %payload.url, error = %err, "dropped: fetch error");
                    return Ok(false);
                }
            },
        };

        let status_ok = (200..=299).contains(&response.status);
        // Case-sensitive substring match, matching the original's literal
        // `strings.Contains(contentType, "html")` (proc_link_fetcher.go:95)
        // — §12 resolution for spec.md:98's case-ambiguous wording.
        let content_type_ok = response.content_type.contains("html");
        if !status_ok || !content_type_ok {
            tracing::debug!(
                url = %payload.url,
                status = response.status,
                content_type = %response.content_type,
                "dropped: non-2xx or non-HTML response",
            );
            return Ok(false);
        }

        payload.raw_content.clear();
        payload.raw_content.extend_from_slice(&response.body);
        Ok(true)
    }
}
