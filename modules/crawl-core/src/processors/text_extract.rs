use async_trait::async_trait;
use crawl_common::CrawlError;
use crawl_pipeline::{Processor, StageContext};

use crate::html_text::sanitize_and_normalize;
use crate::payload::CrawlPayload;
use crate::regexes::TITLE_RE;

/// Title and body sanitization + UTF-8 normalization (§4.6).
pub struct TextExtractProcessor;

#[async_trait]
impl Processor<CrawlPayload> for TextExtractProcessor {
    async fn process(
        &self,
        _ctx: &StageContext,
        payload: &mut CrawlPayload,
    ) -> Result<bool, CrawlError> {
        if payload.raw_content.is_empty() {
            // Reaching here with nothing to extract means the fetch stage
            // failed to drop it — an invariant violation, not a transient
            // per-URL failure, so it cancels the pipeline (§7).
            return Err(CrawlError::invariant(
                "text extraction received empty raw content",
            ));
        }

        let raw = String::from_utf8_lossy(&payload.raw_content).into_owned();

        let title_capture = TITLE_RE
            .captures(&raw)
            .map(|caps| caps[1].to_string())
            .unwrap_or_default();
        payload.title = sanitize_and_normalize(&title_capture);
        payload.text_content = sanitize_and_normalize(&raw);

        if payload.title.is_empty() && payload.text_content.is_empty() {
            return Ok(false);
        }

        Ok(true)
    }
}
