use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use crawl_common::CrawlError;
use crawl_pipeline::{Processor, StageContext};
use url::Url;

use crate::payload::CrawlPayload;
use crate::ports::PrivateNetworkDetector;
use crate::regexes::{ANCHOR_TAG_RE, BASE_HREF_RE, EXCLUSION_RE, HREF_ATTR_RE, NOFOLLOW_RE};

/// HTML scan for anchors, `<base>` resolution, and follow/nofollow
/// classification (§4.5). Regex-based by design (§9 open question,
/// resolved): best-effort, not a proper HTML parser.
pub struct LinkExtractProcessor {
    detector: Arc<dyn PrivateNetworkDetector>,
}

impl LinkExtractProcessor {
    pub fn new(detector: Arc<dyn PrivateNetworkDetector>) -> Self {
        Self { detector }
    }
}

#[async_trait]
impl Processor<CrawlPayload> for LinkExtractProcessor {
    async fn process(
        &self,
        _ctx: &StageContext,
        payload: &mut CrawlPayload,
    ) -> Result<bool, CrawlError> {
        let mut rel_to = match Url::parse(&payload.url) {
            Ok(u) => u,
            Err(_) => return Ok(true),
        };

        let raw = String::from_utf8_lossy(&payload.raw_content);

        if let Some(caps) = BASE_HREF_RE.captures(&raw) {
            let normalized = normalize_trailing_slash(&caps[1]);
            if let Ok(resolved) = resolve_url(&rel_to, &normalized) {
                rel_to = resolved;
            }
        }

        // Cleared up front so repeated invocations on the same raw content
        // are idempotent (§8): without this, a second pass would duplicate
        // entries on top of whatever a prior pass already appended.
        payload.links.clear();
        payload.no_follow_links.clear();

        let mut seen: HashSet<String> = HashSet::new();

        for tag_match in ANCHOR_TAG_RE.find_iter(&raw) {
            let tag_text = tag_match.as_str();
            let href_value = match HREF_ATTR_RE.captures(tag_text) {
                Some(caps) => caps[1].to_string(),
                None => continue,
            };

            let mut resolved = match resolve_url(&rel_to, &href_value) {
                Ok(u) => u,
                Err(_) => continue,
            };

            if resolved.scheme() != "http" && resolved.scheme() != "https" {
                continue;
            }

            let same_host = resolved.host_str().is_some() && resolved.host_str() == rel_to.host_str();
            if !same_host {
                let host = match resolved.host_str() {
                    Some(h) => h,
                    None => continue,
                };
                if self.detector.is_private(host).await {
                    continue;
                }
            }

            resolved.set_fragment(None);
            let link = resolved.to_string();

            if EXCLUSION_RE.is_match(&link) {
                continue;
            }
            if !seen.insert(link.clone()) {
                continue;
            }

            if NOFOLLOW_RE.is_match(tag_text) {
                payload.no_follow_links.push(link);
            } else {
                payload.links.push(link);
            }
        }

        Ok(true)
    }
}

/// `"" -> "/"`, otherwise append a trailing `/` if missing.
fn normalize_trailing_slash(href: &str) -> String {
    if href.is_empty() {
        "/".to_string()
    } else if href.ends_with('/') {
        href.to_string()
    } else {
        format!("{href}/")
    }
}

/// Resolves `href` against `rel_to`. Protocol-relative hrefs (`//host/path`)
/// are made absolute by prefixing the base URL's scheme before parsing,
/// rather than via reference resolution.
fn resolve_url(rel_to: &Url, href: &str) -> Result<Url, url::ParseError> {
    if let Some(rest) = href.strip_prefix("//") {
        Url::parse(&format!("{}://{}", rel_to.scheme(), rest))
    } else {
        rel_to.join(href)
    }
}
