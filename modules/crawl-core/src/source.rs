use std::sync::Arc;

use async_trait::async_trait;
use crawl_common::CrawlError;
use crawl_pipeline::{Pool, Source};

use crate::payload::CrawlPayload;
use crate::ports::{Link, LinkIterator};

/// Adapts a `LinkIterator` from the graph port into a pipeline `Source`,
/// seeding each payload's identity fields from the underlying link record
/// (§4.9 step 5, §3 "Link").
pub struct LinkSource {
    iter: Box<dyn LinkIterator>,
    pool: Arc<Pool<CrawlPayload>>,
    current: Option<Link>,
}

impl LinkSource {
    pub fn new(iter: Box<dyn LinkIterator>, pool: Arc<Pool<CrawlPayload>>) -> Self {
        Self {
            iter,
            pool,
            current: None,
        }
    }
}

#[async_trait]
impl Source<CrawlPayload> for LinkSource {
    async fn next(&mut self) -> bool {
        if self.iter.next().await {
            self.current = Some(self.iter.link());
            true
        } else {
            false
        }
    }

    fn payload(&mut self) -> Box<CrawlPayload> {
        let link = self
            .current
            .take()
            .expect("payload() called without a preceding next() == true");

        let mut payload = self.pool.acquire();
        payload.link_id = link.id;
        payload.url.clear();
        payload.url.push_str(&link.url);
        payload.retrieved_at = link.retrieved_at;
        payload
    }

    fn error(&self) -> Option<CrawlError> {
        self.iter.error()
    }
}
