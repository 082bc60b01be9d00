use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use crawl_common::CrawlError;
use crawl_pipeline::{Sink, StageContext};

use crate::payload::CrawlPayload;

/// Counts payloads reaching the tail of the pipeline and reports
/// "links crawled" by dividing by the broadcast stage's fan-out arity
/// (§4.9 step 6, §9 design note: "do not hardcode 2"). The arity is an
/// explicit constructor argument rather than a hardcoded divide-by-two, so
/// a future change to the number of broadcast leaves does not silently
/// skew the reported count.
pub struct CountingSink {
    arity: usize,
    seen: AtomicUsize,
}

impl CountingSink {
    pub fn new(arity: usize) -> Self {
        assert!(arity > 0, "broadcast arity must be greater than zero");
        Self {
            arity,
            seen: AtomicUsize::new(0),
        }
    }

    /// Number of distinct source links that reached the sink this run
    /// (raw payload count divided by the fan-out arity).
    pub fn count(&self) -> usize {
        self.seen.load(Ordering::SeqCst) / self.arity
    }
}

#[async_trait]
impl Sink<CrawlPayload> for CountingSink {
    async fn consume(&self, _ctx: &StageContext, _payload: &mut CrawlPayload) -> Result<(), CrawlError> {
        self.seen.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
