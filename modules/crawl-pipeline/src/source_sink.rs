use async_trait::async_trait;
use crawl_common::CrawlError;

use crate::context::StageContext;

/// Feeds the first stage of a pipeline run. `next` advances to the next
/// record (returning `false` on exhaustion); `payload` hands out ownership
/// of the current record as a freshly acquired, pool-backed payload.
/// `error` is consulted once after `next` returns `false`, mirroring the
/// reference iterator's `Error()` method.
#[async_trait]
pub trait Source<P>: Send {
    async fn next(&mut self) -> bool;
    fn payload(&mut self) -> Box<P>;
    fn error(&self) -> Option<CrawlError>;
}

/// Drains the last stage of a pipeline run.
#[async_trait]
pub trait Sink<P>: Send + Sync {
    async fn consume(&self, ctx: &StageContext, payload: &mut P) -> Result<(), CrawlError>;
}
