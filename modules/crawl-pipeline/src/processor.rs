use async_trait::async_trait;
use crawl_common::CrawlError;

use crate::context::StageContext;

/// A single processing step inside a stage runner. Mutates `payload` in
/// place and signals what the runner should do with it next:
///
/// - `Ok(true)`  — forward `payload` to the stage's output.
/// - `Ok(false)` — drop `payload` (the runner recycles it); this is the
///   "silent drop" outcome used throughout the fetch/extraction stages.
/// - `Err(e)`    — a stage error; the runner emits it and exits.
///
/// This differs from the reference implementation's `Process(ctx, p) ->
/// (Payload, error)` signature, which signals "drop" by returning a null
/// payload pointer and otherwise returns the (possibly same) payload back to
/// the caller. Taking `&mut P` and a boolean verdict avoids the ownership
/// gymnastics that pointer-return style would require under Rust's move
/// semantics, while preserving the same three observable outcomes.
#[async_trait]
pub trait Processor<P>: Send + Sync {
    async fn process(&self, ctx: &StageContext, payload: &mut P) -> Result<bool, CrawlError>;
}
