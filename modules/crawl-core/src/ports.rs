use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crawl_common::CrawlError;
use uuid::Uuid;

/// A link as stored in, and consumed from, the graph port (§3).
#[derive(Debug, Clone)]
pub struct Link {
    pub id: Uuid,
    pub url: String,
    pub retrieved_at: DateTime<Utc>,
}

/// A document as produced to the text index port (§3). `page_rank` is
/// always zero on write; an external ranker updates it out of band.
#[derive(Debug, Clone)]
pub struct Document {
    pub link_id: Uuid,
    pub url: String,
    pub title: String,
    pub content: String,
    pub indexed_at: DateTime<Utc>,
    pub page_rank: f64,
}

/// An iterator over stale links within a partition's ID range, as returned
/// by `GraphPort::links`. Mirrors the reference `LinkIterator`/`Source`
/// shape: advance, then read, then check for a terminal error.
#[async_trait]
pub trait LinkIterator: Send {
    async fn next(&mut self) -> bool;
    fn link(&mut self) -> Link;
    fn error(&self) -> Option<CrawlError>;
}

/// The persistent link graph store (§6, out of scope as an implementation —
/// only this contract is consumed).
#[async_trait]
pub trait GraphPort: Send + Sync {
    /// Idempotent on URL: if the URL already exists, the stored ID is
    /// written back into `link.id` and the newer of stored-vs-provided
    /// `retrieved_at` is kept.
    async fn upsert_link(&self, link: &mut Link) -> Result<(), CrawlError>;

    /// Idempotent on `(src, dst)`: touches `update_at` to now if the edge
    /// already exists, else inserts fresh.
    async fn upsert_edge(&self, src: Uuid, dst: Uuid) -> Result<(), CrawlError>;

    /// Deletes edges originating from `from_id` whose `update_at` precedes
    /// `updated_before` — edges not re-asserted in the current crawl pass.
    async fn remove_stale_edges(
        &self,
        from_id: Uuid,
        updated_before: DateTime<Utc>,
    ) -> Result<(), CrawlError>;

    /// Half-open range over a UUID-lexicographic space, yielding only links
    /// last retrieved before `retrieved_before`.
    async fn links(
        &self,
        from_id: Uuid,
        to_id: Uuid,
        retrieved_before: DateTime<Utc>,
    ) -> Result<Box<dyn LinkIterator>, CrawlError>;
}

/// The full-text index store (§6).
#[async_trait]
pub trait IndexPort: Send + Sync {
    /// Upsert by `document.link_id`; preserves any existing `page_rank`.
    async fn index(&self, document: Document) -> Result<(), CrawlError>;
}

/// Reports this replica's assignment within a partitioned deployment.
#[async_trait]
pub trait PartitionDetector: Send + Sync {
    /// Returns `(current_partition, total_partitions)`.
    async fn info(&self) -> (u32, u32);
}

/// A fixed `(0, 1)` partition detector — the single-node default (§6).
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedPartition;

#[async_trait]
impl PartitionDetector for FixedPartition {
    async fn info(&self) -> (u32, u32) {
        (0, 1)
    }
}

/// The HTTP response the fetch processor acts on.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub content_type: String,
    pub body: Vec<u8>,
}

/// The injected HTTP client port (§6). `get` enforces its own per-request
/// timeout; a `None` result stands in for the reference implementation's
/// "response is null" case.
#[async_trait]
pub trait UrlGetter: Send + Sync {
    async fn get(&self, url: &str) -> Result<Option<FetchResponse>, CrawlError>;
}

/// Classifies a host as reachable or private (§6). A security invariant
/// (§4.4 step 2, §8): the crawl must never issue a GET against a host this
/// returns `true` for.
#[async_trait]
pub trait PrivateNetworkDetector: Send + Sync {
    async fn is_private(&self, host: &str) -> bool;
}
