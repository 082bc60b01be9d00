use chrono::{DateTime, Utc};
use crawl_pipeline::{PoolClone, Poolable};
use uuid::Uuid;

/// The unit traversing the pipeline (§3). Every stage either mutates this in
/// place and forwards it, or silently drops it — never both.
#[derive(Debug, Default)]
pub struct CrawlPayload {
    pub link_id: Uuid,
    pub url: String,
    pub retrieved_at: DateTime<Utc>,
    /// Raw fetched bytes. Kept as bytes (not `String`) because the fetched
    /// body is not guaranteed to be valid UTF-8 before extraction validates
    /// it; mirrors the reference implementation's byte-buffer field.
    pub raw_content: Vec<u8>,
    pub links: Vec<String>,
    pub no_follow_links: Vec<String>,
    pub title: String,
    pub text_content: String,
}

impl CrawlPayload {
    /// A payload as the source hands it out: identity fields populated,
    /// everything extraction-derived empty.
    pub fn seeded(link_id: Uuid, url: String, retrieved_at: DateTime<Utc>) -> Self {
        Self {
            link_id,
            url,
            retrieved_at,
            ..Default::default()
        }
    }
}

impl Poolable for CrawlPayload {
    fn reset(&mut self) {
        self.link_id = Uuid::nil();
        self.url.clear();
        self.retrieved_at = DateTime::<Utc>::default();
        self.raw_content.clear();
        self.links.clear();
        self.no_follow_links.clear();
        self.title.clear();
        self.text_content.clear();
    }
}

impl PoolClone for CrawlPayload {
    fn clone_into(&self, dst: &mut Self) {
        dst.link_id = self.link_id;
        dst.url.clear();
        dst.url.push_str(&self.url);
        dst.retrieved_at = self.retrieved_at;

        dst.raw_content.clear();
        dst.raw_content.extend_from_slice(&self.raw_content);

        dst.links.clear();
        dst.links.extend(self.links.iter().cloned());

        dst.no_follow_links.clear();
        dst.no_follow_links.extend(self.no_follow_links.iter().cloned());

        dst.title.clear();
        dst.title.push_str(&self.title);

        dst.text_content.clear();
        dst.text_content.push_str(&self.text_content);
    }
}
