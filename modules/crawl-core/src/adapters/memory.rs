use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crawl_common::CrawlError;
use uuid::Uuid;

use crate::ports::{Document, GraphPort, IndexPort, Link, LinkIterator};

/// A single-process, non-persistent `GraphPort`. The graph store itself is
/// external and out of scope (§1) — no concrete persistence backend is named
/// by the port contract, so this stands in as the default wiring for
/// `crawl-service` until a caller supplies a real one. Data does not survive
/// a restart.
#[derive(Default)]
pub struct InMemoryGraphStore {
    links: Mutex<HashMap<Uuid, Link>>,
    by_url: Mutex<HashMap<String, Uuid>>,
    edges: Mutex<HashMap<(Uuid, Uuid), DateTime<Utc>>>,
}

impl InMemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GraphPort for InMemoryGraphStore {
    async fn upsert_link(&self, link: &mut Link) -> Result<(), CrawlError> {
        let mut by_url = self.by_url.lock().unwrap();
        if let Some(&existing_id) = by_url.get(&link.url) {
            link.id = existing_id;
            let mut links = self.links.lock().unwrap();
            if let Some(stored) = links.get_mut(&existing_id) {
                if link.retrieved_at > stored.retrieved_at {
                    stored.retrieved_at = link.retrieved_at;
                }
            }
        } else {
            by_url.insert(link.url.clone(), link.id);
            self.links.lock().unwrap().insert(link.id, link.clone());
        }
        Ok(())
    }

    async fn upsert_edge(&self, src: Uuid, dst: Uuid) -> Result<(), CrawlError> {
        self.edges.lock().unwrap().insert((src, dst), Utc::now());
        Ok(())
    }

    async fn remove_stale_edges(
        &self,
        from_id: Uuid,
        updated_before: DateTime<Utc>,
    ) -> Result<(), CrawlError> {
        self.edges
            .lock()
            .unwrap()
            .retain(|(src, _), ts| *src != from_id || *ts >= updated_before);
        Ok(())
    }

    async fn links(
        &self,
        from_id: Uuid,
        to_id: Uuid,
        retrieved_before: DateTime<Utc>,
    ) -> Result<Box<dyn LinkIterator>, CrawlError> {
        let links = self.links.lock().unwrap();
        let mut matched: Vec<Link> = links
            .values()
            .filter(|l| {
                l.id.as_u128() >= from_id.as_u128()
                    && l.id.as_u128() < to_id.as_u128()
                    && l.retrieved_at < retrieved_before
            })
            .cloned()
            .collect();
        matched.sort_by_key(|l| l.id);
        Ok(Box::new(InMemoryLinkIterator { items: matched, idx: 0 }))
    }
}

struct InMemoryLinkIterator {
    items: Vec<Link>,
    idx: usize,
}

#[async_trait]
impl LinkIterator for InMemoryLinkIterator {
    async fn next(&mut self) -> bool {
        self.idx < self.items.len()
    }

    fn link(&mut self) -> Link {
        let link = self.items[self.idx].clone();
        self.idx += 1;
        link
    }

    fn error(&self) -> Option<CrawlError> {
        None
    }
}

/// A single-process, non-persistent `IndexPort`, same rationale as
/// [`InMemoryGraphStore`].
#[derive(Default)]
pub struct InMemoryIndexStore {
    documents: Mutex<HashMap<Uuid, Document>>,
}

impl InMemoryIndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl IndexPort for InMemoryIndexStore {
    async fn index(&self, document: Document) -> Result<(), CrawlError> {
        let mut documents = self.documents.lock().unwrap();
        let page_rank = documents
            .get(&document.link_id)
            .map(|existing| existing.page_rank)
            .unwrap_or(document.page_rank);
        documents.insert(
            document.link_id,
            Document {
                page_rank,
                ..document
            },
        );
        Ok(())
    }
}
