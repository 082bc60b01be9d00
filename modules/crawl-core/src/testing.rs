//! Hand-written fakes for the external ports, used by this crate's own
//! tests (§10.4). Not a mocking framework — each fake is a small, direct
//! implementation of the port trait it stands in for.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crawl_common::{CounterPort, CrawlError};
use uuid::Uuid;

use crate::ports::{Document, FetchResponse, GraphPort, IndexPort, Link, LinkIterator, PrivateNetworkDetector, UrlGetter};

#[derive(Default)]
pub struct InMemoryGraph {
    links: Mutex<HashMap<Uuid, Link>>,
    by_url: Mutex<HashMap<String, Uuid>>,
    edges: Mutex<HashMap<(Uuid, Uuid), DateTime<Utc>>>,
}

impl InMemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a pre-existing link so it is discoverable via `links()`.
    pub fn seed_link(&self, link: Link) {
        self.by_url.lock().unwrap().insert(link.url.clone(), link.id);
        self.links.lock().unwrap().insert(link.id, link);
    }

    pub fn link_count(&self) -> usize {
        self.links.lock().unwrap().len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.lock().unwrap().len()
    }
}

#[async_trait]
impl GraphPort for InMemoryGraph {
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
        Ok(Box::new(VecLinkIterator {
            items: matched,
            idx: 0,
        }))
    }
}

pub struct VecLinkIterator {
    items: Vec<Link>,
    idx: usize,
}

impl VecLinkIterator {
    pub fn new(items: Vec<Link>) -> Self {
        Self { items, idx: 0 }
    }
}

#[async_trait]
impl LinkIterator for VecLinkIterator {
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

#[derive(Default)]
pub struct InMemoryIndex {
    pub documents: Mutex<Vec<Document>>,
}

#[async_trait]
impl IndexPort for InMemoryIndex {
    async fn index(&self, document: Document) -> Result<(), CrawlError> {
        self.documents.lock().unwrap().push(document);
        Ok(())
    }
}

#[derive(Clone)]
pub struct StubUrlGetter {
    pub response: Option<FetchResponse>,
}

#[async_trait]
impl UrlGetter for StubUrlGetter {
    async fn get(&self, _url: &str) -> Result<Option<FetchResponse>, CrawlError> {
        Ok(self.response.clone())
    }
}

pub struct NeverPrivate;

#[async_trait]
impl PrivateNetworkDetector for NeverPrivate {
    async fn is_private(&self, _host: &str) -> bool {
        false
    }
}

pub struct AlwaysPrivate;

#[async_trait]
impl PrivateNetworkDetector for AlwaysPrivate {
    async fn is_private(&self, _host: &str) -> bool {
        true
    }
}

#[derive(Default)]
pub struct RecordingCounter {
    pub values: Mutex<Vec<f64>>,
}

impl CounterPort for RecordingCounter {
    fn add(&self, value: f64) {
        self.values.lock().unwrap().push(value);
    }
}
