//! The seven concrete end-to-end scenarios from the component design's
//! testable-properties section, each driving a real `Crawler` through a
//! single `crawl()` call against hand-written fakes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crawl_common::CrawlError;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::crawler::Crawler;
use crate::ports::{FetchResponse, GraphPort, Link, LinkIterator, UrlGetter};
use crate::testing::{AlwaysPrivate, InMemoryGraph, InMemoryIndex, NeverPrivate, StubUrlGetter, VecLinkIterator};

fn one_link(url: &str) -> Box<VecLinkIterator> {
    Box::new(VecLinkIterator::new(vec![Link {
        id: Uuid::new_v4(),
        url: url.to_string(),
        retrieved_at: Utc::now(),
    }]))
}

struct CountingGetter {
    calls: Arc<AtomicUsize>,
    response: Option<FetchResponse>,
}

#[async_trait]
impl UrlGetter for CountingGetter {
    async fn get(&self, _url: &str) -> Result<Option<FetchResponse>, CrawlError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }
}

#[tokio::test]
async fn scenario_1_happy_path_single_link() {
    let graph = Arc::new(InMemoryGraph::new());
    let index = Arc::new(InMemoryIndex::default());
    let getter = Arc::new(StubUrlGetter {
        response: Some(FetchResponse {
            status: 200,
            content_type: "text/html".to_string(),
            body: br#"<html><title> T </title><body>hello <a href="/x">x</a> <a rel="nofollow" href="http://a.test/y">y</a></body></html>"#
                .to_vec(),
        }),
    });

    let crawler = Crawler::new(getter, Arc::new(NeverPrivate), graph.clone(), index.clone(), 1).unwrap();
    let token = CancellationToken::new();
    let count = crawler.crawl(&token, one_link("http://a.test/")).await.unwrap();

    assert_eq!(count, 1);
    assert_eq!(graph.link_count(), 3); // source + /x + y
    assert_eq!(graph.edge_count(), 1); // only the followable /x gets an edge

    let docs = index.documents.lock().unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].title, "T");
    assert!(docs[0].content.contains("hello x y"));
    assert_eq!(docs[0].page_rank, 0.0);
}

#[tokio::test]
async fn scenario_2_private_host_suppression() {
    let graph = Arc::new(InMemoryGraph::new());
    let index = Arc::new(InMemoryIndex::default());
    let calls = Arc::new(AtomicUsize::new(0));
    let getter = Arc::new(CountingGetter {
        calls: calls.clone(),
        response: None,
    });

    let crawler = Crawler::new(getter, Arc::new(AlwaysPrivate), graph.clone(), index.clone(), 1).unwrap();
    let token = CancellationToken::new();
    let count = crawler.crawl(&token, one_link("http://10.0.0.1/")).await.unwrap();

    assert_eq!(count, 0);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(graph.link_count(), 0);
    assert!(index.documents.lock().unwrap().is_empty());
}

#[tokio::test]
async fn scenario_3_exclusion_extension() {
    let graph = Arc::new(InMemoryGraph::new());
    let index = Arc::new(InMemoryIndex::default());
    let calls = Arc::new(AtomicUsize::new(0));
    let getter = Arc::new(CountingGetter {
        calls: calls.clone(),
        response: None,
    });

    let crawler = Crawler::new(getter, Arc::new(NeverPrivate), graph.clone(), index.clone(), 1).unwrap();
    let token = CancellationToken::new();
    let count = crawler.crawl(&token, one_link("http://a.test/file.png")).await.unwrap();

    assert_eq!(count, 0);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn scenario_4_non_html_content() {
    let graph = Arc::new(InMemoryGraph::new());
    let index = Arc::new(InMemoryIndex::default());
    let getter = Arc::new(StubUrlGetter {
        response: Some(FetchResponse {
            status: 200,
            content_type: "application/json".to_string(),
            body: b"{}".to_vec(),
        }),
    });

    let crawler = Crawler::new(getter, Arc::new(NeverPrivate), graph.clone(), index.clone(), 1).unwrap();
    let token = CancellationToken::new();
    let count = crawler.crawl(&token, one_link("http://a.test/")).await.unwrap();

    assert_eq!(count, 0);
    assert!(graph.link_count() == 0);
    assert!(index.documents.lock().unwrap().is_empty());
}

struct SlowGetter;

#[async_trait]
impl UrlGetter for SlowGetter {
    async fn get(&self, _url: &str) -> Result<Option<FetchResponse>, CrawlError> {
        tokio::time::sleep(Duration::from_secs(1)).await;
        Ok(Some(FetchResponse {
            status: 200,
            content_type: "text/html".to_string(),
            body: b"<html><title>T</title><body>x</body></html>".to_vec(),
        }))
    }
}

#[tokio::test]
async fn scenario_5_cancellation_mid_flight() {
    let graph = Arc::new(InMemoryGraph::new());
    let index = Arc::new(InMemoryIndex::default());
    let crawler = Crawler::new(Arc::new(SlowGetter), Arc::new(NeverPrivate), graph, index, 8).unwrap();

    let links: Vec<Link> = (0..1000)
        .map(|_| Link {
            id: Uuid::new_v4(),
            url: "http://a.test/".to_string(),
            retrieved_at: Utc::now(),
        })
        .collect();
    let iter = Box::new(VecLinkIterator::new(links));

    let token = CancellationToken::new();
    let cancel_handle = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel_handle.cancel();
    });

    let started = tokio::time::Instant::now();
    let _ = crawler.crawl(&token, iter).await;
    assert!(started.elapsed() < Duration::from_millis(900));
}

struct FailingGraph {
    inner: InMemoryGraph,
    fail_at: usize,
    calls: Mutex<usize>,
}

#[async_trait]
impl GraphPort for FailingGraph {
    async fn upsert_link(&self, link: &mut Link) -> Result<(), CrawlError> {
        let mut calls = self.calls.lock().unwrap();
        *calls += 1;
        if *calls == self.fail_at {
            return Err(CrawlError::port("simulated graph failure"));
        }
        drop(calls);
        self.inner.upsert_link(link).await
    }

    async fn upsert_edge(&self, src: Uuid, dst: Uuid) -> Result<(), CrawlError> {
        self.inner.upsert_edge(src, dst).await
    }

    async fn remove_stale_edges(
        &self,
        from_id: Uuid,
        updated_before: DateTime<Utc>,
    ) -> Result<(), CrawlError> {
        self.inner.remove_stale_edges(from_id, updated_before).await
    }

    async fn links(
        &self,
        from_id: Uuid,
        to_id: Uuid,
        retrieved_before: DateTime<Utc>,
    ) -> Result<Box<dyn LinkIterator>, CrawlError> {
        self.inner.links(from_id, to_id, retrieved_before).await
    }
}

#[tokio::test]
async fn scenario_6_graph_port_failure_cancels_pipeline() {
    let graph = Arc::new(FailingGraph {
        inner: InMemoryGraph::new(),
        fail_at: 3,
        calls: Mutex::new(0),
    });
    let index = Arc::new(InMemoryIndex::default());
    // No outbound links per page, so each payload triggers exactly one
    // `upsert_link` call (the source link) — failure on the 3rd call lines
    // up with failure on the 3rd payload, as the scenario specifies.
    let getter = Arc::new(StubUrlGetter {
        response: Some(FetchResponse {
            status: 200,
            content_type: "text/html".to_string(),
            body: b"<html><title>T</title><body>hi</body></html>".to_vec(),
        }),
    });

    let crawler = Crawler::new(getter, Arc::new(NeverPrivate), graph, index.clone(), 1).unwrap();

    let links: Vec<Link> = (0..5)
        .map(|i| Link {
            id: Uuid::new_v4(),
            url: format!("http://a.test/{i}"),
            retrieved_at: Utc::now(),
        })
        .collect();
    let iter = Box::new(VecLinkIterator::new(links));

    let token = CancellationToken::new();
    let result = crawler.crawl(&token, iter).await;

    assert!(result.is_err());
    assert!(index.documents.lock().unwrap().len() <= 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn scenario_7_broadcast_cloning_integrity() {
    let graph = Arc::new(InMemoryGraph::new());
    let index = Arc::new(InMemoryIndex::default());
    let getter = Arc::new(StubUrlGetter {
        response: Some(FetchResponse {
            status: 200,
            content_type: "text/html".to_string(),
            body: br#"<html><title>T</title><body>
                <a href="/a">a</a><a href="/b">b</a><a href="/c">c</a>
            </body></html>"#
                .to_vec(),
        }),
    });

    let crawler = Crawler::new(getter, Arc::new(NeverPrivate), graph.clone(), index.clone(), 4).unwrap();

    let links: Vec<Link> = vec![
        Link {
            id: Uuid::new_v4(),
            url: "http://a.test/one".to_string(),
            retrieved_at: Utc::now(),
        },
        Link {
            id: Uuid::new_v4(),
            url: "http://a.test/two".to_string(),
            retrieved_at: Utc::now(),
        },
    ];
    let iter = Box::new(VecLinkIterator::new(links));

    let token = CancellationToken::new();
    let count = crawler.crawl(&token, iter).await.unwrap();

    assert_eq!(count, 2);
    // Each of the 2 pages has 3 outbound links -> 3 edges each, 6 total;
    // the graph leaf mutated its own clone without racing the index leaf,
    // which independently saw the same 3 links per document.
    assert_eq!(graph.edge_count(), 6);

    let docs = index.documents.lock().unwrap();
    assert_eq!(docs.len(), 2);
    for doc in docs.iter() {
        assert_eq!(doc.title, "T");
    }
}
