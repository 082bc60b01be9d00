use std::sync::Arc;

use crawl_common::CrawlError;
use crawl_pipeline::{Broadcast, Fifo, Pipeline, PipelineError, Pool, Sink, StageRunner, WorkerPool};
use tokio_util::sync::CancellationToken;

use crate::payload::CrawlPayload;
use crate::ports::{GraphPort, IndexPort, LinkIterator, PrivateNetworkDetector, UrlGetter};
use crate::processors::{FetchProcessor, GraphUpdateProcessor, LinkExtractProcessor, TextExtractProcessor, TextIndexProcessor};
use crate::sink::CountingSink;
use crate::source::LinkSource;

/// Wires `Source → [Fetch pool] → [Link extract FIFO] → [Text extract
/// FIFO] → [Broadcast {Graph update, Text index}] → counting Sink` (§2) into
/// one reusable pipeline instance. A `Crawler` is constructed once and
/// `crawl`-ed once per scheduler tick.
pub struct Crawler {
    pipeline: Pipeline<CrawlPayload>,
    pool: Arc<Pool<CrawlPayload>>,
    broadcast_arity: usize,
}

impl Crawler {
    pub fn new(
        getter: Arc<dyn UrlGetter>,
        detector: Arc<dyn PrivateNetworkDetector>,
        graph: Arc<dyn GraphPort>,
        index: Arc<dyn IndexPort>,
        fetch_workers: usize,
    ) -> Result<Self, CrawlError> {
        if fetch_workers == 0 {
            return Err(CrawlError::Config("fetch_workers must be greater than zero".into()));
        }

        let fetch = Arc::new(FetchProcessor::new(Arc::clone(&getter), Arc::clone(&detector)));
        let link_extract = Arc::new(LinkExtractProcessor::new(Arc::clone(&detector)));
        let text_extract = Arc::new(TextExtractProcessor);
        let graph_update = Arc::new(GraphUpdateProcessor::new(graph));
        let text_index = Arc::new(TextIndexProcessor::new(index));

        let leaves: Vec<Arc<dyn crawl_pipeline::Processor<CrawlPayload>>> =
            vec![graph_update, text_index];
        let broadcast_arity = leaves.len();

        let stages: Vec<Arc<dyn StageRunner<CrawlPayload>>> = vec![
            Arc::new(WorkerPool::new(fetch, fetch_workers)),
            Arc::new(Fifo::new(link_extract)),
            Arc::new(Fifo::new(text_extract)),
            Arc::new(Broadcast::new(leaves)),
        ];

        Ok(Self {
            pipeline: Pipeline::new(stages),
            pool: Arc::new(Pool::new(CrawlPayload::default)),
            broadcast_arity,
        })
    }

    /// Runs one full pass over `iter` to completion, returning the number of
    /// distinct links crawled (post divide-by-arity, §9).
    pub async fn crawl(
        &self,
        token: &CancellationToken,
        iter: Box<dyn LinkIterator>,
    ) -> Result<usize, PipelineError> {
        let source = Box::new(LinkSource::new(iter, Arc::clone(&self.pool)));
        let sink = Arc::new(CountingSink::new(self.broadcast_arity));
        let sink_dyn: Arc<dyn Sink<CrawlPayload>> = sink.clone();

        self.pipeline
            .process(token, source, sink_dyn, Arc::clone(&self.pool))
            .await?;

        Ok(sink.count())
    }
}
