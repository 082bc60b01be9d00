use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use crawl_common::{CounterPort, CrawlError};
use tokio_util::sync::CancellationToken;

use crate::crawler::Crawler;
use crate::partition::partition_extents;
use crate::ports::{GraphPort, PartitionDetector};

/// Periodic tick → partition extents → stale-link iterator → one full
/// pipeline pass (§4.9).
pub struct CrawlScheduler {
    update_interval: Duration,
    reindex_interval: Duration,
    partition_detector: Arc<dyn PartitionDetector>,
    graph: Arc<dyn GraphPort>,
    crawler: Crawler,
    counter: Arc<dyn CounterPort>,
}

impl CrawlScheduler {
    pub fn new(
        update_interval: Duration,
        reindex_interval: Duration,
        partition_detector: Arc<dyn PartitionDetector>,
        graph: Arc<dyn GraphPort>,
        crawler: Crawler,
        counter: Arc<dyn CounterPort>,
    ) -> Self {
        Self {
            update_interval,
            reindex_interval,
            partition_detector,
            graph,
            crawler,
            counter,
        }
    }

    /// Runs until `token` is cancelled. Returns `Ok(())` on clean
    /// cancellation. A pipeline run failure ends the loop and is returned to
    /// the caller — the service exits rather than retrying in-process; an
    /// external supervisor is expected to restart the process for "the next
    /// tick" (§4.9 step 7, grounded on the original `Service.Run` which
    /// exits on the first `crawlGraph` error with no in-process retry loop).
    pub async fn run(&self, token: CancellationToken) -> Result<(), CrawlError> {
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => return Ok(()),
                _ = tokio::time::sleep(self.update_interval) => {}
            }

            if token.is_cancelled() {
                return Ok(());
            }

            self.tick(&token).await?;
        }
    }

    async fn tick(&self, token: &CancellationToken) -> Result<(), CrawlError> {
        let (current, total) = self.partition_detector.info().await;
        let (from_id, to_id) = partition_extents(total, current)?;

        let reindex_chrono = chrono::Duration::from_std(self.reindex_interval)
            .unwrap_or_else(|_| chrono::Duration::zero());
        let cutoff = Utc::now() - reindex_chrono;

        let iter = self.graph.links(from_id, to_id, cutoff).await?;

        match self.crawler.crawl(token, iter).await {
            Ok(count) => {
                self.counter.add(count as f64);
                tracing::info!(current, total, count, "crawl pass complete");
                Ok(())
            }
            Err(pipeline_err) => {
                tracing::error!(error = %pipeline_err, "crawl pass failed");
                Err(CrawlError::Port(pipeline_err.to_string()))
            }
        }
    }
}
