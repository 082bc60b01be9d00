use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use crawl_common::CrawlError;
use crawl_pipeline::{Processor, StageContext};
use uuid::Uuid;

use crate::payload::CrawlPayload;
use crate::ports::{GraphPort, Link};

/// Broadcast leaf 1: upsert the source link, upsert discovered links and
/// edges, then prune stale edges (§4.7). Any port error is fatal to the
/// pipeline run.
pub struct GraphUpdateProcessor {
    graph: Arc<dyn GraphPort>,
}

impl GraphUpdateProcessor {
    pub fn new(graph: Arc<dyn GraphPort>) -> Self {
        Self { graph }
    }
}

#[async_trait]
impl Processor<CrawlPayload> for GraphUpdateProcessor {
    async fn process(
        &self,
        _ctx: &StageContext,
        payload: &mut CrawlPayload,
    ) -> Result<bool, CrawlError> {
        let now = Utc::now();

        let mut source_link = Link {
            id: payload.link_id,
            url: payload.url.clone(),
            retrieved_at: now,
        };
        self.graph.upsert_link(&mut source_link).await?;
        // The port may have reused an existing ID for this URL; keep the
        // payload's source identity in sync so edges point at the right node.
        payload.link_id = source_link.id;

        for url in &payload.no_follow_links {
            let mut link = Link {
                id: Uuid::new_v4(),
                url: url.clone(),
                retrieved_at: now,
            };
            self.graph.upsert_link(&mut link).await?;
        }

        for url in &payload.links {
            let mut link = Link {
                id: Uuid::new_v4(),
                url: url.clone(),
                retrieved_at: now,
            };
            self.graph.upsert_link(&mut link).await?;
            self.graph.upsert_edge(payload.link_id, link.id).await?;
        }

        // Timestamp taken immediately before the call, not before the edge
        // loop above — matches the original implementation's literal
        // `removeEdgeBefore := time.Now()` placement (§12 resolution).
        let remove_before = Utc::now();
        self.graph
            .remove_stale_edges(payload.link_id, remove_before)
            .await?;

        Ok(true)
    }
}
