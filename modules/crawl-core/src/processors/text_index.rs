use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use crawl_common::CrawlError;
use crawl_pipeline::{Processor, StageContext};

use crate::payload::CrawlPayload;
use crate::ports::{Document, IndexPort};

/// Broadcast leaf 2: build a document record and upsert it into the index
/// (§4.8). Port errors are fatal.
pub struct TextIndexProcessor {
    index: Arc<dyn IndexPort>,
}

impl TextIndexProcessor {
    pub fn new(index: Arc<dyn IndexPort>) -> Self {
        Self { index }
    }
}

#[async_trait]
impl Processor<CrawlPayload> for TextIndexProcessor {
    async fn process(
        &self,
        _ctx: &StageContext,
        payload: &mut CrawlPayload,
    ) -> Result<bool, CrawlError> {
        if payload.title.is_empty() || payload.text_content.is_empty() {
            tracing::warn!(url = %payload.url, "indexing a document with empty title or content");
        }

        let document = Document {
            link_id: payload.link_id,
            url: payload.url.clone(),
            title: payload.title.clone(),
            content: payload.text_content.clone(),
            indexed_at: Utc::now(),
            page_rank: 0.0,
        };

        self.index.index(document).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tokio_util::sync::CancellationToken;
    use uuid::Uuid;

    #[derive(Default)]
    struct FakeIndex {
        documents: Mutex<Vec<Document>>,
    }

    #[async_trait]
    impl IndexPort for FakeIndex {
        async fn index(&self, document: Document) -> Result<(), CrawlError> {
            self.documents.lock().unwrap().push(document);
            Ok(())
        }
    }

    fn ctx() -> StageContext {
        StageContext::new(CancellationToken::new(), 0)
    }

    #[tokio::test]
    async fn builds_and_indexes_document_with_zero_page_rank() {
        let index = Arc::new(FakeIndex::default());
        let proc = TextIndexProcessor::new(index.clone());

        let mut payload =
            CrawlPayload::seeded(Uuid::new_v4(), "http://a.test/".to_string(), Utc::now());
        payload.title = "T".to_string();
        payload.text_content = "hello world".to_string();

        let forwarded = proc.process(&ctx(), &mut payload).await.unwrap();
        assert!(forwarded);

        let documents = index.documents.lock().unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].title, "T");
        assert_eq!(documents[0].page_rank, 0.0);
    }
}
