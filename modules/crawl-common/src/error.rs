use thiserror::Error;

/// Crate-wide error type shared by the pipeline engine and the crawl-specific
/// stages built on top of it. Mirrors the reference repo's single
/// per-failure-domain enum shape rather than a bag of ad-hoc string errors.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("fetch: {0}")]
    Fetch(String),

    #[error("port: {0}")]
    Port(String),

    #[error("source: {0}")]
    Source(String),

    #[error("config: {0}")]
    Config(String),

    #[error("invariant violated: {0}")]
    Invariant(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl CrawlError {
    pub fn port(msg: impl Into<String>) -> Self {
        Self::Port(msg.into())
    }

    pub fn source(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::Invariant(msg.into())
    }
}
