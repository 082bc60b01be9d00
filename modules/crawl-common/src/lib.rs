pub mod config;
pub mod error;
pub mod metrics;

pub use config::Config;
pub use error::CrawlError;
pub use metrics::{CounterPort, NoopCounter};
