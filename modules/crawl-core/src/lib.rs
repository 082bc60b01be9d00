pub mod adapters;
pub mod crawler;
pub mod html_text;
pub mod partition;
pub mod payload;
pub mod ports;
pub mod privnet;
pub mod processors;
pub mod regexes;
pub mod scheduler;
pub mod sink;
pub mod source;

#[cfg(test)]
pub mod testing;

#[cfg(test)]
mod tests_e2e;

pub use crawler::Crawler;
pub use payload::CrawlPayload;
pub use scheduler::CrawlScheduler;
pub use sink::CountingSink;
pub use source::LinkSource;
