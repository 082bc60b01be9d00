pub mod fetch;
pub mod graph_update;
pub mod link_extract;
pub mod text_extract;
pub mod text_index;

pub use fetch::FetchProcessor;
pub use graph_update::GraphUpdateProcessor;
pub use link_extract::LinkExtractProcessor;
pub use text_extract::TextExtractProcessor;
pub use text_index::TextIndexProcessor;
