pub mod http;
pub mod memory;

pub use http::ReqwestUrlGetter;
pub use memory::{InMemoryGraphStore, InMemoryIndexStore};
