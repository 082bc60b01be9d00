pub mod context;
pub mod executor;
pub mod pool;
pub mod processor;
pub mod source_sink;
pub mod stage;


pub use context::StageContext;
pub use executor::{Pipeline, PipelineError};
pub use pool::{Pool, PoolClone, Poolable};
pub use processor::Processor;
pub use source_sink::{Sink, Source};
pub use stage::{Broadcast, Fifo, StageRunner, WorkerPool};
