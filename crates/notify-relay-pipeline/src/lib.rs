pub mod consumer;
pub mod extract;
pub mod filter;
pub mod pipeline;
pub mod queue;

pub use consumer::{drain, RelayConsumer};
pub use extract::PayloadExtractor;
pub use filter::EventFilter;
pub use pipeline::{EventPipeline, PayloadDispatch};
pub use queue::RelayQueue;
