//! Classified-content ingestion
//!
//! The dispatcher validates task/information payloads and appends them to
//! the timeline store, raising typed faults. The toolkit is the thin adapter
//! at the conversational boundary: it advertises the ingestion operations as
//! callable tools and renders every outcome as a string, because its caller
//! is a reasoning process that expects a uniform textual result.

pub mod dispatcher;
pub mod tools;

pub use dispatcher::IngestionDispatcher;
pub use tools::{IngestToolkit, ToolSchema};
