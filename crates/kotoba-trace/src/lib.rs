//! Generation Tracing for Kotoba
//!
//! This crate wraps a [`GenerationClient`](kotoba::GenerationClient) so
//! that every invocation - plain response, failure, or streamed chunk
//! sequence - results in exactly one terminal observability span sent to
//! a [`TraceSink`](kotoba::TraceSink).
//!
//! # Usage
//!
//! ```rust,ignore
//! use kotoba_trace::{InMemorySink, TraceConfig, Traced};
//!
//! let sink = Arc::new(InMemorySink::new());
//! let client = Traced::new(provider_client, sink.clone())
//!     .with_config(TraceConfig::new().with_name("support-bot"));
//! let response = client.chat(&request).await?;
//! ```

mod config;
mod shapes;
mod sink;
mod stream;
mod traced;

pub use config::TraceConfig;
pub use shapes::{
    detect_shape, extract_model, extract_output, extract_usage, ResponseShape,
    EMBEDDING_PREVIEW_LEN,
};
pub use sink::{InMemorySink, RecordedTrace};
pub use stream::{GenerationStream, StreamingGenerationClient, TracedStream};
pub use traced::Traced;

#[cfg(test)]
mod test_support;
