//! Trace Sink Port
//!
//! Destination for observability data. `begin_trace` opens a trace and
//! returns a handle used to attach generation spans. Handles are
//! synchronous fire-and-forget: terminal spans are emitted from stream
//! polling contexts that cannot await, so exporters must queue
//! internally.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::entities::ObservationData;

/// Free-form trace-level payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraceData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl TraceData {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// Handle to one open trace
pub trait TraceHandle: Send + Sync {
    /// Attach one terminal generation span
    fn span(&self, observation: ObservationData);

    /// Update trace-level fields
    fn update(&self, data: TraceData);

    /// Close the trace
    fn end(&self);
}

/// Sink that opens traces
pub trait TraceSink: Send + Sync {
    fn begin_trace(&self, data: TraceData) -> Arc<dyn TraceHandle>;
}
