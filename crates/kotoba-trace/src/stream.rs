//! Streaming generation instrumentation
//!
//! Chunks pass through to the caller in arrival order while an
//! accumulator rides along, concatenating text deltas, merging tool-call
//! fragments and tracking usage. Exactly one terminal span is emitted
//! when the inner stream is exhausted. A stream dropped before
//! exhaustion emits no span, and a mid-stream error is forwarded without
//! finalizing - both gaps are inherited behavior, kept deliberately.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures::Stream;
use serde_json::{json, Value};

use kotoba::{
    ChatRequest, DomainError, GenerationClient, ObservationData, TokenUsage, TraceData,
    TraceHandle,
};

use crate::shapes::{self, ChunkDelta};

/// Streamed generation chunks, provider-shaped
pub type GenerationStream = Pin<Box<dyn Stream<Item = Result<Value, DomainError>> + Send>>;

/// Generation client with streaming chat support.
///
/// Split off from [`GenerationClient`] so the domain crate stays free of
/// stream machinery; infrastructure crates implement both.
#[async_trait]
pub trait StreamingGenerationClient: GenerationClient {
    async fn chat_stream(&self, request: &ChatRequest) -> Result<GenerationStream, DomainError>;
}

/// Accumulates streamed deltas into one terminal observation
pub(crate) struct StreamAccumulator {
    observation: ObservationData,
    trace: Arc<dyn TraceHandle>,
    owns_trace: bool,
    text_fragments: Vec<String>,
    tool_name: Option<String>,
    tool_arguments: String,
    saw_tool_call: bool,
    structured_output: Option<Value>,
    usage: Option<TokenUsage>,
    finalized: bool,
}

impl StreamAccumulator {
    pub(crate) fn new(
        observation: ObservationData,
        trace: Arc<dyn TraceHandle>,
        owns_trace: bool,
    ) -> Self {
        Self {
            observation,
            trace,
            owns_trace,
            text_fragments: Vec::new(),
            tool_name: None,
            tool_arguments: String::new(),
            saw_tool_call: false,
            structured_output: None,
            usage: None,
            finalized: false,
        }
    }

    fn observe(&mut self, chunk: &Value) {
        self.observation.mark_completion_start();
        if let Some(usage) = shapes::extract_usage(chunk) {
            self.usage = Some(usage);
        }
        if let Some(model) = shapes::extract_model(chunk) {
            self.observation.model = Some(model);
        }

        match shapes::classify_chunk(chunk) {
            Some(ChunkDelta::Text(text)) => self.text_fragments.push(text),
            Some(ChunkDelta::ToolCall { name, arguments }) => {
                self.saw_tool_call = true;
                // function name comes from the first non-empty occurrence
                if self.tool_name.is_none() {
                    self.tool_name = name;
                }
                self.tool_arguments.push_str(&arguments);
            }
            Some(ChunkDelta::Response(response)) => {
                if let Some(usage) = shapes::extract_usage(&response) {
                    self.usage = Some(usage);
                }
                self.structured_output =
                    Some(shapes::extract_output(&response).unwrap_or(response));
            }
            None => {}
        }
    }

    /// Final output priority: structured output from an embedded
    /// response, then a synthesized tool call, then the joined text
    fn final_output(&mut self) -> Value {
        if let Some(output) = self.structured_output.take() {
            return output;
        }
        if self.saw_tool_call {
            return json!({
                "role": "assistant",
                "tool_calls": [{
                    "type": "function",
                    "function": {
                        "name": self.tool_name.clone().unwrap_or_default(),
                        "arguments": self.tool_arguments,
                    }
                }]
            });
        }
        json!({
            "role": "assistant",
            "content": self.text_fragments.concat(),
        })
    }

    fn finalize(&mut self) {
        if self.finalized {
            return;
        }
        self.finalized = true;

        let output = self.final_output();
        self.observation.complete(output.clone(), self.usage.take());
        self.trace.span(self.observation.clone());
        if self.owns_trace {
            self.trace.update(TraceData {
                output: Some(output),
                ..TraceData::default()
            });
            self.trace.end();
        }
    }
}

/// Transparent passthrough stream carrying the accumulator
pub struct TracedStream {
    inner: GenerationStream,
    accumulator: StreamAccumulator,
}

impl TracedStream {
    pub(crate) fn new(inner: GenerationStream, accumulator: StreamAccumulator) -> Self {
        Self { inner, accumulator }
    }
}

impl Stream for TracedStream {
    type Item = Result<Value, DomainError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.accumulator.finalized {
            return Poll::Ready(None);
        }
        match this.inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                this.accumulator.observe(&chunk);
                Poll::Ready(Some(Ok(chunk)))
            }
            // mid-stream failures terminate the sequence; no span
            Poll::Ready(Some(Err(e))) => Poll::Ready(Some(Err(e))),
            Poll::Ready(None) => {
                this.accumulator.finalize();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
