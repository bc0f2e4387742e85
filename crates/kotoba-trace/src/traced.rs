//! Tracing decorator for generation clients
//!
//! Wraps a [`GenerationClient`] so every invocation results in exactly
//! one terminal span: call arguments are parsed into
//! `{model, input, model_parameters}` up front, the response's output,
//! usage and model are extracted shape-aware, and failures are captured
//! into an error span before the original error is re-raised unchanged.
//!
//! Trace ownership: without a parent the decorator opens one trace per
//! call, updates it with the final output and ends it. A caller-supplied
//! parent is only ever given spans - its lifecycle stays with the
//! caller.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use kotoba::{
    ChatRequest, CompletionRequest, DomainError, EmbeddingRequest, ErrorInfo, GenerationClient,
    GenerationOptions, ObservationData, TraceData, TraceHandle, TraceSink,
};

use crate::config::TraceConfig;
use crate::shapes;
use crate::stream::{GenerationStream, StreamAccumulator, StreamingGenerationClient, TracedStream};

/// Decorator adding span emission to a generation client
pub struct Traced<C> {
    inner: C,
    sink: Arc<dyn TraceSink>,
    config: TraceConfig,
    parent: Option<Arc<dyn TraceHandle>>,
}

struct CallTrace {
    handle: Arc<dyn TraceHandle>,
    owned: bool,
}

impl<C> Traced<C> {
    pub fn new(inner: C, sink: Arc<dyn TraceSink>) -> Self {
        Self {
            inner,
            sink,
            config: TraceConfig::default(),
            parent: None,
        }
    }

    pub fn with_config(mut self, config: TraceConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach spans to a caller-owned trace instead of opening one per
    /// call. The decorator never updates or ends a supplied parent.
    pub fn with_parent(mut self, parent: Arc<dyn TraceHandle>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Unwrap the decorated client
    pub fn into_inner(self) -> C {
        self.inner
    }

    fn begin(&self, input: &Value) -> CallTrace {
        match &self.parent {
            Some(parent) => CallTrace {
                handle: Arc::clone(parent),
                owned: false,
            },
            None => CallTrace {
                handle: self.sink.begin_trace(TraceData {
                    name: Some(self.config.span_name().to_string()),
                    input: Some(input.clone()),
                    output: None,
                    tags: self.config.tags.clone(),
                    metadata: self.config.metadata.clone(),
                }),
                owned: true,
            },
        }
    }

    fn emit_success(&self, call: &CallTrace, mut observation: ObservationData, response: &Value) {
        // fields discovered only in the response win over request data
        if let Some(model) = shapes::extract_model(response) {
            observation.model = Some(model);
        }
        let output = shapes::extract_output(response).unwrap_or_else(|| response.clone());
        let usage = shapes::extract_usage(response);
        observation.complete(output.clone(), usage);
        call.handle.span(observation);
        if call.owned {
            call.handle.update(TraceData {
                output: Some(output),
                ..TraceData::default()
            });
            call.handle.end();
        }
    }

    fn emit_failure(&self, call: &CallTrace, mut observation: ObservationData, error: &DomainError) {
        observation.fail(ErrorInfo {
            message: error.to_string(),
            kind: error_kind(error).to_string(),
            details: None,
        });
        call.handle.span(observation);
        if call.owned {
            call.handle.end();
        }
    }
}

impl<C: GenerationClient> Traced<C> {
    fn base_observation(&self, model: &str, input: Value, options: &GenerationOptions) -> ObservationData {
        let mut observation = ObservationData::new(self.config.span_name());
        observation.model = Some(model.to_string());
        observation.provider = Some(
            self.config
                .provider
                .clone()
                .unwrap_or_else(|| self.inner.provider_name().to_string()),
        );
        observation.input = Some(input);
        observation.model_parameters = Some(model_parameters(options));
        observation.tags = self.config.tags.clone();
        observation.metadata = self.config.metadata.clone();
        observation
    }
}

/// Chat calls capture messages plus any tool fields
fn chat_input(request: &ChatRequest) -> Value {
    let mut input = json!({ "messages": request.messages });
    if let Some(tools) = &request.tools {
        input["tools"] = tools.clone();
    }
    if let Some(tool_choice) = &request.tool_choice {
        input["tool_choice"] = tool_choice.clone();
    }
    input
}

/// The allow-list is the options struct itself; unset knobs disappear
/// through serialization
fn model_parameters(options: &GenerationOptions) -> Value {
    serde_json::to_value(options).unwrap_or(Value::Null)
}

fn error_kind(error: &DomainError) -> &'static str {
    match error {
        DomainError::NotFound { .. } => "NotFound",
        DomainError::Validation(_) => "Validation",
        DomainError::Template(_) => "Template",
        DomainError::ExternalService(_) => "ExternalService",
        DomainError::Generation(_) => "Generation",
    }
}

#[async_trait]
impl<C: GenerationClient> GenerationClient for Traced<C> {
    async fn chat(&self, request: &ChatRequest) -> Result<Value, DomainError> {
        let input = chat_input(request);
        let call = self.begin(&input);
        let observation = self.base_observation(&request.model, input, &request.options);
        debug!(model = %request.model, "tracing chat call");

        match self.inner.chat(request).await {
            Ok(response) => {
                self.emit_success(&call, observation, &response);
                Ok(response)
            }
            Err(e) => {
                self.emit_failure(&call, observation, &e);
                Err(e)
            }
        }
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Value, DomainError> {
        let input = json!({ "prompt": request.prompt });
        let call = self.begin(&input);
        let observation = self.base_observation(&request.model, input, &request.options);
        debug!(model = %request.model, "tracing completion call");

        match self.inner.complete(request).await {
            Ok(response) => {
                self.emit_success(&call, observation, &response);
                Ok(response)
            }
            Err(e) => {
                self.emit_failure(&call, observation, &e);
                Err(e)
            }
        }
    }

    async fn embed(&self, request: &EmbeddingRequest) -> Result<Value, DomainError> {
        let input = json!({ "input": request.input });
        let call = self.begin(&input);
        let observation =
            self.base_observation(&request.model, input, &GenerationOptions::default());
        debug!(model = %request.model, inputs = request.input.len(), "tracing embedding call");

        match self.inner.embed(request).await {
            Ok(response) => {
                self.emit_success(&call, observation, &response);
                Ok(response)
            }
            Err(e) => {
                self.emit_failure(&call, observation, &e);
                Err(e)
            }
        }
    }

    // synchronous accessors forward untraced
    fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }
}

#[async_trait]
impl<C: StreamingGenerationClient> StreamingGenerationClient for Traced<C> {
    async fn chat_stream(&self, request: &ChatRequest) -> Result<GenerationStream, DomainError> {
        let input = chat_input(request);
        let call = self.begin(&input);
        let observation = self.base_observation(&request.model, input, &request.options);
        debug!(model = %request.model, "tracing streamed chat call");

        match self.inner.chat_stream(request).await {
            Ok(stream) => Ok(Box::pin(TracedStream::new(
                stream,
                StreamAccumulator::new(observation, call.handle, call.owned),
            ))),
            Err(e) => {
                self.emit_failure(&call, observation, &e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::InMemorySink;
    use crate::test_support::ScriptedClient;
    use futures::StreamExt;
    use kotoba::{ChatMessage, TokenUsage};

    fn chat_request() -> ChatRequest {
        ChatRequest::new("gpt-4o-mini", vec![ChatMessage::new("user", "hi")]).with_options(
            GenerationOptions {
                temperature: Some(0.5),
                max_tokens: Some(64),
                ..GenerationOptions::default()
            },
        )
    }

    fn chat_response() -> Value {
        json!({
            "model": "gpt-4o-mini-2024",
            "choices": [{ "message": { "role": "assistant", "content": "hello" } }],
            "usage": { "prompt_tokens": 3, "completion_tokens": 2, "total_tokens": 5 }
        })
    }

    #[tokio::test]
    async fn test_chat_emits_one_span_and_returns_response() {
        let sink = Arc::new(InMemorySink::new());
        let client = Traced::new(ScriptedClient::responding(chat_response()), sink.clone());

        let response = client.chat(&chat_request()).await.unwrap();
        assert_eq!(response, chat_response());

        let traces = sink.traces();
        assert_eq!(traces.len(), 1);
        let spans = traces[0].spans();
        assert_eq!(spans.len(), 1);
        let span = &spans[0];
        // model discovered in the response wins
        assert_eq!(span.model.as_deref(), Some("gpt-4o-mini-2024"));
        assert_eq!(span.provider.as_deref(), Some("scripted"));
        assert_eq!(
            span.output,
            Some(json!({ "role": "assistant", "content": "hello" }))
        );
        assert_eq!(
            span.usage,
            Some(TokenUsage {
                prompt_tokens: 3,
                completion_tokens: 2,
                total_tokens: 5
            })
        );
        assert_eq!(span.model_parameters.as_ref().unwrap()["temperature"], 0.5);
        assert!(span.input.as_ref().unwrap().get("messages").is_some());
        assert!(traces[0].ended());
        assert_eq!(traces[0].data().output, Some(json!({ "role": "assistant", "content": "hello" })));
    }

    #[tokio::test]
    async fn test_failure_emits_error_span_and_reraises() {
        let sink = Arc::new(InMemorySink::new());
        let client = Traced::new(ScriptedClient::failing("model overloaded"), sink.clone());

        let err = client.chat(&chat_request()).await.unwrap_err();
        assert!(matches!(err, DomainError::Generation(_)));
        assert!(err.to_string().contains("model overloaded"));

        let traces = sink.traces();
        let span = &traces[0].spans()[0];
        assert_eq!(span.status, "failed");
        let error = span.error.as_ref().unwrap();
        assert_eq!(error.kind, "Generation");
        assert!(error.message.contains("model overloaded"));
        assert!(traces[0].ended());
    }

    #[tokio::test]
    async fn test_parent_trace_is_never_updated_or_ended() {
        let sink = Arc::new(InMemorySink::new());
        let parent = sink.begin_trace(TraceData::named("conversation"));
        let client = Traced::new(ScriptedClient::responding(chat_response()), sink.clone())
            .with_parent(parent);

        client.chat(&chat_request()).await.unwrap();

        let traces = sink.traces();
        // only the caller-opened trace exists, with the span attached
        assert_eq!(traces.len(), 1);
        assert_eq!(traces[0].spans().len(), 1);
        assert!(!traces[0].ended());
        assert_eq!(traces[0].update_count(), 0);
    }

    #[tokio::test]
    async fn test_completion_falls_back_to_prompt_input() {
        let sink = Arc::new(InMemorySink::new());
        let client = Traced::new(
            ScriptedClient::responding(json!({ "choices": [{ "text": "done" }] })),
            sink.clone(),
        );

        client
            .complete(&CompletionRequest::new("davinci", "Say hi"))
            .await
            .unwrap();

        let traces = sink.traces();
        let span = &traces[0].spans()[0];
        assert_eq!(span.input, Some(json!({ "prompt": "Say hi" })));
        assert_eq!(span.output, Some(json!("done")));
    }

    #[tokio::test]
    async fn test_embedding_output_is_truncated_preview() {
        let sink = Arc::new(InMemorySink::new());
        let vector: Vec<f64> = (0..1536).map(|i| i as f64).collect();
        let client = Traced::new(
            ScriptedClient::responding(json!({ "data": [{ "embedding": vector }] })),
            sink.clone(),
        );

        client
            .embed(&EmbeddingRequest::new("text-embedding-3-small", vec![
                "hello".to_string(),
            ]))
            .await
            .unwrap();

        let traces = sink.traces();
        let output = traces[0].spans()[0].output.clone().unwrap();
        assert_eq!(output["dimensions"], 1536);
        assert_eq!(output["embedding"].as_array().unwrap().len(), 6);
        assert_eq!(output["embedding"][5], json!("..."));
    }

    #[tokio::test]
    async fn test_unknown_shape_records_raw_response() {
        let sink = Arc::new(InMemorySink::new());
        let raw = json!({ "status": "weird" });
        let client = Traced::new(ScriptedClient::responding(raw.clone()), sink.clone());

        client.chat(&chat_request()).await.unwrap();
        let traces = sink.traces();
        assert_eq!(traces[0].spans()[0].output, Some(raw));
    }

    #[test]
    fn test_sync_accessors_emit_no_span() {
        let sink = Arc::new(InMemorySink::new());
        let client = Traced::new(ScriptedClient::responding(Value::Null), sink.clone());

        assert_eq!(client.provider_name(), "scripted");
        assert_eq!(client.model_id(), "scripted-1");
        assert!(sink.traces().is_empty());
    }

    #[tokio::test]
    async fn test_streamed_call_emits_one_span_through_decorator() {
        let sink = Arc::new(InMemorySink::new());
        let chunks = vec![
            json!({ "choices": [{ "delta": { "content": "a" } }] }),
            json!({ "choices": [{ "delta": { "content": "b" } }] }),
            json!({ "usage": { "prompt_tokens": 1, "completion_tokens": 1, "total_tokens": 2 } }),
        ];
        let client = Traced::new(ScriptedClient::streaming(chunks.clone()), sink.clone());

        let mut stream = client.chat_stream(&chat_request()).await.unwrap();
        let mut received = Vec::new();
        while let Some(chunk) = stream.next().await {
            received.push(chunk.unwrap());
        }

        assert_eq!(received, chunks);
        let traces = sink.traces();
        assert_eq!(traces.len(), 1);
        let spans = traces[0].spans();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].output.as_ref().unwrap()["content"], "ab");
        assert!(traces[0].ended());
    }

    #[tokio::test]
    async fn test_stream_open_failure_emits_error_span() {
        let sink = Arc::new(InMemorySink::new());
        let client = Traced::new(ScriptedClient::failing("no stream"), sink.clone());

        let err = client.chat_stream(&chat_request()).await.err().unwrap();
        assert!(err.to_string().contains("no stream"));

        let traces = sink.traces();
        assert_eq!(traces[0].spans()[0].status, "failed");
        assert!(traces[0].ended());
    }
}
