//! Generation Client Port
//!
//! Abstract interface for generation-API invocations, swappable between
//! providers. Responses come back as raw provider-shaped JSON; shape
//! detection and usage extraction belong to the tracing layer, which
//! must cope with several provider dialects.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;
use crate::domain::value_objects::ChatMessage;

/// Allow-listed generation knobs captured into spans as model parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GenerationOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// Chat-style generation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub options: GenerationOptions,
    /// Tool definitions, provider-shaped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<serde_json::Value>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            options: GenerationOptions::default(),
            tools: None,
            tool_choice: None,
        }
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_tools(mut self, tools: serde_json::Value) -> Self {
        self.tools = Some(tools);
        self
    }
}

/// Single-prompt (non-chat) generation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    #[serde(default)]
    pub options: GenerationOptions,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            options: GenerationOptions::default(),
        }
    }
}

/// Embedding request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    pub model: String,
    pub input: Vec<String>,
}

impl EmbeddingRequest {
    pub fn new(model: impl Into<String>, input: Vec<String>) -> Self {
        Self {
            model: model.into(),
            input,
        }
    }
}

/// Generation client interface
///
/// Each provider (OpenAI-compatible, Anthropic, local runtimes) gets its
/// own implementation. The tracing decorator wraps any implementation of
/// this trait.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Chat-style generation
    async fn chat(&self, request: &ChatRequest) -> Result<serde_json::Value, DomainError>;

    /// Plain-prompt generation
    async fn complete(&self, request: &CompletionRequest)
        -> Result<serde_json::Value, DomainError>;

    /// Embedding generation
    async fn embed(&self, request: &EmbeddingRequest) -> Result<serde_json::Value, DomainError>;

    /// Get the provider name (e.g. "openai", "anthropic")
    fn provider_name(&self) -> &str;

    /// Get the default model ID for this client
    fn model_id(&self) -> &str;
}

// Note: Streaming support (StreamingGenerationClient) is defined in the
// kotoba-trace crate, which can depend on `futures`.
