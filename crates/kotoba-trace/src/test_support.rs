//! Scripted generation client for decorator tests

use async_trait::async_trait;
use serde_json::Value;

use kotoba::{
    ChatRequest, CompletionRequest, DomainError, EmbeddingRequest, GenerationClient,
};

use crate::stream::{GenerationStream, StreamingGenerationClient};

pub(crate) fn chunk_stream(chunks: Vec<Value>) -> GenerationStream {
    Box::pin(futures::stream::iter(chunks.into_iter().map(Ok)))
}

/// Client that replays a canned response, error or chunk sequence
pub(crate) struct ScriptedClient {
    pub response: Value,
    pub fail_with: Option<String>,
    pub chunks: Vec<Value>,
}

impl ScriptedClient {
    pub(crate) fn responding(response: Value) -> Self {
        Self {
            response,
            fail_with: None,
            chunks: Vec::new(),
        }
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self {
            response: Value::Null,
            fail_with: Some(message.to_string()),
            chunks: Vec::new(),
        }
    }

    pub(crate) fn streaming(chunks: Vec<Value>) -> Self {
        Self {
            response: Value::Null,
            fail_with: None,
            chunks,
        }
    }

    fn result(&self) -> Result<Value, DomainError> {
        match &self.fail_with {
            Some(message) => Err(DomainError::Generation(message.clone())),
            None => Ok(self.response.clone()),
        }
    }
}

#[async_trait]
impl GenerationClient for ScriptedClient {
    async fn chat(&self, _request: &ChatRequest) -> Result<Value, DomainError> {
        self.result()
    }

    async fn complete(&self, _request: &CompletionRequest) -> Result<Value, DomainError> {
        self.result()
    }

    async fn embed(&self, _request: &EmbeddingRequest) -> Result<Value, DomainError> {
        self.result()
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_id(&self) -> &str {
        "scripted-1"
    }
}

#[async_trait]
impl StreamingGenerationClient for ScriptedClient {
    async fn chat_stream(&self, _request: &ChatRequest) -> Result<GenerationStream, DomainError> {
        match &self.fail_with {
            Some(message) => Err(DomainError::Generation(message.clone())),
            None => Ok(chunk_stream(self.chunks.clone())),
        }
    }
}
