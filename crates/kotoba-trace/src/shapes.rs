//! Response shape detection and extraction
//!
//! Generation providers answer in several dialects distinguished only by
//! which fields are present. Shapes are resolved by an explicit chain of
//! predicates into a tagged union; extraction then reads the fields that
//! dialect carries. Unknown shapes extract nothing and the caller falls
//! back to recording the raw response.

use kotoba::TokenUsage;
use serde_json::{json, Value};

/// Leading values kept when truncating embedding vectors
pub const EMBEDDING_PREVIEW_LEN: usize = 5;

/// Provider response dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// `choices[].message` or `choices[].text`
    ChatCompletion,
    /// Responses API: `output` / `output_text`
    Responses,
    /// `data[].embedding`
    Embedding,
    Unknown,
}

fn is_chat_completion(value: &Value) -> bool {
    value
        .get("choices")
        .and_then(Value::as_array)
        .is_some_and(|choices| {
            choices
                .iter()
                .any(|choice| choice.get("message").is_some() || choice.get("text").is_some())
        })
}

fn is_responses(value: &Value) -> bool {
    value.get("output").is_some() || value.get("output_text").is_some()
}

fn is_embedding(value: &Value) -> bool {
    value
        .get("data")
        .and_then(Value::as_array)
        .is_some_and(|data| data.iter().any(|item| item.get("embedding").is_some()))
}

/// Resolve the dialect of a response
pub fn detect_shape(value: &Value) -> ResponseShape {
    if is_chat_completion(value) {
        ResponseShape::ChatCompletion
    } else if is_responses(value) {
        ResponseShape::Responses
    } else if is_embedding(value) {
        ResponseShape::Embedding
    } else {
        ResponseShape::Unknown
    }
}

/// Completion output extracted from a response, shape-aware.
/// `None` for unknown shapes.
pub fn extract_output(value: &Value) -> Option<Value> {
    match detect_shape(value) {
        ResponseShape::ChatCompletion => {
            let choice = value.get("choices")?.as_array()?.first()?;
            if let Some(message) = choice.get("message") {
                return Some(message.clone());
            }
            choice.get("text").cloned()
        }
        ResponseShape::Responses => {
            match value.get("output_text") {
                Some(text) if !text.is_null() => Some(text.clone()),
                _ => value.get("output").cloned(),
            }
        }
        ResponseShape::Embedding => Some(embedding_preview(value)),
        ResponseShape::Unknown => None,
    }
}

/// Truncate each embedding vector to a short preview: large vectors keep
/// their first values plus a trailing `"..."` marker, and report their
/// full dimensionality
fn embedding_preview(value: &Value) -> Value {
    let previews: Vec<Value> = value
        .get("data")
        .and_then(Value::as_array)
        .map(|data| {
            data.iter()
                .filter_map(|item| item.get("embedding").and_then(Value::as_array))
                .map(|embedding| truncate_embedding(embedding))
                .collect()
        })
        .unwrap_or_default();

    match previews.len() {
        1 => previews.into_iter().next().unwrap_or(Value::Null),
        _ => Value::Array(previews),
    }
}

fn truncate_embedding(embedding: &[Value]) -> Value {
    if embedding.len() <= EMBEDDING_PREVIEW_LEN {
        return json!({ "embedding": embedding, "dimensions": embedding.len() });
    }
    let mut preview = embedding[..EMBEDDING_PREVIEW_LEN].to_vec();
    preview.push(Value::String("...".to_string()));
    json!({ "embedding": preview, "dimensions": embedding.len() })
}

fn read_u32(usage: &Value, keys: &[&str]) -> Option<u32> {
    keys.iter()
        .find_map(|key| usage.get(key))
        .and_then(Value::as_u64)
        .map(|n| n as u32)
}

/// Usage figures, tolerant of both `prompt_tokens`/`completion_tokens`
/// and `input_tokens`/`output_tokens` naming
pub fn extract_usage(value: &Value) -> Option<TokenUsage> {
    let usage = value.get("usage")?;
    let prompt = read_u32(usage, &["prompt_tokens", "input_tokens"]);
    let completion = read_u32(usage, &["completion_tokens", "output_tokens"]);
    let total = read_u32(usage, &["total_tokens"]);
    if prompt.is_none() && completion.is_none() && total.is_none() {
        return None;
    }
    let prompt = prompt.unwrap_or(0);
    let completion = completion.unwrap_or(0);
    Some(TokenUsage {
        prompt_tokens: prompt,
        completion_tokens: completion,
        total_tokens: total.unwrap_or(prompt + completion),
    })
}

/// Model id reported by the response, when present
pub fn extract_model(value: &Value) -> Option<String> {
    value
        .get("model")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Per-chunk classification for streamed responses
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ChunkDelta {
    Text(String),
    ToolCall {
        name: Option<String>,
        arguments: String,
    },
    /// Chunk embedding a full `response` object (Responses API)
    Response(Value),
}

pub(crate) fn classify_chunk(chunk: &Value) -> Option<ChunkDelta> {
    if let Some(response) = chunk.get("response") {
        if response.is_object() {
            return Some(ChunkDelta::Response(response.clone()));
        }
    }

    let delta = chunk.get("choices")?.as_array()?.first()?.get("delta")?;
    if let Some(tool_calls) = delta.get("tool_calls").and_then(Value::as_array) {
        let function = tool_calls.first()?.get("function")?;
        let name = function
            .get("name")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        let arguments = function
            .get("arguments")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return Some(ChunkDelta::ToolCall { name, arguments });
    }

    delta
        .get("content")
        .and_then(Value::as_str)
        .map(|text| ChunkDelta::Text(text.to_string()))
}
