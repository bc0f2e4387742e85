//! ObservationData - Generation invocation record
//!
//! Transient record of one traced generation-API call. Created at call
//! start, completed (or failed) exactly once at call end; streamed calls
//! accumulate into the same record and finalize once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::TokenUsage;

/// Error details captured from a failed generation call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorInfo {
    pub message: String,
    /// Error kind/name (e.g. the variant or exception class)
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// ObservationData - record of one generation invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationData {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_parameters: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    pub status: String,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl ObservationData {
    /// Create a record for a call that is starting now
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            model: None,
            provider: None,
            input: None,
            output: None,
            model_parameters: None,
            usage: None,
            tags: Vec::new(),
            metadata: None,
            status: "pending".to_string(),
            start_time: Utc::now(),
            completion_start_time: None,
            end_time: None,
            error: None,
        }
    }

    /// Mark the call completed with its final output; usage is kept only
    /// when the response carried one
    pub fn complete(&mut self, output: serde_json::Value, usage: Option<TokenUsage>) {
        self.output = Some(output);
        if usage.is_some() {
            self.usage = usage;
        }
        self.status = "completed".to_string();
        self.end_time = Some(Utc::now());
    }

    /// Mark the call failed
    pub fn fail(&mut self, error: ErrorInfo) {
        self.error = Some(error);
        self.status = "failed".to_string();
        self.end_time = Some(Utc::now());
    }

    /// Record the moment the first streamed chunk arrived
    pub fn mark_completion_start(&mut self) {
        if self.completion_start_time.is_none() {
            self.completion_start_time = Some(Utc::now());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_complete_sets_terminal_fields() {
        let mut observation = ObservationData::new("generation");
        observation.complete(json!({ "role": "assistant", "content": "hi" }), None);
        assert_eq!(observation.status, "completed");
        assert!(observation.end_time.is_some());
        assert!(observation.error.is_none());
    }

    #[test]
    fn test_fail_keeps_error_details() {
        let mut observation = ObservationData::new("generation");
        observation.fail(ErrorInfo {
            message: "rate limited".to_string(),
            kind: "ExternalService".to_string(),
            details: None,
        });
        assert_eq!(observation.status, "failed");
        assert_eq!(observation.error.unwrap().message, "rate limited");
    }

    #[test]
    fn test_completion_start_marked_once() {
        let mut observation = ObservationData::new("generation");
        observation.mark_completion_start();
        let first = observation.completion_start_time;
        observation.mark_completion_start();
        assert_eq!(observation.completion_start_time, first);
    }
}
