//! PromptVersion - Immutable prompt snapshot
//!
//! One backend-created version of a prompt's content, identified by a
//! short commit hash. Never mutated client-side.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use similar::TextDiff;
use tracing::info;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::value_objects::{ChatMessage, SupportedModalities, TemplateType};
use crate::template::{self, Variables};

/// Template payload of a version: a single text template or an ordered
/// chat message sequence
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum PromptTemplate {
    Text(String),
    Chat(Vec<ChatMessage>),
}

/// Rendered output of formatting a version
#[derive(Debug, Clone, PartialEq)]
pub enum FormattedPrompt {
    Text(String),
    Chat(Vec<ChatMessage>),
}

/// PromptVersion - one immutable snapshot of a prompt's content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptVersion {
    pub version_id: Uuid,
    pub prompt_id: Uuid,
    /// Short hash, unique per prompt
    pub commit: String,
    pub template: PromptTemplate,
    pub template_type: TemplateType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

impl PromptVersion {
    /// The text template, when this is a text version
    pub fn text(&self) -> Option<&str> {
        match &self.template {
            PromptTemplate::Text(text) => Some(text),
            PromptTemplate::Chat(_) => None,
        }
    }

    /// The message sequence, when this is a chat version
    pub fn messages(&self) -> Option<&[ChatMessage]> {
        match &self.template {
            PromptTemplate::Text(_) => None,
            PromptTemplate::Chat(messages) => Some(messages),
        }
    }

    /// Render this version's template with the given variables
    pub fn format(&self, variables: &Variables) -> Result<FormattedPrompt, DomainError> {
        self.format_with_modalities(variables, SupportedModalities::default())
    }

    pub fn format_with_modalities(
        &self,
        variables: &Variables,
        modalities: SupportedModalities,
    ) -> Result<FormattedPrompt, DomainError> {
        match &self.template {
            PromptTemplate::Text(text) => Ok(FormattedPrompt::Text(template::format(
                text,
                variables,
                self.template_type,
            )?)),
            PromptTemplate::Chat(messages) => Ok(FormattedPrompt::Chat(template::render_messages(
                messages,
                variables,
                self.template_type,
                modalities,
            )?)),
        }
    }

    /// Human-relative age of this version, "Unknown" without a creation
    /// timestamp
    pub fn version_age(&self) -> String {
        let Some(created_at) = self.created_at else {
            return "Unknown".to_string();
        };
        let seconds = Utc::now()
            .signed_duration_since(created_at)
            .num_seconds()
            .max(0) as u64;
        format!("{} ago", humantime::format_duration(coarse_duration(seconds)))
    }

    /// `[<commit>] <ISO date> by <creator> - <change description>`,
    /// omitting absent segments
    pub fn version_info(&self) -> String {
        let mut segments = vec![format!("[{}]", self.commit)];
        if let Some(created_at) = self.created_at {
            segments.push(created_at.to_rfc3339());
        }
        if let Some(created_by) = &self.created_by {
            segments.push(format!("by {}", created_by));
        }
        if let Some(description) = &self.change_description {
            segments.push(format!("- {}", description));
        }
        segments.join(" ")
    }

    /// Template source used for diffing: the raw text for text prompts,
    /// the pretty-printed message array for chat prompts
    pub fn source(&self) -> String {
        match &self.template {
            PromptTemplate::Text(text) => text.clone(),
            PromptTemplate::Chat(messages) => {
                serde_json::to_string_pretty(messages).unwrap_or_default()
            }
        }
    }

    /// Unified diff from `other`'s template to this one's, labelled by
    /// commit. The diff is logged and returned.
    pub fn compare_to(&self, other: &PromptVersion) -> String {
        let other_source = with_trailing_newline(other.source());
        let current_source = with_trailing_newline(self.source());
        let diff = TextDiff::from_lines(&other_source, &current_source);
        let rendered = diff
            .unified_diff()
            .header(
                &format!("Other version [{}]", other.commit),
                &format!("Current version [{}]", self.commit),
            )
            .to_string();
        info!(
            current = %self.commit,
            other = %other.commit,
            diff = %rendered,
            "compared prompt versions"
        );
        rendered
    }
}

fn with_trailing_newline(mut source: String) -> String {
    if !source.ends_with('\n') {
        source.push('\n');
    }
    source
}

/// Drop sub-minute noise past an hour and sub-hour noise past a day
fn coarse_duration(seconds: u64) -> std::time::Duration {
    const MINUTE: u64 = 60;
    const HOUR: u64 = 3_600;
    const DAY: u64 = 86_400;
    let rounded = if seconds >= DAY {
        seconds - seconds % HOUR
    } else if seconds >= HOUR {
        seconds - seconds % MINUTE
    } else {
        seconds
    };
    std::time::Duration::from_secs(rounded)
}
