//! Prompt Store Port
//!
//! Abstract interface to the REST prompt service. The backend owns
//! prompt identity and the append-only version history; this port
//! exposes the operations the domain handles need. Implementations live
//! in adapter crates.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::{PromptTemplate, PromptVersion};
use crate::domain::errors::DomainError;
use crate::domain::value_objects::TemplateType;

/// Page size used when accumulating full version histories
pub const VERSION_PAGE_SIZE: usize = 100;

/// Optional list refinements. Backends without search or sorting support
/// never see unset fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionFilter {
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// One page request against the version-list endpoint
#[derive(Debug, Clone)]
pub struct VersionQuery {
    /// 1-based page number
    pub page: usize,
    pub size: usize,
    pub filter: VersionFilter,
}

impl VersionQuery {
    pub fn page(page: usize, size: usize) -> Self {
        Self {
            page,
            size,
            filter: VersionFilter::default(),
        }
    }

    pub fn with_filter(mut self, filter: VersionFilter) -> Self {
        self.filter = filter;
        self
    }
}

/// Full desired property tuple written by a property update
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PromptUpdate {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Payload for creating a prompt with its first version
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPrompt {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub template: PromptTemplate,
    pub template_type: TemplateType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_description: Option<String>,
}

/// A prompt's identity plus its current version, as returned by the
/// backend on fetch, create and restore
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptRecord {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub version: PromptVersion,
}

/// Repository interface for prompts and their version history
#[async_trait]
pub trait PromptStore: Send + Sync {
    /// Create a prompt with an initial version
    async fn create_prompt(&self, prompt: NewPrompt) -> Result<PromptRecord, DomainError>;

    /// Fetch a prompt with its current version
    async fn get_prompt(&self, prompt_id: Uuid) -> Result<PromptRecord, DomainError>;

    /// Write the full name/description/tags tuple
    async fn update_prompt(&self, prompt_id: Uuid, update: PromptUpdate)
        -> Result<(), DomainError>;

    /// Delete the prompt and all its versions
    async fn delete_prompt(&self, prompt_id: Uuid) -> Result<(), DomainError>;

    /// One page of the version history (newest first)
    async fn list_versions(
        &self,
        prompt_id: Uuid,
        query: VersionQuery,
    ) -> Result<Vec<PromptVersion>, DomainError>;

    /// Fetch one version by its short commit hash. `NotFound` when the
    /// commit does not exist.
    async fn get_version(&self, prompt_id: Uuid, commit: &str)
        -> Result<PromptVersion, DomainError>;

    /// Create a new version whose content equals the given historical
    /// version. Returns the prompt with its new current version.
    async fn restore_version(
        &self,
        prompt_id: Uuid,
        version_id: Uuid,
    ) -> Result<PromptRecord, DomainError>;
}
