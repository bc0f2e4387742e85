//! Wire envelopes for the prompt service
//!
//! Domain types serialize directly onto the wire; only the pagination
//! envelope needs its own shape.

use serde::{Deserialize, Serialize};

use kotoba::PromptVersion;

/// Pagination metadata returned with version pages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageMeta {
    pub page: usize,
    #[serde(default)]
    pub limit: usize,
    #[serde(default)]
    pub total_items: usize,
    #[serde(default)]
    pub total_pages: usize,
}

/// One page of the version-list endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionPage {
    pub data: Vec<PromptVersion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<PageMeta>,
}
