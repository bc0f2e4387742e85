//! Prompt - Text prompt handle bound to one version
//!
//! Wraps one PromptVersion's content plus the prompt identity. Mutating
//! operations call the backend first and mirror local state only on
//! success; `use_version` returns a brand-new handle and never rebinds
//! the current one (the version history is append-only).

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::domain::entities::{ChatPrompt, PromptTemplate, PromptVersion};
use crate::domain::errors::DomainError;
use crate::ports::repositories::{
    PromptRecord, PromptStore, PromptUpdate, VersionFilter, VersionQuery, VERSION_PAGE_SIZE,
};
use crate::template::{self, Variables};

/// Partial property update; unset fields keep their current value
#[derive(Debug, Clone, Default)]
pub struct PromptProperties {
    pub name: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl PromptProperties {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }
}

/// Handle to a text prompt bound to one version
#[derive(Clone)]
pub struct Prompt {
    store: Arc<dyn PromptStore>,
    id: Uuid,
    version_id: Uuid,
    name: String,
    description: Option<String>,
    tags: Vec<String>,
    version: PromptVersion,
}

impl Prompt {
    /// Build a text prompt handle from a backend record.
    ///
    /// Fails when the record's current version holds a chat template.
    pub fn from_record(
        store: Arc<dyn PromptStore>,
        record: PromptRecord,
    ) -> Result<Self, DomainError> {
        if !matches!(record.version.template, PromptTemplate::Text(_)) {
            return Err(DomainError::Validation(format!(
                "prompt '{}' holds a chat template, use ChatPrompt",
                record.name
            )));
        }
        Ok(Self {
            store,
            id: record.id,
            version_id: record.version.version_id,
            name: record.name,
            description: record.description,
            tags: record.tags,
            version: record.version,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn version_id(&self) -> Uuid {
        self.version_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn commit(&self) -> &str {
        &self.version.commit
    }

    /// Version metadata, deep-copied so callers cannot mutate shared
    /// state through it
    pub fn metadata(&self) -> Option<serde_json::Value> {
        self.version.metadata.clone()
    }

    pub fn version(&self) -> &PromptVersion {
        &self.version
    }

    /// The raw template source
    pub fn template(&self) -> &str {
        self.version.text().unwrap_or_default()
    }

    /// Render the template. Pure; no backend call.
    pub fn format(&self, variables: &Variables) -> Result<String, DomainError> {
        template::format(self.template(), variables, self.version.template_type)
    }

    /// Update name/description/tags in one backend write, mirroring the
    /// tuple into local state only after the backend accepts it. Returns
    /// `self` for chaining; local state is untouched on failure.
    pub async fn update_properties(
        &mut self,
        properties: PromptProperties,
    ) -> Result<&mut Self, DomainError> {
        let desired = desired_update(
            properties,
            &self.name,
            self.description.as_deref(),
            &self.tags,
        );
        self.store.update_prompt(self.id, desired.clone()).await?;
        self.name = desired.name;
        self.description = desired.description;
        self.tags = desired.tags;
        Ok(self)
    }

    /// Delete the prompt and, with it, all of its versions
    pub async fn delete(&self) -> Result<(), DomainError> {
        self.store.delete_prompt(self.id).await
    }

    /// Full version history (newest first, as ordered by the backend)
    pub async fn get_versions(
        &self,
        filter: VersionFilter,
    ) -> Result<Vec<PromptVersion>, DomainError> {
        collect_versions(self.store.as_ref(), self.id, filter).await
    }

    /// Fetch one version by commit. `Ok(None)` when the commit is
    /// unknown; any other failure propagates.
    pub async fn get_version(&self, commit: &str) -> Result<Option<PromptVersion>, DomainError> {
        lookup_version(self.store.as_ref(), self.id, commit).await
    }

    /// Create a new version whose content equals `version` and return a
    /// new handle bound to it. `self` stays bound to its version.
    pub async fn use_version(&self, version: &PromptVersion) -> Result<Prompt, DomainError> {
        let record = self
            .store
            .restore_version(self.id, version.version_id)
            .await?;
        Prompt::from_record(Arc::clone(&self.store), record)
    }
}

/// A loaded prompt handle, text or chat depending on the stored template
pub enum PromptHandle {
    Text(Prompt),
    Chat(ChatPrompt),
}

impl PromptHandle {
    pub fn id(&self) -> Uuid {
        match self {
            PromptHandle::Text(prompt) => prompt.id(),
            PromptHandle::Chat(prompt) => prompt.id(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            PromptHandle::Text(prompt) => prompt.name(),
            PromptHandle::Chat(prompt) => prompt.name(),
        }
    }

    pub fn commit(&self) -> &str {
        match self {
            PromptHandle::Text(prompt) => prompt.commit(),
            PromptHandle::Chat(prompt) => prompt.commit(),
        }
    }

    pub fn version(&self) -> &PromptVersion {
        match self {
            PromptHandle::Text(prompt) => prompt.version(),
            PromptHandle::Chat(prompt) => prompt.version(),
        }
    }

    pub async fn update_properties(
        &mut self,
        properties: PromptProperties,
    ) -> Result<(), DomainError> {
        match self {
            PromptHandle::Text(prompt) => prompt.update_properties(properties).await.map(|_| ()),
            PromptHandle::Chat(prompt) => prompt.update_properties(properties).await.map(|_| ()),
        }
    }

    pub async fn delete(&self) -> Result<(), DomainError> {
        match self {
            PromptHandle::Text(prompt) => prompt.delete().await,
            PromptHandle::Chat(prompt) => prompt.delete().await,
        }
    }

    pub async fn get_versions(
        &self,
        filter: VersionFilter,
    ) -> Result<Vec<PromptVersion>, DomainError> {
        match self {
            PromptHandle::Text(prompt) => prompt.get_versions(filter).await,
            PromptHandle::Chat(prompt) => prompt.get_versions(filter).await,
        }
    }

    pub async fn get_version(&self, commit: &str) -> Result<Option<PromptVersion>, DomainError> {
        match self {
            PromptHandle::Text(prompt) => prompt.get_version(commit).await,
            PromptHandle::Chat(prompt) => prompt.get_version(commit).await,
        }
    }
}

/// Load a prompt and bind a handle of the matching kind
pub async fn load_prompt(
    store: Arc<dyn PromptStore>,
    prompt_id: Uuid,
) -> Result<PromptHandle, DomainError> {
    let record = store.get_prompt(prompt_id).await?;
    match record.version.template {
        PromptTemplate::Text(_) => Ok(PromptHandle::Text(Prompt::from_record(store, record)?)),
        PromptTemplate::Chat(_) => Ok(PromptHandle::Chat(ChatPrompt::from_record(store, record)?)),
    }
}

/// Resolve a partial property update against current state into the full
/// tuple the backend expects
pub(crate) fn desired_update(
    properties: PromptProperties,
    current_name: &str,
    current_description: Option<&str>,
    current_tags: &[String],
) -> PromptUpdate {
    PromptUpdate {
        name: properties
            .name
            .unwrap_or_else(|| current_name.to_string()),
        description: properties
            .description
            .or_else(|| current_description.map(str::to_string)),
        tags: properties.tags.unwrap_or_else(|| current_tags.to_vec()),
    }
}

/// Shared page-accumulation loop for version histories
pub(crate) async fn collect_versions(
    store: &dyn PromptStore,
    prompt_id: Uuid,
    filter: VersionFilter,
) -> Result<Vec<PromptVersion>, DomainError> {
    let mut versions = Vec::new();
    let mut page = 1;
    loop {
        let batch = store
            .list_versions(
                prompt_id,
                VersionQuery::page(page, VERSION_PAGE_SIZE).with_filter(filter.clone()),
            )
            .await?;
        let batch_len = batch.len();
        versions.extend(batch);
        if batch_len < VERSION_PAGE_SIZE {
            break;
        }
        page += 1;
    }
    debug!(prompt_id = %prompt_id, count = versions.len(), "collected version history");
    Ok(versions)
}

pub(crate) async fn lookup_version(
    store: &dyn PromptStore,
    prompt_id: Uuid,
    commit: &str,
) -> Result<Option<PromptVersion>, DomainError> {
    match store.get_version(prompt_id, commit).await {
        Ok(version) => Ok(Some(version)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::test_support::InMemoryPromptStore;
    use serde_json::json;

    fn store_with_text(template: &str) -> (Arc<InMemoryPromptStore>, Prompt) {
        let store = Arc::new(InMemoryPromptStore::text_prompt("greeting", template));
        let record = store.current_record();
        let prompt = Prompt::from_record(store.clone(), record).unwrap();
        (store, prompt)
    }

    #[test]
    fn test_format_uses_no_backend() {
        let (_, prompt) = store_with_text("Hello {{name}}!");
        let out = prompt
            .format(json!({ "name": "World" }).as_object().unwrap())
            .unwrap();
        assert_eq!(out, "Hello World!");
    }

    #[tokio::test]
    async fn test_update_properties_mirrors_on_success() {
        let (store, mut prompt) = store_with_text("x");
        prompt
            .update_properties(
                PromptProperties::default().with_tags(vec!["prod".to_string()]),
            )
            .await
            .unwrap();

        // name defaulted to current, tags replaced
        assert_eq!(prompt.name(), "greeting");
        assert_eq!(prompt.tags(), ["prod".to_string()]);
        let written = store.last_update().unwrap();
        assert_eq!(written.name, "greeting");
        assert_eq!(written.tags, vec!["prod".to_string()]);
    }

    #[tokio::test]
    async fn test_update_properties_leaves_state_on_failure() {
        let (store, mut prompt) = store_with_text("x");
        store.fail_next_update();

        let err = prompt
            .update_properties(PromptProperties::named("renamed"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, DomainError::ExternalService(_)));
        assert_eq!(prompt.name(), "greeting");
    }

    #[tokio::test]
    async fn test_get_version_maps_not_found_to_none() {
        let (_, prompt) = store_with_text("x");
        let version = prompt.get_version("no-such-commit").await.unwrap();
        assert!(version.is_none());
    }

    #[tokio::test]
    async fn test_get_version_propagates_other_failures() {
        let (store, prompt) = store_with_text("x");
        store.fail_next_get_version();
        let err = prompt.get_version("whatever").await.unwrap_err();
        assert!(matches!(err, DomainError::ExternalService(_)));
    }

    #[tokio::test]
    async fn test_get_versions_accumulates_pages_until_short_page() {
        let (store, prompt) = store_with_text("x");
        store.seed_versions(VERSION_PAGE_SIZE + 40);

        let versions = prompt.get_versions(VersionFilter::default()).await.unwrap();
        assert_eq!(versions.len(), VERSION_PAGE_SIZE + 40);
        assert_eq!(store.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_use_version_returns_new_handle_and_keeps_self() {
        let (_, prompt) = store_with_text("v1 template");
        let original_commit = prompt.commit().to_string();
        let history = prompt.get_versions(VersionFilter::default()).await.unwrap();

        let restored = prompt.use_version(&history[0]).await.unwrap();
        assert_ne!(restored.commit(), original_commit);
        assert_eq!(prompt.commit(), original_commit);
        assert_ne!(restored.version_id(), prompt.version_id());
    }

    #[tokio::test]
    async fn test_chat_record_rejected() {
        let store = Arc::new(InMemoryPromptStore::chat_prompt(
            "support",
            vec![crate::domain::value_objects::ChatMessage::new("system", "hi")],
        ));
        let record = store.current_record();
        let err = Prompt::from_record(store, record).err().unwrap();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn test_metadata_returns_deep_copy() {
        let store = Arc::new(InMemoryPromptStore::text_prompt("greeting", "x"));
        let mut record = store.current_record();
        record.version.metadata = Some(json!({ "team": "core" }));
        let prompt = Prompt::from_record(store, record).unwrap();

        let mut copy = prompt.metadata().unwrap();
        copy["team"] = json!("hijacked");
        assert_eq!(prompt.metadata().unwrap()["team"], "core");
    }
}
