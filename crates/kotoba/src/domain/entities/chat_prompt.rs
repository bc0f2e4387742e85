//! ChatPrompt - Chat prompt handle bound to one version
//!
//! Same contract as [`Prompt`](crate::domain::entities::Prompt) for a
//! message-sequence template: backend-first mutation, append-only
//! version history, modality-aware formatting.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::entities::prompt::{
    collect_versions, desired_update, lookup_version, PromptProperties,
};
use crate::domain::entities::{PromptTemplate, PromptVersion};
use crate::domain::errors::DomainError;
use crate::domain::value_objects::{ChatMessage, SupportedModalities};
use crate::ports::repositories::{PromptRecord, PromptStore, VersionFilter};
use crate::template::{self, Variables};

/// Handle to a chat prompt bound to one version
#[derive(Clone)]
pub struct ChatPrompt {
    store: Arc<dyn PromptStore>,
    id: Uuid,
    version_id: Uuid,
    name: String,
    description: Option<String>,
    tags: Vec<String>,
    version: PromptVersion,
}

impl ChatPrompt {
    /// Build a chat prompt handle from a backend record.
    ///
    /// Fails when the record's current version holds a text template.
    pub fn from_record(
        store: Arc<dyn PromptStore>,
        record: PromptRecord,
    ) -> Result<Self, DomainError> {
        if !matches!(record.version.template, PromptTemplate::Chat(_)) {
            return Err(DomainError::Validation(format!(
                "prompt '{}' holds a text template, use Prompt",
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

    /// The template's message sequence
    pub fn messages(&self) -> &[ChatMessage] {
        self.version.messages().unwrap_or_default()
    }

    /// Render all messages with default modalities. Pure; no backend
    /// call.
    pub fn format(&self, variables: &Variables) -> Result<Vec<ChatMessage>, DomainError> {
        self.format_with_modalities(variables, SupportedModalities::default())
    }

    /// Render all messages, collapsing content whose modality is
    /// disabled
    pub fn format_with_modalities(
        &self,
        variables: &Variables,
        modalities: SupportedModalities,
    ) -> Result<Vec<ChatMessage>, DomainError> {
        template::render_messages(
            self.messages(),
            variables,
            self.version.template_type,
            modalities,
        )
    }

    /// Update name/description/tags in one backend write, mirroring the
    /// tuple into local state only after the backend accepts it
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
    pub async fn use_version(&self, version: &PromptVersion) -> Result<ChatPrompt, DomainError> {
        let record = self
            .store
            .restore_version(self.id, version.version_id)
            .await?;
        ChatPrompt::from_record(Arc::clone(&self.store), record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::test_support::InMemoryPromptStore;
    use crate::domain::value_objects::{ContentPart, ImageUrl, MessageContent};
    use crate::template::IMAGE_PLACEHOLDER;
    use serde_json::json;

    fn chat_store() -> (Arc<InMemoryPromptStore>, ChatPrompt) {
        let store = Arc::new(InMemoryPromptStore::chat_prompt(
            "support",
            vec![
                ChatMessage::new("system", "You help {{team}}."),
                ChatMessage::with_parts(
                    "user",
                    vec![ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: "https://x/{{file}}".to_string(),
                            detail: None,
                        },
                    }],
                ),
            ],
        ));
        let record = store.current_record();
        let prompt = ChatPrompt::from_record(store.clone(), record).unwrap();
        (store, prompt)
    }

    #[test]
    fn test_format_renders_all_messages() {
        let (_, prompt) = chat_store();
        let rendered = prompt
            .format(
                json!({ "team": "support", "file": "a.png" })
                    .as_object()
                    .unwrap(),
            )
            .unwrap();
        assert_eq!(
            rendered[0].content,
            MessageContent::Text("You help support.".to_string())
        );
        assert_eq!(
            rendered[1].content,
            MessageContent::Parts(vec![ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: "https://x/a.png".to_string(),
                    detail: None,
                }
            }])
        );
    }

    #[test]
    fn test_format_with_disabled_vision_collapses() {
        let (_, prompt) = chat_store();
        let rendered = prompt
            .format_with_modalities(
                json!({ "team": "support", "file": "a.png" })
                    .as_object()
                    .unwrap(),
                SupportedModalities::without_vision(),
            )
            .unwrap();
        assert_eq!(
            rendered[1].content,
            MessageContent::Text(IMAGE_PLACEHOLDER.to_string())
        );
    }

    #[tokio::test]
    async fn test_use_version_keeps_self_bound() {
        let (_, prompt) = chat_store();
        let original = prompt.commit().to_string();
        let history = prompt.get_versions(VersionFilter::default()).await.unwrap();

        let restored = prompt.use_version(&history[0]).await.unwrap();
        assert_ne!(restored.commit(), original);
        assert_eq!(prompt.commit(), original);
    }

    #[tokio::test]
    async fn test_text_record_rejected() {
        let store = Arc::new(InMemoryPromptStore::text_prompt("greeting", "hello"));
        let record = store.current_record();
        let err = ChatPrompt::from_record(store, record).err().unwrap();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
