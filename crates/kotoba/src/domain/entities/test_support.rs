//! In-memory PromptStore double for entity tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::{PromptTemplate, PromptVersion};
use crate::domain::errors::DomainError;
use crate::domain::value_objects::{ChatMessage, TemplateType};
use crate::ports::repositories::{
    NewPrompt, PromptRecord, PromptStore, PromptUpdate, VersionQuery,
};

pub(crate) struct InMemoryPromptStore {
    record: Mutex<PromptRecord>,
    /// History, newest first; index 0 is the current version
    versions: Mutex<Vec<PromptVersion>>,
    fail_update: AtomicBool,
    fail_get_version: AtomicBool,
    updates: Mutex<Vec<PromptUpdate>>,
    list_calls: AtomicUsize,
}

fn short_commit() -> String {
    Uuid::new_v4().simple().to_string()[..7].to_string()
}

fn version_with(prompt_id: Uuid, template: PromptTemplate) -> PromptVersion {
    PromptVersion {
        version_id: Uuid::new_v4(),
        prompt_id,
        commit: short_commit(),
        template,
        template_type: TemplateType::Mustache,
        metadata: None,
        change_description: None,
        created_at: Some(chrono::Utc::now()),
        created_by: Some("tester".to_string()),
    }
}

impl InMemoryPromptStore {
    fn with_template(name: &str, template: PromptTemplate) -> Self {
        let prompt_id = Uuid::new_v4();
        let version = version_with(prompt_id, template);
        let record = PromptRecord {
            id: prompt_id,
            name: name.to_string(),
            description: None,
            tags: Vec::new(),
            version: version.clone(),
        };
        Self {
            record: Mutex::new(record),
            versions: Mutex::new(vec![version]),
            fail_update: AtomicBool::new(false),
            fail_get_version: AtomicBool::new(false),
            updates: Mutex::new(Vec::new()),
            list_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn text_prompt(name: &str, template: &str) -> Self {
        Self::with_template(name, PromptTemplate::Text(template.to_string()))
    }

    pub(crate) fn chat_prompt(name: &str, messages: Vec<ChatMessage>) -> Self {
        Self::with_template(name, PromptTemplate::Chat(messages))
    }

    pub(crate) fn current_record(&self) -> PromptRecord {
        self.record.lock().unwrap().clone()
    }

    pub(crate) fn fail_next_update(&self) {
        self.fail_update.store(true, Ordering::SeqCst);
    }

    pub(crate) fn fail_next_get_version(&self) {
        self.fail_get_version.store(true, Ordering::SeqCst);
    }

    pub(crate) fn last_update(&self) -> Option<PromptUpdate> {
        self.updates.lock().unwrap().last().cloned()
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Grow the history to `total` versions (newest first ordering kept)
    pub(crate) fn seed_versions(&self, total: usize) {
        let record = self.current_record();
        let mut versions = self.versions.lock().unwrap();
        let template = record.version.template.clone();
        while versions.len() < total {
            versions.push(version_with(record.id, template.clone()));
        }
    }
}

#[async_trait]
impl PromptStore for InMemoryPromptStore {
    async fn create_prompt(&self, _prompt: NewPrompt) -> Result<PromptRecord, DomainError> {
        Ok(self.current_record())
    }

    async fn get_prompt(&self, _prompt_id: Uuid) -> Result<PromptRecord, DomainError> {
        Ok(self.current_record())
    }

    async fn update_prompt(
        &self,
        _prompt_id: Uuid,
        update: PromptUpdate,
    ) -> Result<(), DomainError> {
        if self.fail_update.swap(false, Ordering::SeqCst) {
            return Err(DomainError::ExternalService("update refused".to_string()));
        }
        let mut record = self.record.lock().unwrap();
        record.name = update.name.clone();
        record.description = update.description.clone();
        record.tags = update.tags.clone();
        self.updates.lock().unwrap().push(update);
        Ok(())
    }

    async fn delete_prompt(&self, _prompt_id: Uuid) -> Result<(), DomainError> {
        Ok(())
    }

    async fn list_versions(
        &self,
        _prompt_id: Uuid,
        query: VersionQuery,
    ) -> Result<Vec<PromptVersion>, DomainError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let versions = self.versions.lock().unwrap();
        let start = (query.page.max(1) - 1) * query.size;
        Ok(versions
            .iter()
            .skip(start)
            .take(query.size)
            .cloned()
            .collect())
    }

    async fn get_version(
        &self,
        _prompt_id: Uuid,
        commit: &str,
    ) -> Result<PromptVersion, DomainError> {
        if self.fail_get_version.swap(false, Ordering::SeqCst) {
            return Err(DomainError::ExternalService("backend down".to_string()));
        }
        self.versions
            .lock()
            .unwrap()
            .iter()
            .find(|v| v.commit == commit)
            .cloned()
            .ok_or_else(|| DomainError::not_found_str("PromptVersion", commit))
    }

    async fn restore_version(
        &self,
        _prompt_id: Uuid,
        version_id: Uuid,
    ) -> Result<PromptRecord, DomainError> {
        let template = {
            let versions = self.versions.lock().unwrap();
            versions
                .iter()
                .find(|v| v.version_id == version_id)
                .map(|v| v.template.clone())
                .ok_or_else(|| DomainError::not_found("PromptVersion", version_id))?
        };

        let mut record = self.record.lock().unwrap();
        let restored = version_with(record.id, template);
        self.versions.lock().unwrap().insert(0, restored.clone());
        record.version = restored;
        Ok(record.clone())
    }
}
