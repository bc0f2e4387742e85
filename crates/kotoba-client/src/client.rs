//! Prompt service API client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use tracing::debug;
use uuid::Uuid;

use kotoba::{
    DomainError, NewPrompt, PromptRecord, PromptStore, PromptUpdate, PromptVersion, VersionQuery,
};

use crate::dto::VersionPage;

/// Default request timeout for prompt service calls
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default prompt service base URL
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// HTTP client for the Kotoba prompt service
#[derive(Clone)]
pub struct PromptServiceClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl PromptServiceClient {
    /// Create a new API client
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self::with_timeout(base_url, api_key, DEFAULT_TIMEOUT_SECS)
    }

    /// Create a client with a custom timeout (for testing)
    pub fn with_timeout(base_url: &str, api_key: &str, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Create a client from environment variables.
    ///
    /// Uses `KOTOBA_BASE_URL` and `KOTOBA_API_KEY`, falling back to
    /// defaults if not set.
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("KOTOBA_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let api_key = std::env::var("KOTOBA_API_KEY").unwrap_or_default();
        Self::new(&base_url, &api_key)
    }

    /// Test connection with health check
    pub async fn health(&self) -> Result<bool, DomainError> {
        let url = format!("{}/health", self.base_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(connection_error)?;
        Ok(resp.status().is_success())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.api_key)
    }

    /// Map HTTP failures: 404 becomes `NotFound`, anything else
    /// non-success carries status and body
    async fn check(resp: Response, entity: &str, id: &str) -> Result<Response, DomainError> {
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(DomainError::not_found_str(entity, id));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DomainError::ExternalService(format!(
                "API error ({}): {}",
                status, body
            )));
        }
        Ok(resp)
    }
}

fn connection_error(e: reqwest::Error) -> DomainError {
    DomainError::ExternalService(format!("Failed to connect to prompt service: {}", e))
}

fn decode_error(e: reqwest::Error) -> DomainError {
    DomainError::ExternalService(format!("Failed to parse response: {}", e))
}

#[async_trait]
impl PromptStore for PromptServiceClient {
    async fn create_prompt(&self, prompt: NewPrompt) -> Result<PromptRecord, DomainError> {
        let url = self.url("/v2/prompts");
        debug!(name = %prompt.name, "creating prompt");

        let resp = self
            .client
            .post(&url)
            .header("Authorization", self.bearer())
            .json(&prompt)
            .send()
            .await
            .map_err(connection_error)?;

        let resp = Self::check(resp, "Prompt", &prompt.name).await?;
        resp.json().await.map_err(decode_error)
    }

    async fn get_prompt(&self, prompt_id: Uuid) -> Result<PromptRecord, DomainError> {
        let url = self.url(&format!("/v2/prompts/{}", prompt_id));

        let resp = self
            .client
            .get(&url)
            .header("Authorization", self.bearer())
            .send()
            .await
            .map_err(connection_error)?;

        let resp = Self::check(resp, "Prompt", &prompt_id.to_string()).await?;
        resp.json().await.map_err(decode_error)
    }

    async fn update_prompt(
        &self,
        prompt_id: Uuid,
        update: PromptUpdate,
    ) -> Result<(), DomainError> {
        let url = self.url(&format!("/v2/prompts/{}", prompt_id));
        debug!(prompt_id = %prompt_id, name = %update.name, "updating prompt properties");

        let resp = self
            .client
            .patch(&url)
            .header("Authorization", self.bearer())
            .json(&update)
            .send()
            .await
            .map_err(connection_error)?;

        Self::check(resp, "Prompt", &prompt_id.to_string()).await?;
        Ok(())
    }

    async fn delete_prompt(&self, prompt_id: Uuid) -> Result<(), DomainError> {
        let url = self.url(&format!("/v2/prompts/{}", prompt_id));
        debug!(prompt_id = %prompt_id, "deleting prompt");

        let resp = self
            .client
            .delete(&url)
            .header("Authorization", self.bearer())
            .send()
            .await
            .map_err(connection_error)?;

        Self::check(resp, "Prompt", &prompt_id.to_string()).await?;
        Ok(())
    }

    async fn list_versions(
        &self,
        prompt_id: Uuid,
        query: VersionQuery,
    ) -> Result<Vec<PromptVersion>, DomainError> {
        let url = self.url(&format!("/v2/prompts/{}/versions", prompt_id));

        // optional refinements are only sent when set, for backends that
        // do not support them
        let mut params: Vec<(&str, String)> = vec![
            ("page", query.page.to_string()),
            ("size", query.size.to_string()),
        ];
        if let Some(search) = &query.filter.search {
            params.push(("search", search.clone()));
        }
        if let Some(sort_by) = &query.filter.sort_by {
            params.push(("sort_by", sort_by.clone()));
        }
        if let Some(sort_order) = &query.filter.sort_order {
            params.push(("sort_order", sort_order.clone()));
        }

        let resp = self
            .client
            .get(&url)
            .header("Authorization", self.bearer())
            .query(&params)
            .send()
            .await
            .map_err(connection_error)?;

        let resp = Self::check(resp, "Prompt", &prompt_id.to_string()).await?;
        let page: VersionPage = resp.json().await.map_err(decode_error)?;
        Ok(page.data)
    }

    async fn get_version(
        &self,
        prompt_id: Uuid,
        commit: &str,
    ) -> Result<PromptVersion, DomainError> {
        let url = self.url(&format!("/v2/prompts/{}/versions/{}", prompt_id, commit));

        let resp = self
            .client
            .get(&url)
            .header("Authorization", self.bearer())
            .send()
            .await
            .map_err(connection_error)?;

        let resp = Self::check(resp, "PromptVersion", commit).await?;
        resp.json().await.map_err(decode_error)
    }

    async fn restore_version(
        &self,
        prompt_id: Uuid,
        version_id: Uuid,
    ) -> Result<PromptRecord, DomainError> {
        let url = self.url(&format!(
            "/v2/prompts/{}/versions/{}/restore",
            prompt_id, version_id
        ));
        debug!(prompt_id = %prompt_id, version_id = %version_id, "restoring prompt version");

        let resp = self
            .client
            .post(&url)
            .header("Authorization", self.bearer())
            .send()
            .await
            .map_err(connection_error)?;

        let resp = Self::check(resp, "PromptVersion", &version_id.to_string()).await?;
        resp.json().await.map_err(decode_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kotoba::{VersionFilter, VERSION_PAGE_SIZE};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn version_json(prompt_id: Uuid, commit: &str) -> serde_json::Value {
        json!({
            "version_id": Uuid::new_v4(),
            "prompt_id": prompt_id,
            "commit": commit,
            "template": "Hello {{name}}!",
            "template_type": "mustache",
            "created_by": "mai",
        })
    }

    fn record_json(prompt_id: Uuid, commit: &str) -> serde_json::Value {
        json!({
            "id": prompt_id,
            "name": "greeting",
            "tags": ["prod"],
            "version": version_json(prompt_id, commit),
        })
    }

    #[tokio::test]
    async fn test_get_version_decodes_domain_version() {
        let server = MockServer::start().await;
        let prompt_id = Uuid::new_v4();
        Mock::given(method("GET"))
            .and(path(format!("/v2/prompts/{}/versions/abc1234", prompt_id)))
            .and(header("Authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(version_json(prompt_id, "abc1234")))
            .mount(&server)
            .await;

        let client = PromptServiceClient::new(&server.uri(), "test-key");
        let version = client.get_version(prompt_id, "abc1234").await.unwrap();
        assert_eq!(version.commit, "abc1234");
        assert_eq!(version.text(), Some("Hello {{name}}!"));
        assert_eq!(version.created_by.as_deref(), Some("mai"));
    }

    #[tokio::test]
    async fn test_get_version_404_maps_to_not_found() {
        let server = MockServer::start().await;
        let prompt_id = Uuid::new_v4();
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = PromptServiceClient::new(&server.uri(), "test-key");
        let err = client.get_version(prompt_id, "missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_server_error_carries_status_and_body() {
        let server = MockServer::start().await;
        let prompt_id = Uuid::new_v4();
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = PromptServiceClient::new(&server.uri(), "test-key");
        let err = client.get_version(prompt_id, "abc1234").await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("500"));
        assert!(message.contains("boom"));
    }

    #[tokio::test]
    async fn test_list_versions_sends_page_and_omits_unset_filters() {
        let server = MockServer::start().await;
        let prompt_id = Uuid::new_v4();
        Mock::given(method("GET"))
            .and(path(format!("/v2/prompts/{}/versions", prompt_id)))
            .and(query_param("page", "1"))
            .and(query_param("size", VERSION_PAGE_SIZE.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [version_json(prompt_id, "abc1234")],
                "meta": { "page": 1, "limit": 100, "total_items": 1, "total_pages": 1 },
            })))
            .mount(&server)
            .await;

        let client = PromptServiceClient::new(&server.uri(), "test-key");
        let versions = client
            .list_versions(prompt_id, VersionQuery::page(1, VERSION_PAGE_SIZE))
            .await
            .unwrap();
        assert_eq!(versions.len(), 1);

        let requests = server.received_requests().await.unwrap();
        let query = requests[0].url.query().unwrap_or_default().to_string();
        assert!(!query.contains("search"));
        assert!(!query.contains("sort_by"));
    }

    #[tokio::test]
    async fn test_list_versions_forwards_set_filters() {
        let server = MockServer::start().await;
        let prompt_id = Uuid::new_v4();
        Mock::given(method("GET"))
            .and(query_param("search", "tone"))
            .and(query_param("sort_by", "created_at"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
            .mount(&server)
            .await;

        let client = PromptServiceClient::new(&server.uri(), "test-key");
        let filter = VersionFilter {
            search: Some("tone".to_string()),
            sort_by: Some("created_at".to_string()),
            sort_order: None,
        };
        let versions = client
            .list_versions(prompt_id, VersionQuery::page(1, 100).with_filter(filter))
            .await
            .unwrap();
        assert!(versions.is_empty());
    }

    #[tokio::test]
    async fn test_update_prompt_patches_full_tuple() {
        let server = MockServer::start().await;
        let prompt_id = Uuid::new_v4();
        let update = PromptUpdate {
            name: "greeting".to_string(),
            description: Some("welcome copy".to_string()),
            tags: vec!["prod".to_string()],
        };
        Mock::given(method("PATCH"))
            .and(path(format!("/v2/prompts/{}", prompt_id)))
            .and(body_json(&update))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = PromptServiceClient::new(&server.uri(), "test-key");
        client.update_prompt(prompt_id, update).await.unwrap();
    }

    #[tokio::test]
    async fn test_restore_returns_record_with_new_version() {
        let server = MockServer::start().await;
        let prompt_id = Uuid::new_v4();
        let version_id = Uuid::new_v4();
        Mock::given(method("POST"))
            .and(path(format!(
                "/v2/prompts/{}/versions/{}/restore",
                prompt_id, version_id
            )))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(record_json(prompt_id, "def5678")),
            )
            .mount(&server)
            .await;

        let client = PromptServiceClient::new(&server.uri(), "test-key");
        let record = client.restore_version(prompt_id, version_id).await.unwrap();
        assert_eq!(record.version.commit, "def5678");
        assert_eq!(record.name, "greeting");
    }

    #[tokio::test]
    async fn test_delete_prompt() {
        let server = MockServer::start().await;
        let prompt_id = Uuid::new_v4();
        Mock::given(method("DELETE"))
            .and(path(format!("/v2/prompts/{}", prompt_id)))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = PromptServiceClient::new(&server.uri(), "test-key");
        client.delete_prompt(prompt_id).await.unwrap();
    }
}
