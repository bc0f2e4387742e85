//! Trace configuration

use serde::{Deserialize, Serialize};

/// Configuration for generation tracing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraceConfig {
    /// Name applied to traces and spans; defaults to "generation"
    pub name: Option<String>,
    /// Provider label; falls back to the wrapped client's provider name
    pub provider: Option<String>,
    /// Tags attached to every span
    #[serde(default)]
    pub tags: Vec<String>,
    /// Metadata attached to every span
    pub metadata: Option<serde_json::Value>,
}

impl TraceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the trace/span name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the provider label
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Set the tags attached to every span
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Set the metadata attached to every span
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub(crate) fn span_name(&self) -> &str {
        self.name.as_deref().unwrap_or("generation")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = TraceConfig::new()
            .with_name("support-bot")
            .with_provider("openai")
            .with_tags(vec!["prod".to_string()]);

        assert_eq!(config.span_name(), "support-bot");
        assert_eq!(config.provider.as_deref(), Some("openai"));
        assert_eq!(config.tags, vec!["prod".to_string()]);
    }

    #[test]
    fn test_span_name_defaults() {
        assert_eq!(TraceConfig::new().span_name(), "generation");
    }
}
