//! SupportedModalities - Structured content kinds a target model accepts

use serde::{Deserialize, Serialize};

/// Modality support flags for chat rendering.
///
/// Unset fields fall back to supported, so callers only name the
/// modalities they want to disable.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SupportedModalities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vision: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<bool>,
}

impl SupportedModalities {
    pub fn vision_enabled(&self) -> bool {
        self.vision.unwrap_or(true)
    }

    pub fn video_enabled(&self) -> bool {
        self.video.unwrap_or(true)
    }

    /// Disable image content
    pub fn without_vision() -> Self {
        Self {
            vision: Some(false),
            video: None,
        }
    }

    /// Disable video content
    pub fn without_video() -> Self {
        Self {
            vision: None,
            video: Some(false),
        }
    }

    /// Disable all structured media
    pub fn text_only() -> Self {
        Self {
            vision: Some(false),
            video: Some(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_enabled() {
        let modalities = SupportedModalities::default();
        assert!(modalities.vision_enabled());
        assert!(modalities.video_enabled());
    }

    #[test]
    fn test_partial_override_keeps_other_default() {
        let modalities = SupportedModalities::without_vision();
        assert!(!modalities.vision_enabled());
        assert!(modalities.video_enabled());
    }
}
