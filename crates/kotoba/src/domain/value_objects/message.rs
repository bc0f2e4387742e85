//! ChatMessage - Role-tagged chat template content
//!
//! A message's content is either a plain string or an ordered list of
//! typed content parts (text, image, video). Part types this client does
//! not recognize are preserved untouched so newer backend payloads
//! survive a round-trip.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::json;

/// A message in a chat prompt template
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    /// Free-form role ("system", "user", "assistant", ...)
    #[serde(default)]
    pub role: String,
    pub content: MessageContent,
}

impl ChatMessage {
    /// Create a plain text message
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: MessageContent::Text(content.into()),
        }
    }

    /// Create a message with structured content parts
    pub fn with_parts(role: impl Into<String>, parts: Vec<ContentPart>) -> Self {
        Self {
            role: role.into(),
            content: MessageContent::Parts(parts),
        }
    }
}

/// Message content: a plain string or structured content parts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// One typed content part of a chat message.
///
/// Serialized with a `type` discriminator (`text`, `image_url`,
/// `video_url`); anything else deserializes into `Other` and serializes
/// back out byte-for-byte.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
    VideoUrl { video_url: VideoUrl },
    Other(serde_json::Value),
}

impl ContentPart {
    /// Convenience constructor for a text part
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

impl Serialize for ContentPart {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ContentPart::Text { text } => {
                json!({ "type": "text", "text": text }).serialize(serializer)
            }
            ContentPart::ImageUrl { image_url } => {
                json!({ "type": "image_url", "image_url": image_url }).serialize(serializer)
            }
            ContentPart::VideoUrl { video_url } => {
                json!({ "type": "video_url", "video_url": video_url }).serialize(serializer)
            }
            ContentPart::Other(value) => value.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ContentPart {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        match value.get("type").and_then(|t| t.as_str()) {
            Some("text") => {
                let text = value
                    .get("text")
                    .and_then(|t| t.as_str())
                    .ok_or_else(|| D::Error::custom("text part without text field"))?;
                Ok(ContentPart::Text {
                    text: text.to_string(),
                })
            }
            Some("image_url") => {
                let image_url = value
                    .get("image_url")
                    .cloned()
                    .ok_or_else(|| D::Error::custom("image part without image_url field"))?;
                let image_url = serde_json::from_value(image_url).map_err(D::Error::custom)?;
                Ok(ContentPart::ImageUrl { image_url })
            }
            Some("video_url") => {
                let video_url = value
                    .get("video_url")
                    .cloned()
                    .ok_or_else(|| D::Error::custom("video part without video_url field"))?;
                let video_url = serde_json::from_value(video_url).map_err(D::Error::custom)?;
                Ok(ContentPart::VideoUrl { video_url })
            }
            _ => Ok(ContentPart::Other(value)),
        }
    }
}

/// Image reference with optional rendering detail
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageUrl {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Video reference with optional transport metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoUrl {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_content_stays_string() {
        let message: ChatMessage =
            serde_json::from_value(json!({ "role": "user", "content": "hello" })).unwrap();
        assert_eq!(message.content, MessageContent::Text("hello".to_string()));
    }

    #[test]
    fn test_typed_parts_deserialize() {
        let message: ChatMessage = serde_json::from_value(json!({
            "role": "user",
            "content": [
                { "type": "text", "text": "look at this" },
                { "type": "image_url", "image_url": { "url": "https://example.com/a.png", "detail": "high" } },
            ]
        }))
        .unwrap();

        let MessageContent::Parts(parts) = &message.content else {
            panic!("expected structured parts");
        };
        assert_eq!(parts.len(), 2);
        assert_eq!(
            parts[1],
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: "https://example.com/a.png".to_string(),
                    detail: Some("high".to_string()),
                }
            }
        );
    }

    #[test]
    fn test_unknown_part_roundtrips_unchanged() {
        let raw = json!({ "type": "audio_url", "audio_url": { "url": "https://example.com/a.mp3" } });
        let part: ContentPart = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(part, ContentPart::Other(raw.clone()));
        assert_eq!(serde_json::to_value(&part).unwrap(), raw);
    }

    #[test]
    fn test_missing_role_defaults_to_empty() {
        let message: ChatMessage = serde_json::from_value(json!({ "content": "orphan" })).unwrap();
        assert!(message.role.is_empty());
    }
}
