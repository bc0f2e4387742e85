//! Chat template rendering with modality filtering
//!
//! Renders each message's content through the template engine. Parts
//! whose modality is disabled collapse to literal placeholder tokens; a
//! message left with only placeholders becomes a plain string, while a
//! mix keeps the structured parts and appends each placeholder as its
//! own text part.

use crate::domain::errors::DomainError;
use crate::domain::value_objects::{
    ChatMessage, ContentPart, ImageUrl, MessageContent, SupportedModalities, TemplateType,
    VideoUrl,
};
use crate::template::{format, Variables};

/// Placeholder emitted for an image part when vision is disabled
pub const IMAGE_PLACEHOLDER: &str = "<<<image>>><<</image>>>";
/// Placeholder emitted for a video part when video is disabled
pub const VIDEO_PLACEHOLDER: &str = "<<<video>>><<</video>>>";

/// Render a chat template: every message's textual content (including
/// URLs, which may carry variables) goes through the selected engine.
/// Messages without a role are skipped.
pub fn render_messages(
    messages: &[ChatMessage],
    variables: &Variables,
    template_type: TemplateType,
    modalities: SupportedModalities,
) -> Result<Vec<ChatMessage>, DomainError> {
    let mut rendered = Vec::with_capacity(messages.len());
    for message in messages {
        if message.role.is_empty() {
            continue;
        }
        let content = match &message.content {
            MessageContent::Text(text) => {
                MessageContent::Text(format(text, variables, template_type)?)
            }
            MessageContent::Parts(parts) => {
                render_parts(parts, variables, template_type, modalities)?
            }
        };
        rendered.push(ChatMessage {
            role: message.role.clone(),
            content,
        });
    }
    Ok(rendered)
}

fn render_parts(
    parts: &[ContentPart],
    variables: &Variables,
    template_type: TemplateType,
    modalities: SupportedModalities,
) -> Result<MessageContent, DomainError> {
    let mut kept: Vec<ContentPart> = Vec::new();
    let mut collapsed: Vec<&'static str> = Vec::new();

    for part in parts {
        match part {
            ContentPart::Text { text } => kept.push(ContentPart::Text {
                text: format(text, variables, template_type)?,
            }),
            ContentPart::ImageUrl { image_url } => {
                if modalities.vision_enabled() {
                    kept.push(ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: format(&image_url.url, variables, template_type)?,
                            detail: image_url.detail.clone(),
                        },
                    });
                } else {
                    collapsed.push(IMAGE_PLACEHOLDER);
                }
            }
            ContentPart::VideoUrl { video_url } => {
                if modalities.video_enabled() {
                    kept.push(ContentPart::VideoUrl {
                        video_url: VideoUrl {
                            url: format(&video_url.url, variables, template_type)?,
                            ..video_url.clone()
                        },
                    });
                } else {
                    collapsed.push(VIDEO_PLACEHOLDER);
                }
            }
            // unrecognized part types pass through without rendering
            ContentPart::Other(value) => kept.push(ContentPart::Other(value.clone())),
        }
    }

    // all structured content collapsed away: a scalar string suffices
    if kept.is_empty() && !collapsed.is_empty() {
        return Ok(MessageContent::Text(collapsed.join("\n")));
    }
    for placeholder in collapsed {
        kept.push(ContentPart::text(placeholder));
    }
    Ok(MessageContent::Parts(kept))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};

    fn vars(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn image(url: &str) -> ContentPart {
        ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: url.to_string(),
                detail: None,
            },
        }
    }

    fn video(url: &str) -> ContentPart {
        ContentPart::VideoUrl {
            video_url: VideoUrl {
                url: url.to_string(),
                mime_type: Some("video/mp4".to_string()),
                duration: Some(12.5),
                format: None,
                detail: None,
            },
        }
    }

    #[test]
    fn test_string_content_renders_and_stays_string() {
        let messages = vec![ChatMessage::new("user", "Hello {{name}}!")];
        let rendered = render_messages(
            &messages,
            &vars(json!({ "name": "World" })),
            TemplateType::Mustache,
            SupportedModalities::default(),
        )
        .unwrap();
        assert_eq!(
            rendered[0].content,
            MessageContent::Text("Hello World!".to_string())
        );
    }

    #[test]
    fn test_messages_without_role_are_skipped() {
        let messages = vec![
            ChatMessage::new("", "no role"),
            ChatMessage::new("user", "kept"),
        ];
        let rendered = render_messages(
            &messages,
            &vars(json!({})),
            TemplateType::Mustache,
            SupportedModalities::default(),
        )
        .unwrap();
        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].role, "user");
    }

    #[test]
    fn test_image_url_renders_variables_when_vision_enabled() {
        let messages = vec![ChatMessage::with_parts(
            "user",
            vec![image("https://cdn.example.com/{{file}}")],
        )];
        let rendered = render_messages(
            &messages,
            &vars(json!({ "file": "cat.png" })),
            TemplateType::Mustache,
            SupportedModalities::default(),
        )
        .unwrap();
        assert_eq!(
            rendered[0].content,
            MessageContent::Parts(vec![image("https://cdn.example.com/cat.png")])
        );
    }

    #[test]
    fn test_lone_disabled_image_collapses_to_plain_string() {
        let messages = vec![ChatMessage::with_parts("user", vec![image("https://x/a.png")])];
        let rendered = render_messages(
            &messages,
            &vars(json!({})),
            TemplateType::Mustache,
            SupportedModalities::without_vision(),
        )
        .unwrap();
        assert_eq!(
            rendered[0].content,
            MessageContent::Text(IMAGE_PLACEHOLDER.to_string())
        );
    }

    #[test]
    fn test_mixed_parts_append_placeholder_as_text_part() {
        let messages = vec![ChatMessage::with_parts(
            "user",
            vec![
                ContentPart::text("hello"),
                image("https://x/a.png"),
            ],
        )];
        let rendered = render_messages(
            &messages,
            &vars(json!({})),
            TemplateType::Mustache,
            SupportedModalities::without_vision(),
        )
        .unwrap();
        assert_eq!(
            rendered[0].content,
            MessageContent::Parts(vec![
                ContentPart::text("hello"),
                ContentPart::text(IMAGE_PLACEHOLDER),
            ])
        );
    }

    #[test]
    fn test_disabled_image_and_video_join_with_newline() {
        let messages = vec![ChatMessage::with_parts(
            "user",
            vec![image("https://x/a.png"), video("https://x/b.mp4")],
        )];
        let rendered = render_messages(
            &messages,
            &vars(json!({})),
            TemplateType::Mustache,
            SupportedModalities::text_only(),
        )
        .unwrap();
        assert_eq!(
            rendered[0].content,
            MessageContent::Text(format!("{}\n{}", IMAGE_PLACEHOLDER, VIDEO_PLACEHOLDER))
        );
    }

    #[test]
    fn test_video_metadata_preserved_when_enabled() {
        let messages = vec![ChatMessage::with_parts("user", vec![video("https://x/b.mp4")])];
        let rendered = render_messages(
            &messages,
            &vars(json!({})),
            TemplateType::Mustache,
            SupportedModalities::default(),
        )
        .unwrap();
        let MessageContent::Parts(parts) = &rendered[0].content else {
            panic!("expected parts");
        };
        let ContentPart::VideoUrl { video_url } = &parts[0] else {
            panic!("expected video part");
        };
        assert_eq!(video_url.mime_type.as_deref(), Some("video/mp4"));
        assert_eq!(video_url.duration, Some(12.5));
    }

    #[test]
    fn test_unrecognized_part_passes_through_unrendered() {
        let raw = json!({ "type": "audio_url", "audio_url": { "url": "{{not_rendered}}" } });
        let messages = vec![ChatMessage::with_parts(
            "user",
            vec![ContentPart::Other(raw.clone())],
        )];
        let rendered = render_messages(
            &messages,
            &vars(json!({})),
            TemplateType::Mustache,
            SupportedModalities::default(),
        )
        .unwrap();
        assert_eq!(
            rendered[0].content,
            MessageContent::Parts(vec![ContentPart::Other(raw)])
        );
    }
}
