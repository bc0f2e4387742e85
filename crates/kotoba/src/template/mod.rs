//! Template Engine
//!
//! Renders a single template string given a JSON variable map. Mustache
//! templates are parsed and validated locally; Jinja2 templates delegate
//! to minijinja. Unknown engine types pass the template through
//! unchanged.

pub mod chat;
mod jinja;
mod mustache;

pub use chat::{render_messages, IMAGE_PLACEHOLDER, VIDEO_PLACEHOLDER};
pub use mustache::template_variables;

use serde_json::{Map, Value};
use tracing::warn;

use crate::domain::errors::DomainError;
use crate::domain::value_objects::TemplateType;

/// Variable map supplied at format time
pub type Variables = Map<String, Value>;

/// Render a template with the engine selected by `template_type`.
///
/// Mustache templates are validated first: every root placeholder must
/// be present in `variables`, otherwise a [`DomainError::Validation`]
/// enumerates the missing names. Jinja2 engine errors surface as
/// [`DomainError::Template`].
pub fn format(
    template: &str,
    variables: &Variables,
    template_type: TemplateType,
) -> Result<String, DomainError> {
    match template_type {
        TemplateType::Mustache => mustache::render_validated(template, variables),
        TemplateType::Jinja2 => jinja::render(template, variables),
        TemplateType::Unknown => {
            warn!("unknown template type, rendering unchanged");
            Ok(template.to_string())
        }
    }
}
