//! TemplateType - Substitution engine selector

use serde::{Deserialize, Serialize};

/// Template engine used for placeholder substitution.
///
/// Immutable per template. Identifiers this client does not know map to
/// `Unknown`, which renders templates unchanged instead of failing, so
/// prompts written by a newer backend stay readable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TemplateType {
    #[default]
    Mustache,
    Jinja2,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for TemplateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateType::Mustache => write!(f, "mustache"),
            TemplateType::Jinja2 => write!(f, "jinja2"),
            TemplateType::Unknown => write!(f, "unknown"),
        }
    }
}

impl std::str::FromStr for TemplateType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mustache" => Ok(TemplateType::Mustache),
            "jinja2" | "jinja" => Ok(TemplateType::Jinja2),
            _ => Ok(TemplateType::Unknown),
        }
    }
}
