//! Jinja2 rendering via minijinja
//!
//! No client-side placeholder validation here: the engine's own runtime
//! errors surface as template failures.

use minijinja::Environment;
use serde_json::{Map, Value};

use crate::domain::errors::DomainError;

pub fn render(template: &str, variables: &Map<String, Value>) -> Result<String, DomainError> {
    let env = Environment::new();
    env.render_str(template, Value::Object(variables.clone()))
        .map_err(|e| DomainError::Template(format!("jinja2 render failed: {}", e)))
}
