//! Mustache template parsing and rendering
//!
//! Hand-rolled so placeholder extraction can walk the token stream: value
//! tags, unescaped tags, section opens and inverted section opens all
//! contribute their root variable name. Rendering performs raw
//! substitution with no HTML escaping.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::domain::errors::DomainError;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Text(String),
    /// `{{name}}`
    Variable(String),
    /// `{{&name}}` - distinct for extraction, renders the same (raw)
    Unescaped(String),
    /// `{{#name}}`
    SectionOpen(String),
    /// `{{^name}}`
    InvertedOpen(String),
    /// `{{/name}}`
    SectionClose(String),
    /// `{{!comment}}`
    Comment,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Variable(String),
    Section {
        name: String,
        inverted: bool,
        children: Vec<Node>,
    },
}

fn excerpt(s: &str) -> String {
    s.chars().take(24).collect()
}

fn tokenize(template: &str) -> Result<Vec<Token>, DomainError> {
    let mut tokens = Vec::new();
    let mut rest = template;

    while let Some(start) = rest.find(OPEN) {
        if start > 0 {
            tokens.push(Token::Text(rest[..start].to_string()));
        }
        rest = &rest[start + OPEN.len()..];

        let end = rest.find(CLOSE).ok_or_else(|| {
            DomainError::Template(format!("unclosed tag near \"{}\"", excerpt(rest)))
        })?;
        let body = rest[..end].trim();
        rest = &rest[end + CLOSE.len()..];

        let (sigil, name) = match body.chars().next() {
            None => return Err(DomainError::Template("empty tag".to_string())),
            Some(c @ ('#' | '^' | '/' | '&' | '!')) => (Some(c), body[1..].trim()),
            Some('>') | Some('=') => {
                return Err(DomainError::Template(format!(
                    "unsupported tag \"{{{{{}}}}}\"",
                    body
                )));
            }
            Some(_) => (None, body),
        };

        if sigil != Some('!') && name.is_empty() {
            return Err(DomainError::Template(format!(
                "tag \"{{{{{}}}}}\" has no name",
                body
            )));
        }
        if name.contains('{') || name.contains('}') {
            return Err(DomainError::Template(format!(
                "malformed tag near \"{}\"",
                excerpt(name)
            )));
        }

        tokens.push(match sigil {
            Some('#') => Token::SectionOpen(name.to_string()),
            Some('^') => Token::InvertedOpen(name.to_string()),
            Some('/') => Token::SectionClose(name.to_string()),
            Some('&') => Token::Unescaped(name.to_string()),
            Some('!') => Token::Comment,
            _ => Token::Variable(name.to_string()),
        });
    }

    if !rest.is_empty() {
        tokens.push(Token::Text(rest.to_string()));
    }
    Ok(tokens)
}

/// Group a flat token stream into a section tree
fn parse(tokens: Vec<Token>) -> Result<Vec<Node>, DomainError> {
    let mut stack: Vec<(String, bool, Vec<Node>)> = Vec::new();
    let mut current: Vec<Node> = Vec::new();

    for token in tokens {
        match token {
            Token::Text(text) => current.push(Node::Text(text)),
            Token::Variable(name) | Token::Unescaped(name) => current.push(Node::Variable(name)),
            Token::Comment => {}
            Token::SectionOpen(name) => {
                stack.push((name, false, std::mem::take(&mut current)));
            }
            Token::InvertedOpen(name) => {
                stack.push((name, true, std::mem::take(&mut current)));
            }
            Token::SectionClose(name) => {
                let Some((open_name, inverted, parent)) = stack.pop() else {
                    return Err(DomainError::Template(format!(
                        "section close \"{{{{/{}}}}}\" without matching open",
                        name
                    )));
                };
                if open_name != name {
                    return Err(DomainError::Template(format!(
                        "section close \"{{{{/{}}}}}\" does not match open \"{{{{#{}}}}}\"",
                        name, open_name
                    )));
                }
                let children = std::mem::replace(&mut current, parent);
                current.push(Node::Section {
                    name: open_name,
                    inverted,
                    children,
                });
            }
        }
    }

    if let Some((name, _, _)) = stack.pop() {
        return Err(DomainError::Template(format!(
            "unclosed section \"{{{{#{}}}}}\"",
            name
        )));
    }
    Ok(current)
}

fn collect_roots(nodes: &[Node], names: &mut BTreeSet<String>) {
    for node in nodes {
        match node {
            Node::Text(_) => {}
            Node::Variable(name) => {
                insert_root(name, names);
            }
            Node::Section { name, children, .. } => {
                insert_root(name, names);
                collect_roots(children, names);
            }
        }
    }
}

fn insert_root(name: &str, names: &mut BTreeSet<String>) {
    if name == "." {
        return;
    }
    if let Some(root) = name.split('.').next() {
        names.insert(root.to_string());
    }
}

/// Root variable names referenced by a template, dotted paths reduced to
/// their first segment
pub fn template_variables(template: &str) -> Result<BTreeSet<String>, DomainError> {
    let nodes = parse(tokenize(template)?)?;
    let mut names = BTreeSet::new();
    collect_roots(&nodes, &mut names);
    Ok(names)
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}

fn lookup<'a>(stack: &'a [Value], name: &str) -> Option<&'a Value> {
    if name == "." {
        return stack.last();
    }
    let mut segments = name.split('.');
    let first = segments.next()?;
    let mut current = stack.iter().rev().find_map(|frame| frame.get(first))?;
    for segment in segments {
        current = current.get(segment)?;
    }
    Some(current)
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        Value::Array(_) | Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

fn render_nodes(nodes: &[Node], stack: &mut Vec<Value>, out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Variable(name) => {
                if let Some(value) = lookup(stack, name) {
                    out.push_str(&value_to_string(value));
                }
            }
            Node::Section {
                name,
                inverted,
                children,
            } => {
                let value = lookup(stack, name).cloned().unwrap_or(Value::Null);
                if *inverted {
                    if !truthy(&value) {
                        render_nodes(children, stack, out);
                    }
                    continue;
                }
                match value {
                    Value::Array(items) => {
                        for item in items {
                            stack.push(item);
                            render_nodes(children, stack, out);
                            stack.pop();
                        }
                    }
                    Value::Object(_) => {
                        stack.push(value);
                        render_nodes(children, stack, out);
                        stack.pop();
                    }
                    other if truthy(&other) => render_nodes(children, stack, out),
                    _ => {}
                }
            }
        }
    }
}

fn join_names<'a>(names: impl IntoIterator<Item = &'a String>) -> String {
    names
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Validate that every root placeholder is provided, then render.
///
/// The missing-placeholder message enumerates, on three lines, the
/// missing names, the template's full placeholder set and the provided
/// variable names. Extra variables are permitted.
pub fn render_validated(
    template: &str,
    variables: &Map<String, Value>,
) -> Result<String, DomainError> {
    let nodes = parse(tokenize(template)?)?;

    let mut placeholders = BTreeSet::new();
    collect_roots(&nodes, &mut placeholders);
    let provided: BTreeSet<String> = variables.keys().cloned().collect();
    let missing: Vec<&String> = placeholders.difference(&provided).collect();
    if !missing.is_empty() {
        return Err(DomainError::Validation(format!(
            "Missing variables: {}\nTemplate placeholders: {}\nProvided variables: {}",
            join_names(missing),
            join_names(&placeholders),
            join_names(&provided),
        )));
    }

    let mut stack = vec![Value::Object(variables.clone())];
    let mut out = String::new();
    render_nodes(&nodes, &mut stack, &mut out);
    Ok(out)
}
