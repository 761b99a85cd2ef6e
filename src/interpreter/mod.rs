//! Keyword-specific micro-parsers for tag field groups.
//!
//! Each interpreter takes the fields collected for one occurrence of a keyword and turns
//! them into a piece of a [`Route`](crate::route::Route). Interpreters that read a type
//! expression resolve it through the [`Context`](crate::context::Context) and hand back the
//! dependent type names so the caller can register them once the route is accepted.
//!
//! - [`parameter`] - path, query and body parameters
//! - [`example`] - request/response examples
//! - this module - methods, resources, descriptions and responses

pub mod example;
pub mod parameter;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::route::HttpMethod;
use crate::type_resolver::TypeDescriptor;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Value attached to a keyword in a structured route declaration.
///
/// Tags read from an annotation block always arrive as [`FieldValue::Fields`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// A switch, used for extension keywords (`auth: true`)
    Flag(bool),
    Text(String),
    Fields(Vec<String>),
    /// Several occurrences of a repeatable keyword (`queries: [[...], [...]]`)
    Groups(Vec<Vec<String>>),
}

impl FieldValue {
    /// Single string value, accepting a one-element field list
    pub fn into_text(self, keyword: &str) -> Result<String> {
        match self {
            FieldValue::Text(text) => Ok(text),
            FieldValue::Fields(fields) if fields.len() == 1 => {
                Ok(fields.into_iter().next().unwrap_or_default())
            }
            _ => Err(Error::WrongValueKind {
                keyword: keyword.to_string(),
                expected: "string",
            }),
        }
    }

    /// Single string value; the fields of a list are joined with spaces
    pub fn into_joined_text(self, keyword: &str) -> Result<String> {
        match self {
            FieldValue::Fields(fields) if !fields.is_empty() => Ok(fields
                .iter()
                .map(|field| field.trim())
                .filter(|field| !field.is_empty())
                .collect::<Vec<_>>()
                .join(" ")),
            other => other.into_text(keyword),
        }
    }

    /// Field list, accepting a single string as a one-element list
    pub fn into_fields(self, keyword: &str) -> Result<Vec<String>> {
        match self {
            FieldValue::Fields(fields) => Ok(fields),
            FieldValue::Text(text) => Ok(vec![text]),
            _ => Err(Error::WrongValueKind {
                keyword: keyword.to_string(),
                expected: "list of strings",
            }),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        FieldValue::Fields(value)
    }
}

/// Response declared with `@response`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Response {
    pub status: u16,
    #[serde(rename = "type")]
    pub descriptor: TypeDescriptor,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

fn resource_re() -> &'static Regex {
    static RESOURCE_RE: OnceLock<Regex> = OnceLock::new();
    RESOURCE_RE.get_or_init(|| {
        Regex::new(r"(?i)^(GET|HEAD|POST|PUT|DELETE|PATCH|OPTIONS)\s+(.+)$").expect("Invalid regex")
    })
}

fn status_re() -> &'static Regex {
    static STATUS_RE: OnceLock<Regex> = OnceLock::new();
    STATUS_RE.get_or_init(|| Regex::new(r"^(\d+)\s+(.*)$").expect("Invalid regex"))
}

pub fn parse_method(text: &str) -> Result<HttpMethod> {
    HttpMethod::parse(text.trim())
}

/// Parses a resource path, optionally prefixed by its method (`GET /books`)
pub fn parse_resource(text: &str) -> Result<(Option<HttpMethod>, String)> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::EmptyResource);
    }

    let (method, path) = match resource_re().captures(text) {
        Some(caps) => (Some(HttpMethod::parse(&caps[1])?), caps[2].trim().to_string()),
        None => (None, text.to_string()),
    };

    if !path.starts_with('/') {
        return Err(Error::InvalidResource(path));
    }
    Ok((method, path))
}

/// Builds a description out of its lines.
///
/// A first line followed by a blank line and more text is returned separately as the title.
/// Blank lines separate paragraphs, and a trailing backslash forces a line break.
pub fn parse_description(lines: &[String]) -> (String, Option<String>) {
    let trimmed: Vec<&str> = lines.iter().map(|line| line.trim()).collect();

    let mut body: &[&str] = &trimmed;
    let mut title = None;
    if trimmed.len() >= 3 && !trimmed[0].is_empty() && trimmed[1].is_empty() && !trimmed[2].is_empty()
    {
        title = Some(trimmed[0].to_string());
        body = &trimmed[1..];
    }

    let mut description = String::new();
    let mut separator = "";
    for line in body {
        if line.is_empty() {
            if !description.is_empty() {
                separator = "\n\n";
            }
            continue;
        }
        let (text, forced_break) = match line.strip_suffix('\\') {
            Some(text) => (text.trim_end(), true),
            None => (*line, false),
        };
        description.push_str(separator);
        description.push_str(text);
        separator = if forced_break { "\n" } else { " " };
    }

    (description, title)
}

/// Splits `{type} rest` into the type token and the rest, matching nested braces
pub(crate) fn split_braced_type<'a>(keyword: &str, text: &'a str) -> Result<(&'a str, &'a str)> {
    let malformed = |message: &str| Error::MalformedField {
        keyword: keyword.to_string(),
        message: message.to_string(),
    };

    let inner = text
        .strip_prefix('{')
        .ok_or_else(|| malformed("expected a type between braces"))?;
    let mut depth = 1usize;
    for (index, c) in inner.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((inner[..index].trim(), inner[index + 1..].trim()));
                }
            }
            _ => {}
        }
    }
    Err(malformed("unclosed type brace"))
}

/// Strips the optional dash that separates a description
pub(crate) fn strip_dash(text: &str) -> &str {
    let text = text.trim();
    match text.strip_prefix('-') {
        Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => rest.trim(),
        _ => text,
    }
}

/// Parses `[status] {type} [- ] description`; the status defaults to 200.
///
/// # Returns
///
/// The response and the type names it depends on.
pub fn parse_response(context: &mut Context, fields: &[String]) -> Result<(Response, Vec<String>)> {
    let text = fields
        .iter()
        .map(|field| field.trim())
        .filter(|field| !field.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() {
        return Err(Error::MissingDefinition("response".to_string()));
    }

    let (status, rest) = match status_re().captures(&text) {
        Some(caps) => {
            let code = &caps[1];
            let status = code
                .parse::<u16>()
                .ok()
                .filter(|status| (100..=999).contains(status))
                .ok_or_else(|| Error::InvalidStatusCode(code.to_string()))?;
            (status, caps.get(2).map_or("", |m| m.as_str()).to_string())
        }
        None => (200, text.clone()),
    };

    let (type_expr, rest) = split_braced_type("response", &rest)?;
    let resolved = context.resolve(type_expr)?;
    debug!("Response {} resolved to {}", status, resolved.descriptor.name);

    let response = Response {
        status,
        descriptor: resolved.descriptor,
        description: strip_dash(rest).to_string(),
    };
    Ok((response, resolved.dependents))
}
