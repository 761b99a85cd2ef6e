//! Example interpreter for `@example` tags.
//!
//! An example is written as free text followed by an optional request URI, an optional
//! request body and an optional `<status>: <response>` line:
//!
//! ```text
//! @example Fetch the first book
//!   /books/1
//!   200: {
//!   "id": 1,
//!   "title": "Dune"
//!   }
//! ```
//!
//! Bodies are stored as text, re-indented by bracket depth. Nothing is validated as JSON.

use crate::error::{Error, Result};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// A request/response example attached to a route
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Example {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Description,
    Uri,
    Body,
    Response,
}

const INDENT: &str = "  ";

fn response_re() -> &'static Regex {
    static RESPONSE_RE: OnceLock<Regex> = OnceLock::new();
    RESPONSE_RE.get_or_init(|| Regex::new(r"^(\d+):(?:\s+(.*))?$").expect("Invalid regex"))
}

fn closing_re() -> &'static Regex {
    static CLOSING_RE: OnceLock<Regex> = OnceLock::new();
    CLOSING_RE.get_or_init(|| Regex::new(r"^[}\]],?$").expect("Invalid regex"))
}

fn opens_block(line: &str) -> bool {
    line.ends_with('{') || line.ends_with('[')
}

/// Appends a body line indented by the current bracket depth
fn push_line(blob: &mut String, depth: &mut usize, line: &str) {
    if closing_re().is_match(line) {
        *depth = depth.saturating_sub(1);
    }
    blob.push('\n');
    blob.push_str(&INDENT.repeat(*depth));
    blob.push_str(line);
    if opens_block(line) {
        *depth += 1;
    }
}

pub fn parse_example(fields: &[String]) -> Result<Example> {
    if fields.iter().all(|field| field.trim().is_empty()) {
        return Err(Error::MissingDefinition("example".to_string()));
    }

    let mut example = Example::default();
    let mut state = State::Description;
    let mut depth = 0usize;

    for line in fields.iter().map(|field| field.trim()) {
        if line.is_empty() {
            continue;
        }

        if let Some(caps) = response_re().captures(line) {
            let code = &caps[1];
            let status = code
                .parse::<u16>()
                .ok()
                .filter(|status| *status > 0)
                .ok_or_else(|| Error::InvalidStatusCode(code.to_string()))?;
            let text = caps.get(2).map_or("", |m| m.as_str().trim());
            example.status = Some(status);
            example.response = Some(text.to_string());
            depth = usize::from(opens_block(text));
            state = State::Response;
            continue;
        }

        let before_body = matches!(state, State::Description | State::Uri);
        if before_body && line.starts_with('/') {
            example.uri = Some(line.to_string());
            state = State::Uri;
            continue;
        }
        if before_body && (line.starts_with('{') || line.starts_with('[')) {
            example.body = Some(line.to_string());
            depth = usize::from(opens_block(line));
            state = State::Body;
            continue;
        }

        match state {
            State::Description => {
                if !example.description.is_empty() {
                    example.description.push(' ');
                }
                example.description.push_str(line);
            }
            State::Uri => {}
            State::Body => {
                if let Some(body) = example.body.as_mut() {
                    push_line(body, &mut depth, line);
                }
            }
            State::Response => {
                if let Some(response) = example.response.as_mut() {
                    push_line(response, &mut depth, line);
                }
            }
        }
    }

    Ok(example)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_full_example() {
        let fields = strings(&[
            "Create a book",
            "/books",
            "{",
            "\"title\": \"Dune\",",
            "\"tags\": [",
            "\"sf\"",
            "]",
            "}",
            "201: {",
            "\"id\": 1",
            "}",
        ]);
        let example = parse_example(&fields).unwrap();

        assert_eq!(example.description, "Create a book");
        assert_eq!(example.uri.as_deref(), Some("/books"));
        assert_eq!(
            example.body.as_deref(),
            Some("{\n  \"title\": \"Dune\",\n  \"tags\": [\n    \"sf\"\n  ]\n}")
        );
        assert_eq!(example.status, Some(201));
        assert_eq!(example.response.as_deref(), Some("{\n  \"id\": 1\n}"));
    }

    #[test]
    fn test_description_only() {
        let example = parse_example(&strings(&["Lists", "every book"])).unwrap();
        assert_eq!(example.description, "Lists every book");
        assert_eq!(example.uri, None);
        assert_eq!(example.status, None);
    }

    #[test]
    fn test_response_line_switches_from_any_state() {
        let fields = strings(&["[", "1,", "2", "]", "404: Not found"]);
        let example = parse_example(&fields).unwrap();
        assert_eq!(example.body.as_deref(), Some("[\n  1,\n  2\n]"));
        assert_eq!(example.status, Some(404));
        assert_eq!(example.response.as_deref(), Some("Not found"));
    }

    #[test]
    fn test_uri_after_body_is_body_content() {
        let fields = strings(&["{", "/not/a/uri", "}"]);
        let example = parse_example(&fields).unwrap();
        assert_eq!(example.uri, None);
        assert_eq!(example.body.as_deref(), Some("{\n  /not/a/uri\n}"));
    }

    #[test]
    fn test_invalid_status_code() {
        assert!(matches!(
            parse_example(&strings(&["0: nothing"])),
            Err(Error::InvalidStatusCode(_))
        ));
        assert!(matches!(
            parse_example(&strings(&["99999: too big"])),
            Err(Error::InvalidStatusCode(_))
        ));
        assert!(matches!(parse_example(&[]), Err(Error::MissingDefinition(_))));
    }
}
