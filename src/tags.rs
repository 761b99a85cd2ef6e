//! Tag parsing for annotation blocks.
//!
//! An annotation block is the doc comment attached to a route handler. Every line that
//! starts with `@keyword` opens a new field group for that keyword; the lines that follow
//! are appended to it until the next tag. Lines before the first tag belong to the
//! implicit `description` keyword.
//!
//! ```
//! use doc2api::tags::parse_annotation;
//!
//! let tags = parse_annotation("/// List the books\n/// @resource GET /books");
//! assert_eq!(tags.groups("resource"), &[vec!["GET /books".to_string()]]);
//! ```

use crate::error::{Error, Result};
use indexmap::IndexMap;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// Fields collected for one occurrence of a keyword.
pub type FieldGroup = Vec<String>;

/// Keywords understood by the route assembler.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Keyword {
    Handler,
    Method,
    Resource,
    Description,
    Route,
    Query,
    Body,
    Response,
    Example,
    /// Anything else; resolved through the [`KeywordRegistry`]
    Custom(String),
}

impl Keyword {
    pub const RESERVED: [&'static str; 9] = [
        "handler",
        "method",
        "resource",
        "description",
        "route",
        "query",
        "body",
        "response",
        "example",
    ];

    pub fn parse(name: &str) -> Self {
        match name {
            "handler" => Keyword::Handler,
            "method" => Keyword::Method,
            "resource" => Keyword::Resource,
            "description" => Keyword::Description,
            "route" => Keyword::Route,
            "query" => Keyword::Query,
            "body" => Keyword::Body,
            "response" => Keyword::Response,
            "example" => Keyword::Example,
            other => Keyword::Custom(other.to_string()),
        }
    }

    /// Singular keyword for the plural forms accepted in structured declarations.
    pub fn singular(name: &str) -> Option<&'static str> {
        match name {
            "routes" => Some("route"),
            "queries" => Some("query"),
            "examples" => Some("example"),
            _ => None,
        }
    }

    pub fn is_reserved(name: &str) -> bool {
        Self::RESERVED.contains(&name) || Self::singular(name).is_some()
    }

    pub fn as_str(&self) -> &str {
        match self {
            Keyword::Handler => "handler",
            Keyword::Method => "method",
            Keyword::Resource => "resource",
            Keyword::Description => "description",
            Keyword::Route => "route",
            Keyword::Query => "query",
            Keyword::Body => "body",
            Keyword::Response => "response",
            Keyword::Example => "example",
            Keyword::Custom(name) => name,
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of an extension keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeywordCategory {
    Trait,
    Security,
    Annotation,
}

impl fmt::Display for KeywordCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeywordCategory::Trait => "trait",
            KeywordCategory::Security => "security",
            KeywordCategory::Annotation => "annotation",
        };
        f.write_str(name)
    }
}

/// Extension keywords registered during configuration.
#[derive(Debug, Clone, Default)]
pub struct KeywordRegistry {
    entries: HashMap<String, KeywordCategory>,
    order: Vec<String>,
}

impl KeywordRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name` under `category`.
    ///
    /// Registering the same pair twice is a no-op. Reserved keywords cannot be registered
    /// and a name cannot move to another category.
    pub fn register(&mut self, name: &str, category: KeywordCategory) -> Result<()> {
        if Keyword::is_reserved(name) {
            return Err(Error::ReservedKeyword(name.to_string()));
        }
        match self.entries.get(name) {
            Some(existing) if *existing == category => Ok(()),
            Some(existing) => Err(Error::KeywordConflict {
                name: name.to_string(),
                existing: existing.to_string(),
                requested: category.to_string(),
            }),
            None => {
                debug!("Registering keyword @{} as {}", name, category);
                self.entries.insert(name.to_string(), category);
                self.order.push(name.to_string());
                Ok(())
            }
        }
    }

    pub fn category(&self, name: &str) -> Option<KeywordCategory> {
        self.entries.get(name).copied()
    }

    /// Registered names of one category, in registration order.
    pub fn names(&self, category: KeywordCategory) -> Vec<String> {
        self.order
            .iter()
            .filter(|name| self.entries.get(name.as_str()) == Some(&category))
            .cloned()
            .collect()
    }
}

/// Ordered multimap of keyword name to the field groups found for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags {
    entries: IndexMap<String, Vec<FieldGroup>>,
}

impl Tags {
    fn push(&mut self, keyword: &str, group: FieldGroup) {
        self.entries
            .entry(keyword.to_string())
            .or_default()
            .push(group);
    }

    /// Field groups of a keyword, empty when the keyword never appeared.
    pub fn groups(&self, keyword: &str) -> &[FieldGroup] {
        self.entries.get(keyword).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[FieldGroup])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn tag_start_re() -> &'static Regex {
    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    TAG_RE.get_or_init(|| {
        Regex::new(r"^(?://[/!]?|\*)?\s*@(\w+)(?:[ \t]+(.*))?$").expect("Invalid regex")
    })
}

fn continuation_re() -> &'static Regex {
    static BLOCK_RE: OnceLock<Regex> = OnceLock::new();
    BLOCK_RE.get_or_init(|| {
        Regex::new(r"^(?:(?://[/!]?|[ \t]?\*)(?:[ \t]+(.*))?|[ \t]+(.*))$").expect("Invalid regex")
    })
}

fn field_separator_re() -> &'static Regex {
    static SEP_RE: OnceLock<Regex> = OnceLock::new();
    SEP_RE.get_or_init(|| Regex::new(r"\t+").expect("Invalid regex"))
}

/// Whether any line of the block opens a tag
pub fn has_tags(block: &str) -> bool {
    block.lines().any(|line| tag_start_re().is_match(line.trim()))
}

/// Splits an annotation block into keyword field groups.
pub fn parse_annotation(block: &str) -> Tags {
    let mut tags = Tags::default();
    let mut current_keyword = Keyword::Description.as_str().to_string();
    let mut current_fields: FieldGroup = Vec::new();

    for line in block.lines() {
        // block comment delimiters carry no content
        if matches!(line.trim(), "/*" | "/**" | "*/") {
            continue;
        }
        if let Some(caps) = tag_start_re().captures(line.trim()) {
            tags.push(&current_keyword, std::mem::take(&mut current_fields));
            current_keyword = caps[1].to_string();
            if let Some(rest) = caps.get(2) {
                current_fields = field_separator_re()
                    .split(rest.as_str())
                    .map(str::trim)
                    .filter(|field| !field.is_empty())
                    .map(str::to_string)
                    .collect();
            }
        } else if let Some(caps) = continuation_re().captures(line) {
            let content = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
            current_fields.push(content.trim().to_string());
        }
    }
    tags.push(&current_keyword, current_fields);

    debug!("Parsed annotation into {} keywords", tags.len());
    tags
}
