//! Configuration file support.
//!
//! The configuration is a YAML file describing the API, the extension keywords, the
//! primitive types and aliases to register, and structured route declarations:
//!
//! ```yaml
//! title: Book collection
//! version: v2
//! keywords:
//!   auth: security
//!   deprecated: trait
//! primitives:
//!   uuid: { type: string, pattern: "[a-f0-9-]+", length: 36 }
//! aliases:
//!   BookId: uuid
//! routes:
//!   - handler: create_book
//!     resource: POST /books
//!     auth: true
//! ```

use crate::context::ContextBuilder;
use crate::documentation::{ApiInfo, RouteDeclaration};
use crate::interpreter::FieldValue;
use crate::tags::KeywordCategory;
use crate::type_resolver::Facets;
use anyhow::{Context, Result};
use indexmap::IndexMap;
use log::{debug, info};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// A primitive type definition
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PrimitiveConfig {
    #[serde(rename = "type")]
    pub base: String,
    pub description: Option<String>,
    pub pattern: Option<String>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    /// Sets both length bounds
    pub length: Option<usize>,
    #[serde(rename = "enum")]
    pub enum_values: Option<Vec<String>>,
}

impl PrimitiveConfig {
    pub fn facets(&self) -> Facets {
        let facets = Facets {
            description: self.description.clone(),
            pattern: self.pattern.clone(),
            min_length: self.min_length,
            max_length: self.max_length,
            enum_values: self.enum_values.clone(),
        };
        match self.length {
            Some(length) => facets.with_length(length),
            None => facets,
        }
    }
}

/// A structured route declaration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RouteConfig {
    /// Handler whose doc comment completes the declaration
    #[serde(default)]
    pub handler: Option<String>,
    #[serde(flatten)]
    pub tags: IndexMap<String, FieldValue>,
}

impl RouteConfig {
    /// Turns the declaration into overrides applied before `annotation`
    pub fn to_declaration(&self, annotation: &str) -> RouteDeclaration {
        let origin = match &self.handler {
            Some(handler) => handler.clone(),
            None => "configuration".to_string(),
        };
        let mut declaration = RouteDeclaration::new(origin, annotation);
        if let Some(handler) = &self.handler {
            declaration = declaration.with_override("handler", FieldValue::from(handler.as_str()));
        }
        for (keyword, value) in &self.tags {
            declaration = declaration.with_override(keyword, value.clone());
        }
        declaration
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub title: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub base_uri: Option<String>,
    pub media_type: Option<String>,
    pub keywords: IndexMap<String, KeywordCategory>,
    pub primitives: IndexMap<String, PrimitiveConfig>,
    pub aliases: IndexMap<String, String>,
    pub routes: Vec<RouteConfig>,
}

impl Config {
    /// Loads a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Invalid configuration file: {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse configuration")
    }

    /// API information, with defaults for what is not configured
    pub fn api_info(&self) -> ApiInfo {
        let defaults = ApiInfo::default();
        ApiInfo {
            title: self.title.clone().unwrap_or(defaults.title),
            description: self.description.clone(),
            version: self.version.clone().unwrap_or(defaults.version),
            base_uri: self.base_uri.clone().unwrap_or(defaults.base_uri),
            media_type: self.media_type.clone().unwrap_or(defaults.media_type),
        }
    }

    /// Registers primitives, then aliases, then keywords
    pub fn configure(&self, builder: &mut ContextBuilder) -> Result<()> {
        for (name, primitive) in &self.primitives {
            builder
                .define_primitive(name, &primitive.base, primitive.facets())
                .with_context(|| format!("Failed to define primitive {}", name))?;
        }
        for (alias, target) in &self.aliases {
            builder
                .define_alias(alias, target)
                .with_context(|| format!("Failed to define alias {}", alias))?;
        }
        for (keyword, category) in &self.keywords {
            builder
                .register_keyword(keyword, *category)
                .with_context(|| format!("Failed to register keyword {}", keyword))?;
        }
        info!(
            "Configured {} primitives, {} aliases and {} keywords",
            self.primitives.len(),
            self.aliases.len(),
            self.keywords.len()
        );
        Ok(())
    }
}
