//! Serialization of built documents to YAML or JSON.
//!
//! This module renders a [`Document`] into text and writes it to files. Resources appear
//! at the top level under their paths, methods under lower-case verbs and nested resources
//! under their relative paths.

use crate::documentation::Document;
use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::Path;

/// Serializes a document to YAML.
///
/// # Errors
///
/// Returns an error if serialization fails.
///
/// # Example
///
/// ```
/// use doc2api::context::Context;
/// use doc2api::documentation::Documentation;
/// use doc2api::serializer::serialize_yaml;
///
/// let documentation = Documentation::new(Context::default());
/// let yaml = serialize_yaml(&documentation.build()).unwrap();
/// assert!(yaml.contains("title: Your API"));
/// ```
pub fn serialize_yaml(doc: &Document) -> Result<String> {
    debug!("Serializing document to YAML");
    serde_yaml::to_string(doc).context("Failed to serialize document to YAML")
}

/// Serializes a document to JSON with pretty printing.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_json(doc: &Document) -> Result<String> {
    debug!("Serializing document to JSON");
    serde_json::to_string_pretty(doc).context("Failed to serialize document to JSON")
}

/// Writes string content to a file.
///
/// Creates the file and its parent directories if they don't exist, or overwrites the
/// file if it does.
///
/// # Arguments
///
/// * `content` - The string content to write
/// * `path` - The file path to write to
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}
