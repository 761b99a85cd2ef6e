//! Route collection and document assembly.
//!
//! A [`Documentation`] owns the [`Context`] of one document. Routes are added from their
//! annotation blocks, possibly completed by structured overrides; per-tag problems are kept
//! as [`Diagnostic`]s instead of failing the route. [`Documentation::build`] then nests the
//! accepted routes into resources and gathers every type they depend on.

use crate::context::Context;
use crate::error::{Error, Result};
use crate::interpreter::FieldValue;
use crate::resource_tree::{build_tree, ResourceNode};
use crate::route::Route;
use crate::tags::{parse_annotation, KeywordCategory};
use crate::type_resolver::TypeDefinition;
use indexmap::{IndexMap, IndexSet};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// General information about the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiInfo {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub version: String,
    #[serde(rename = "baseUri")]
    pub base_uri: String,
    #[serde(rename = "mediaType")]
    pub media_type: String,
}

impl Default for ApiInfo {
    fn default() -> Self {
        Self {
            title: "Your API".to_string(),
            description: None,
            version: "v1".to_string(),
            base_uri: "http://localhost/{version}".to_string(),
            media_type: "application/json".to_string(),
        }
    }
}

/// Where a route comes from: its annotation block plus structured values applied first
#[derive(Debug, Clone, Default)]
pub struct RouteDeclaration {
    /// Handler name or file location, used in diagnostics
    pub origin: String,
    pub annotation: String,
    pub overrides: Vec<(String, FieldValue)>,
}

impl RouteDeclaration {
    pub fn new(origin: impl Into<String>, annotation: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            annotation: annotation.into(),
            overrides: Vec::new(),
        }
    }

    pub fn with_override(mut self, keyword: &str, value: FieldValue) -> Self {
        self.overrides.push((keyword.to_string(), value));
        self
    }
}

/// A non-fatal problem found while adding a route
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub origin: String,
    pub message: String,
}

/// The normalized document, ready to be serialized
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    #[serde(flatten)]
    pub info: ApiInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub traits: Vec<String>,
    #[serde(rename = "securitySchemes", skip_serializing_if = "Vec::is_empty")]
    pub security_schemes: Vec<String>,
    #[serde(rename = "annotationTypes", skip_serializing_if = "Vec::is_empty")]
    pub annotation_types: Vec<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub types: IndexMap<String, TypeDefinition>,
    /// Root resources keyed by their path
    #[serde(flatten)]
    pub resources: IndexMap<String, ResourceNode>,
    /// Dependent type names without a registered definition
    #[serde(skip)]
    pub unresolved_types: Vec<String>,
}

/// Routes and types collected for one document
#[derive(Debug)]
pub struct Documentation {
    info: ApiInfo,
    context: Context,
    routes: IndexMap<String, Route>,
    types: IndexSet<String>,
    diagnostics: Vec<Diagnostic>,
}

impl Documentation {
    pub fn new(context: Context) -> Self {
        Self::with_info(context, ApiInfo::default())
    }

    pub fn with_info(context: Context, info: ApiInfo) -> Self {
        Self {
            info,
            context,
            routes: IndexMap::new(),
            types: IndexSet::new(),
            diagnostics: Vec::new(),
        }
    }

    fn report(&mut self, origin: &str, message: String) {
        warn!("{}: {}", origin, message);
        self.diagnostics.push(Diagnostic {
            origin: origin.to_string(),
            message,
        });
    }

    /// Adds the route described by `declaration`.
    ///
    /// Overrides are applied before the annotation tags. Tags that fail are reported as
    /// diagnostics and left out. A route without method or resource is not added and its
    /// viability error is returned. A route with the same method and resource as an earlier
    /// one replaces it.
    pub fn add_route(&mut self, declaration: &RouteDeclaration) -> Result<()> {
        let origin = declaration.origin.as_str();
        let mut route = Route::new();

        for (keyword, value) in &declaration.overrides {
            if let Err(e) = route.add_tag(&mut self.context, keyword, value.clone()) {
                self.report(origin, format!("@{}: {}", keyword, e));
            }
        }

        let tags = parse_annotation(&declaration.annotation);
        for e in route.apply_tags(&mut self.context, &tags) {
            self.report(origin, e.to_string());
        }

        if let Err(e) = route.check_viability() {
            self.report(origin, format!("route ignored: {}", e));
            return Err(e);
        }

        for issue in route.uri_coherence() {
            self.report(origin, issue);
        }

        let dependents = std::mem::take(&mut route.dependents);
        self.register_types(dependents);

        let signature = route.signature();
        debug!("Adding route {} from {}", signature, origin);
        if self.routes.insert(signature.clone(), route).is_some() {
            self.report(origin, format!("{} replaces an earlier declaration", signature));
        }
        Ok(())
    }

    /// Adds the dependent type names, then the names their definitions refer to
    fn register_types(&mut self, names: Vec<String>) {
        let mut pending: VecDeque<String> = names.into();
        while let Some(name) = pending.pop_front() {
            if !self.types.insert(name.clone()) {
                continue;
            }
            pending.extend(self.context.dependents_of(&name));
        }
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.values()
    }

    /// Route registered under `METHOD /resource`
    pub fn route(&self, signature: &str) -> Option<&Route> {
        self.routes.get(signature)
    }

    /// Type names registered so far, in discovery order
    pub fn types(&self) -> &IndexSet<String> {
        &self.types
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Assembles the document from the routes added so far
    pub fn build(&self) -> Document {
        let mut types = IndexMap::new();
        let mut unresolved_types = Vec::new();
        for name in &self.types {
            match self.context.definition(name) {
                Some(definition) => {
                    types
                        .entry(definition.name().to_string())
                        .or_insert_with(|| definition.clone());
                }
                None => {
                    warn!("No definition found for type {}", name);
                    unresolved_types.push(name.clone());
                }
            }
        }

        let resources: IndexMap<String, ResourceNode> = build_tree(self.routes.values())
            .into_iter()
            .map(|node| (node.uri.clone(), node))
            .collect();

        let keywords = self.context.keywords();
        info!(
            "Document built with {} routes, {} root resources and {} types",
            self.routes.len(),
            resources.len(),
            types.len()
        );
        Document {
            info: self.info.clone(),
            traits: keywords.names(KeywordCategory::Trait),
            security_schemes: keywords.names(KeywordCategory::Security),
            annotation_types: keywords.names(KeywordCategory::Annotation),
            types,
            resources,
            unresolved_types,
        }
    }
}

impl Document {
    /// Fails when a dependent type has no definition
    pub fn ensure_resolved(&self) -> Result<()> {
        match self.unresolved_types.first() {
            Some(name) => Err(Error::MissingDefinition(name.clone())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextBuilder;
    use crate::type_resolver::StructLayout;
    use pretty_assertions::assert_eq;

    fn bookshop_context() -> Context {
        let mut builder = ContextBuilder::new();
        builder
            .define_types_from_source(
                r#"
                pub struct Book {
                    pub id: u32,
                    pub author: Author,
                    pub related: Vec<Book>,
                    pub labels: HashMap<String, Label>,
                }
                pub struct Author { pub name: String, pub books: Vec<Book> }
                pub struct Label { pub text: String }
            "#,
            )
            .unwrap();
        builder
            .register_keyword("auth", KeywordCategory::Security)
            .unwrap();
        builder.finish()
    }

    #[test]
    fn test_dependents_are_registered_recursively() {
        let mut documentation = Documentation::new(bookshop_context());
        documentation
            .add_route(&RouteDeclaration::new(
                "get_book",
                "/// @resource GET /books/{id}\n/// @route {uint} id\n/// @response {Book}",
            ))
            .unwrap();

        let types: Vec<&str> = documentation.types().iter().map(String::as_str).collect();
        assert_eq!(types, vec!["Book", "Author", "map_string_Label", "Label"]);

        let document = documentation.build();
        assert!(document.unresolved_types.is_empty());
        assert!(document.ensure_resolved().is_ok());
        let names: Vec<&String> = document.types.keys().collect();
        assert_eq!(names, vec!["Book", "Author", "map_string_Label", "Label"]);
    }

    #[test]
    fn test_route_identity_last_write_wins() {
        let mut documentation = Documentation::new(Context::default());
        documentation
            .add_route(&RouteDeclaration::new(
                "first",
                "/// @resource GET /x\n/// @query {int} page\n/// @query {int} size",
            ))
            .unwrap();
        documentation
            .add_route(&RouteDeclaration::new(
                "second",
                "/// @resource GET /x\n/// @query {string} sort",
            ))
            .unwrap();

        assert_eq!(documentation.routes().count(), 1);
        let route = documentation.route("GET /x").unwrap();
        let names: Vec<&String> = route.query_parameters.keys().collect();
        assert_eq!(names, vec!["sort"]);
        assert!(documentation
            .diagnostics()
            .iter()
            .any(|d| d.origin == "second" && d.message.contains("replaces")));
    }

    #[test]
    fn test_non_viable_route_is_not_added() {
        let mut documentation = Documentation::new(Context::default());
        let result = documentation.add_route(&RouteDeclaration::new(
            "orphan",
            "/// @resource /books\n/// @response {Book}",
        ));

        assert!(matches!(result, Err(Error::MissingMethod)));
        assert_eq!(documentation.routes().count(), 0);
        assert!(documentation.types().is_empty());
    }

    #[test]
    fn test_overrides_apply_before_tags() {
        let mut documentation = Documentation::new(bookshop_context());
        let declaration = RouteDeclaration::new("create_book", "/// @body {Book}\n/// @method PUT")
            .with_override("resource", FieldValue::from("POST /books"))
            .with_override("auth", FieldValue::Flag(true));
        documentation.add_route(&declaration).unwrap();

        let route = documentation.route("PUT /books").unwrap();
        assert_eq!(route.securities, vec!["auth"]);
        assert!(route.body_parameters.contains_key("Book"));
    }

    #[test]
    fn test_bad_tags_become_diagnostics() {
        let mut documentation = Documentation::new(Context::default());
        documentation
            .add_route(&RouteDeclaration::new(
                "list",
                "/// @resource GET /books/{id}\n/// @query {map[int} broken\n/// @unknown",
            ))
            .unwrap();

        let messages: Vec<&str> = documentation
            .diagnostics()
            .iter()
            .map(|d| d.message.as_str())
            .collect();
        assert_eq!(messages.len(), 3);
        assert!(messages[0].contains("malformed map"));
        assert!(messages[1].contains("unknown keyword"));
        assert!(messages[2].contains("{id}"));
    }

    #[test]
    fn test_build_document() {
        let mut builder = ContextBuilder::new();
        builder
            .define_type(
                "Book",
                &StructLayout {
                    name: "BookRow".into(),
                    fields: Vec::new(),
                },
            )
            .unwrap()
            .register_keyword("auth", KeywordCategory::Security)
            .unwrap();
        let mut documentation = Documentation::new(builder.finish());
        for annotation in [
            "/// @resource GET /books\n/// @response {[]BookRow}",
            "/// @resource GET /books/{id}\n/// @route {uint} id\n/// @response {Book}",
            "/// @resource GET /authors\n/// @response {[]Author}",
        ] {
            documentation
                .add_route(&RouteDeclaration::new("test", annotation))
                .unwrap();
        }

        let document = documentation.build();
        let roots: Vec<&String> = document.resources.keys().collect();
        assert_eq!(roots, vec!["/authors", "/books"]);
        assert_eq!(document.security_schemes, vec!["auth"]);
        assert_eq!(document.types.len(), 1);
        assert_eq!(document.unresolved_types, vec!["Author"]);
        assert!(matches!(
            document.ensure_resolved(),
            Err(Error::MissingDefinition(name)) if name == "Author"
        ));
    }
}
