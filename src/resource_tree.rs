//! Folds flat routes into a tree of resources nested by path.
//!
//! Every distinct resource path becomes one [`ResourceNode`]. A node is attached under the
//! longest other known path that is a segment prefix of it, keyed by the remaining suffix:
//! `/books/{id}/reviews` goes under `/books/{id}` as `/reviews`, or under `/books` as
//! `/{id}/reviews` when `/books/{id}` has no route of its own. Nodes without such a prefix
//! are roots.

use crate::interpreter::example::Example;
use crate::interpreter::parameter::Parameter;
use crate::interpreter::Response;
use crate::route::{template_variables, HttpMethod, Route};
use indexmap::IndexMap;
use log::debug;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Operation of a resource for one HTTP method
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Method {
    #[serde(rename = "displayName", skip_serializing_if = "String::is_empty")]
    pub display_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,
    #[serde(rename = "queryParameters", skip_serializing_if = "IndexMap::is_empty")]
    pub query_parameters: IndexMap<String, Parameter>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub body: IndexMap<String, Parameter>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub responses: BTreeMap<u16, Response>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub examples: IndexMap<String, Example>,
    #[serde(rename = "is", skip_serializing_if = "Vec::is_empty")]
    pub traits: Vec<String>,
    #[serde(rename = "securedBy", skip_serializing_if = "Vec::is_empty")]
    pub securities: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<String>,
}

impl From<&Route> for Method {
    fn from(route: &Route) -> Self {
        Self {
            display_name: route.name.clone(),
            description: route.description.clone(),
            handler: route.handler.clone(),
            query_parameters: route.query_parameters.clone(),
            body: route.body_parameters.clone(),
            responses: route
                .response
                .iter()
                .map(|response| (response.status, response.clone()))
                .collect(),
            examples: route.examples.clone(),
            traits: route.traits.clone(),
            securities: route.securities.clone(),
            annotations: route.annotations.clone(),
        }
    }
}

/// A resource path with its methods and nested resources
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResourceNode {
    /// Absolute path of the resource
    #[serde(skip)]
    pub uri: String,
    /// Absolute path of the parent resource
    #[serde(skip)]
    pub parent: Option<String>,
    /// Parameters of the template variables in this node's own path suffix
    #[serde(rename = "uriParameters", skip_serializing_if = "IndexMap::is_empty")]
    pub uri_parameters: IndexMap<String, Parameter>,
    #[serde(flatten)]
    pub methods: BTreeMap<HttpMethod, Method>,
    /// Nested resources keyed by their path relative to this one
    #[serde(flatten)]
    pub children: BTreeMap<String, ResourceNode>,
}

impl ResourceNode {
    fn new(uri: &str) -> Self {
        Self {
            uri: uri.to_string(),
            ..Self::default()
        }
    }

    /// Keeps only the parameters whose variable appears in `path`
    fn retain_parameters_of(&mut self, path: &str) {
        let variables = template_variables(path);
        self.uri_parameters.retain(|name, _| variables.contains(name));
    }
}

fn segment_count(path: &str) -> usize {
    path.matches('/').count()
}

/// Longest known proper prefix of `path`, with the suffix left over
fn find_parent(path: &str, known: &HashSet<&str>) -> Option<(String, String)> {
    let segments: Vec<&str> = path.split('/').collect();
    (2..segments.len()).rev().find_map(|split| {
        let base = segments[..split].join("/");
        if base != path && known.contains(base.as_str()) {
            Some((base, format!("/{}", segments[split..].join("/"))))
        } else {
            None
        }
    })
}

/// Builds the resource tree of a set of routes.
///
/// # Returns
///
/// The root nodes, ordered by segment count and then by path.
pub fn build_tree<'a>(routes: impl IntoIterator<Item = &'a Route>) -> Vec<ResourceNode> {
    let mut nodes: BTreeMap<String, ResourceNode> = BTreeMap::new();
    for route in routes {
        let Some(method) = route.method else {
            continue;
        };
        let node = nodes
            .entry(route.resource.clone())
            .or_insert_with(|| ResourceNode::new(&route.resource));
        node.methods.insert(method, Method::from(route));
        for (name, parameter) in &route.uri_parameters {
            node.uri_parameters.insert(name.clone(), parameter.clone());
        }
    }

    let mut paths: Vec<String> = nodes.keys().cloned().collect();
    paths.sort_by(|a, b| segment_count(a).cmp(&segment_count(b)).then_with(|| a.cmp(b)));

    let parents: Vec<Option<(String, String)>> = {
        let known: HashSet<&str> = paths.iter().map(String::as_str).collect();
        paths.iter().map(|path| find_parent(path, &known)).collect()
    };

    // deepest first, so children are complete before they are moved
    for (path, parent) in paths.iter().zip(&parents).rev() {
        let Some((parent_path, suffix)) = parent else {
            continue;
        };
        let Some(mut node) = nodes.remove(path) else {
            continue;
        };
        node.retain_parameters_of(suffix);
        node.parent = Some(parent_path.clone());
        debug!("Nesting {} under {} as {}", path, parent_path, suffix);
        if let Some(parent_node) = nodes.get_mut(parent_path) {
            parent_node.children.insert(suffix.clone(), node);
        }
    }

    paths
        .iter()
        .filter_map(|path| nodes.remove(path))
        .map(|mut root| {
            let uri = root.uri.clone();
            root.retain_parameters_of(&uri);
            root
        })
        .collect()
}
