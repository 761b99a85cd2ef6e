use crate::context::Context;
use crate::error::{Error, Result};
use crate::interpreter::example::{parse_example, Example};
use crate::interpreter::parameter::{parse_parameter, Parameter, ParameterLocation};
use crate::interpreter::{
    parse_description, parse_method, parse_resource, parse_response, FieldValue, Response,
};
use crate::tags::{Keyword, KeywordCategory, Tags};
use indexmap::IndexMap;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// HTTP methods a route can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Patch,
    Options,
}

impl HttpMethod {
    /// Parses a method name, ignoring case
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "HEAD" => Ok(HttpMethod::Head),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            "PATCH" => Ok(HttpMethod::Patch),
            "OPTIONS" => Ok(HttpMethod::Options),
            _ => Err(Error::UnknownMethod(name.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Template variables of a resource path, e.g. `id` for `/books/{id}`
pub fn template_variables(path: &str) -> Vec<String> {
    static VARIABLE_RE: OnceLock<Regex> = OnceLock::new();
    let variable_re = VARIABLE_RE.get_or_init(|| Regex::new(r"\{([^}]+)\}").expect("Invalid regex"));
    variable_re
        .captures_iter(path)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Everything declared about one route.
///
/// A route is identified by its method and resource path; see [`Route::signature`].
#[derive(Debug, Clone, Default)]
pub struct Route {
    /// Display name, taken from the description title
    pub name: String,
    pub method: Option<HttpMethod>,
    pub resource: String,
    pub description: String,
    /// Name of the handler function the route was declared on
    pub handler: Option<String>,
    pub uri_parameters: IndexMap<String, Parameter>,
    pub query_parameters: IndexMap<String, Parameter>,
    pub body_parameters: IndexMap<String, Parameter>,
    pub response: Option<Response>,
    /// Examples keyed `Example1`, `Example2`, ...
    pub examples: IndexMap<String, Example>,
    pub traits: Vec<String>,
    pub securities: Vec<String>,
    pub annotations: Vec<String>,
    /// Type names to register once the route is accepted
    pub dependents: Vec<String>,
}

impl Route {
    pub fn new() -> Self {
        Self::default()
    }

    /// `METHOD /resource`
    pub fn signature(&self) -> String {
        let method = self.method.map_or("", |m| m.as_str());
        format!("{} {}", method, self.resource)
    }

    /// Applies the value of one keyword to the route.
    ///
    /// Plural keywords (`routes`, `queries`, `examples`) are applied as their singular form,
    /// and grouped values once per group. When a group fails the remaining ones are still
    /// applied and the first error is returned.
    pub fn add_tag(&mut self, context: &mut Context, keyword: &str, value: FieldValue) -> Result<()> {
        let keyword = Keyword::singular(keyword).unwrap_or(keyword);

        if let FieldValue::Groups(groups) = value {
            let mut first_error = None;
            for group in groups {
                if let Err(e) = self.add_tag(context, keyword, FieldValue::Fields(group)) {
                    first_error.get_or_insert(e);
                }
            }
            return first_error.map_or(Ok(()), Err);
        }

        match Keyword::parse(keyword) {
            Keyword::Handler => {
                self.handler = Some(value.into_text(keyword)?);
            }
            Keyword::Method => {
                self.method = Some(parse_method(&value.into_joined_text(keyword)?)?);
            }
            Keyword::Resource => {
                let (method, path) = parse_resource(&value.into_joined_text(keyword)?)?;
                if method.is_some() {
                    self.method = method;
                }
                self.resource = path;
            }
            Keyword::Description => {
                let (description, title) = parse_description(&value.into_fields(keyword)?);
                if let Some(title) = title {
                    self.name = title;
                }
                if !description.is_empty() {
                    self.description = description;
                }
            }
            Keyword::Route => {
                let parameter = self.parameter(context, value, ParameterLocation::Uri)?;
                self.uri_parameters.insert(parameter.name.clone(), parameter);
            }
            Keyword::Query => {
                let parameter = self.parameter(context, value, ParameterLocation::Query)?;
                self.query_parameters.insert(parameter.name.clone(), parameter);
            }
            Keyword::Body => {
                let parameter = self.parameter(context, value, ParameterLocation::Body)?;
                self.body_parameters.insert(parameter.name.clone(), parameter);
            }
            Keyword::Response => {
                let (response, dependents) = parse_response(context, &value.into_fields(keyword)?)?;
                self.dependents.extend(dependents);
                self.response = Some(response);
            }
            Keyword::Example => {
                let example = parse_example(&value.into_fields(keyword)?)?;
                let name = format!("Example{}", self.examples.len() + 1);
                self.examples.insert(name, example);
            }
            Keyword::Custom(name) => self.add_extension(context, name, value)?,
        }
        Ok(())
    }

    fn parameter(
        &mut self,
        context: &mut Context,
        value: FieldValue,
        location: ParameterLocation,
    ) -> Result<Parameter> {
        let fields = value.into_fields(location.keyword())?;
        let (parameter, dependents) = parse_parameter(context, &fields, location)?;
        self.dependents.extend(dependents);
        Ok(parameter)
    }

    /// Records a registered trait, security or annotation keyword
    fn add_extension(&mut self, context: &Context, name: String, value: FieldValue) -> Result<()> {
        let category = context
            .keywords()
            .category(&name)
            .ok_or_else(|| Error::UnknownKeyword(name.clone()))?;
        if value == FieldValue::Flag(false) {
            return Ok(());
        }

        let names = match category {
            KeywordCategory::Trait => &mut self.traits,
            KeywordCategory::Security => &mut self.securities,
            KeywordCategory::Annotation => &mut self.annotations,
        };
        if !names.contains(&name) {
            debug!("Route {} uses {} {}", self.resource, category, name);
            names.push(name);
        }
        Ok(())
    }

    /// Applies every tag of a parsed annotation block.
    ///
    /// # Returns
    ///
    /// The errors of the tags that could not be applied. Those tags are left out of the route.
    pub fn apply_tags(&mut self, context: &mut Context, tags: &Tags) -> Vec<Error> {
        let mut errors = Vec::new();
        for (keyword, groups) in tags.iter() {
            for group in groups {
                let is_blank = group.iter().all(|line| line.trim().is_empty());
                if keyword == Keyword::Description.as_str() && is_blank {
                    continue;
                }
                if let Err(e) = self.add_tag(context, keyword, FieldValue::Fields(group.clone())) {
                    errors.push(e);
                }
            }
        }
        errors
    }

    /// Fails when the method or the resource is missing
    pub fn check_viability(&self) -> Result<()> {
        if self.method.is_none() {
            return Err(Error::MissingMethod);
        }
        if self.resource.is_empty() {
            return Err(Error::MissingResource);
        }
        Ok(())
    }

    /// Mismatches between the resource template and the declared route parameters
    pub fn uri_coherence(&self) -> Vec<String> {
        let variables = template_variables(&self.resource);
        let mut issues = Vec::new();
        for variable in &variables {
            if !self.uri_parameters.contains_key(variable) {
                issues.push(format!(
                    "{}: `{{{}}}` has no route parameter declaration",
                    self.signature(),
                    variable
                ));
            }
        }
        for name in self.uri_parameters.keys() {
            if !variables.contains(name) {
                issues.push(format!(
                    "{}: route parameter `{}` does not appear in the resource",
                    self.signature(),
                    name
                ));
            }
        }
        issues
    }
}
