//! Parameter interpreter for `@route`, `@query` and `@body` tags.
//!
//! The grammar is `{type[:enum]} name[=default] [- ] description`, either on one line or
//! as tab-separated fields. Wrapping the name in brackets (`[page=1]`) marks the parameter
//! optional. Enum values are separated by `|` when they exclude each other and by `,` when
//! they can be combined.

use super::{split_braced_type, strip_dash};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::type_resolver::{TypeDescriptor, TypeKind};
use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;

/// Where a parameter is carried in the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterLocation {
    Uri,
    Query,
    Body,
}

impl ParameterLocation {
    pub fn keyword(&self) -> &'static str {
        match self {
            ParameterLocation::Uri => "route",
            ParameterLocation::Query => "query",
            ParameterLocation::Body => "body",
        }
    }
}

/// A typed route, query or body parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    #[serde(skip)]
    pub name: String,
    #[serde(rename = "type")]
    pub descriptor: TypeDescriptor,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
}

/// Name slot of the grammar: `name`, `name=default`, `[name]` or `[name=default]`
struct NameToken {
    name: String,
    default: Option<String>,
    optional: bool,
}

impl NameToken {
    fn parse(token: &str) -> Self {
        let (inner, optional) = match token.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
            Some(inner) => (inner, true),
            None => (token, false),
        };
        match inner.split_once('=') {
            Some((name, default)) => Self {
                name: name.trim().to_string(),
                default: Some(default.trim().to_string()),
                optional,
            },
            None => Self {
                name: inner.trim().to_string(),
                default: None,
                optional,
            },
        }
    }
}

/// Type expression and enum choices of the braced token
fn split_enum(type_token: &str) -> (&str, Option<&str>) {
    match type_token.split_once(':') {
        Some((expr, choices)) if !choices.trim().is_empty() => (expr.trim(), Some(choices.trim())),
        Some((expr, _)) => (expr.trim(), None),
        None => (type_token.trim(), None),
    }
}

/// Enum values and synthesized examples of an enum list.
///
/// Combinable values only produce the examples `a`, `b` and `a,b`; listing every
/// combination is left out on purpose.
fn enum_choices(choices: &str) -> (Vec<String>, Vec<String>) {
    let split = |separator: char| -> Vec<String> {
        choices.split(separator)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .collect()
    };

    if choices.contains('|') {
        (split('|'), Vec::new())
    } else if choices.contains(',') {
        let values = split(',');
        let examples = match values.as_slice() {
            [first, second, ..] => vec![first.clone(), second.clone(), format!("{},{}", first, second)],
            _ => Vec::new(),
        };
        (values, examples)
    } else {
        (vec![choices.to_string()], Vec::new())
    }
}

/// Converts a literal to the JSON value matching a resolved type
fn convert_value(value: &str, descriptor: &TypeDescriptor) -> Option<Value> {
    if descriptor.kind != TypeKind::Scalar {
        return Some(Value::String(value.to_string()));
    }
    match descriptor.name.as_str() {
        "integer" => value.parse::<i64>().ok().map(Value::from),
        "number" => value.parse::<f64>().ok().map(Value::from),
        "boolean" => value.parse::<bool>().ok().map(Value::from),
        _ => Some(Value::String(value.to_string())),
    }
}

/// Parses one parameter declaration.
///
/// # Arguments
///
/// * `context` - Resolves the type expression
/// * `fields` - Field group of the tag
/// * `location` - Body parameters may omit their name, which then defaults to the type
///
/// # Returns
///
/// The parameter and the type names it depends on.
pub fn parse_parameter(
    context: &mut Context,
    fields: &[String],
    location: ParameterLocation,
) -> Result<(Parameter, Vec<String>)> {
    let keyword = location.keyword();
    let fields: Vec<&str> = fields
        .iter()
        .map(|field| field.trim())
        .filter(|field| !field.is_empty())
        .collect();
    if fields.is_empty() {
        return Err(Error::MissingDefinition(keyword.to_string()));
    }

    let joined = fields.join(" ");
    let (type_token, name_token, description) = if fields.len() >= 3 && fields[0].starts_with('{') {
        // tab-separated form: {type} name description
        let (type_token, _) = split_braced_type(keyword, fields[0])?;
        (type_token, Some(fields[1].to_string()), fields[2..].join(" "))
    } else {
        let (type_token, rest) = split_braced_type(keyword, &joined)?;
        let (name_token, description) = split_name(rest, location);
        (type_token, name_token, description)
    };

    let (type_expr, choices) = split_enum(type_token);
    let resolved = context.resolve(type_expr)?;
    let descriptor = resolved.descriptor;

    let name = match name_token.as_deref().map(NameToken::parse) {
        Some(token) if !token.name.is_empty() => token,
        _ if location == ParameterLocation::Body => NameToken {
            name: type_expr.to_string(),
            default: None,
            optional: false,
        },
        _ => {
            return Err(Error::MalformedField {
                keyword: keyword.to_string(),
                message: format!("missing parameter name after {{{}}}", type_token),
            })
        }
    };

    let convert = |value: &str| {
        let converted = convert_value(value, &descriptor);
        if converted.is_none() {
            warn!(
                "Dropping value `{}` of {}: not a valid {}",
                value, name.name, descriptor.name
            );
        }
        converted
    };

    let (enum_values, examples) = match choices {
        Some(choices) => {
            let (values, examples) = enum_choices(choices);
            (values.iter().filter_map(|v| convert(v.as_str())).collect(), examples)
        }
        None => (Vec::new(), Vec::new()),
    };
    let default = name.default.as_deref().and_then(|v| convert(v));

    debug!("Parsed {} parameter {}: {}", keyword, name.name, descriptor.name);
    let parameter = Parameter {
        required: location == ParameterLocation::Uri || !name.optional,
        name: name.name.clone(),
        descriptor: descriptor.clone(),
        description: strip_dash(&description).to_string(),
        default,
        enum_values,
        examples,
    };
    Ok((parameter, resolved.dependents))
}

/// Splits what follows the type token into the name token and the description
fn split_name(rest: &str, location: ParameterLocation) -> (Option<String>, String) {
    let rest = rest.trim();
    if rest.is_empty() {
        return (None, String::new());
    }

    if location == ParameterLocation::Body {
        // a body only names itself in front of a dash
        return match rest.split_once(" - ") {
            Some((name, description)) if !name.trim().contains(char::is_whitespace) => {
                (Some(name.trim().to_string()), description.trim().to_string())
            }
            _ => (None, rest.to_string()),
        };
    }

    match rest.split_once(char::is_whitespace) {
        Some((name, description)) => (Some(name.to_string()), description.trim().to_string()),
        None => (Some(rest.to_string()), String::new()),
    }
}
