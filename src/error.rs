/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the library
#[derive(Debug)]
pub enum Error {
    /// Rust source that `syn` rejects
    ParseError(String),
    /// A `@method` value that is not an HTTP verb
    UnknownMethod(String),
    EmptyResource,
    InvalidResource(String),
    /// A tag that is neither reserved nor registered
    UnknownKeyword(String),
    ReservedKeyword(String),
    KeywordConflict { name: String, existing: String, requested: String },
    WrongValueKind { keyword: String, expected: &'static str },
    MissingDefinition(String),
    MalformedField { keyword: String, message: String },
    InvalidStatusCode(String),
    AliasCycle(String),
    UnknownAliasTarget { alias: String, target: String },
    MalformedMap(String),
    TypeAlreadyDefined(String),
    MissingMethod,
    MissingResource,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::ParseError(message) => write!(f, "parse error: {}", message),
            Error::UnknownMethod(method) => write!(f, "unknown method `{}`", method),
            Error::EmptyResource => write!(f, "empty resource"),
            Error::InvalidResource(resource) => write!(
                f,
                "resource `{}` should be relative and start with a /",
                resource
            ),
            Error::UnknownKeyword(keyword) => write!(f, "unknown keyword `{}`", keyword),
            Error::ReservedKeyword(keyword) => {
                write!(f, "keyword `{}` is reserved and cannot be registered", keyword)
            }
            Error::KeywordConflict {
                name,
                existing,
                requested,
            } => write!(
                f,
                "keyword `{}` is already registered as {}, cannot register it as {}",
                name, existing, requested
            ),
            Error::WrongValueKind { keyword, expected } => write!(
                f,
                "wrong kind of value for the keyword `{}`: {} expected",
                keyword, expected
            ),
            Error::MissingDefinition(keyword) => {
                write!(f, "missing definition for `{}`", keyword)
            }
            Error::MalformedField { keyword, message } => {
                write!(f, "malformed `{}`: {}", keyword, message)
            }
            Error::InvalidStatusCode(code) => {
                write!(f, "invalid http code `{}` in example response", code)
            }
            Error::AliasCycle(name) => write!(f, "alias cycle for type `{}`", name),
            Error::UnknownAliasTarget { alias, target } => write!(
                f,
                "can't define alias `{}`: type `{}` doesn't exist",
                alias, target
            ),
            Error::MalformedMap(expr) => write!(f, "malformed map type `{}`", expr),
            Error::TypeAlreadyDefined(name) => write!(f, "type `{}` is already defined", name),
            Error::MissingMethod => write!(f, "no method found"),
            Error::MissingResource => write!(f, "no resource found"),
        }
    }
}

impl std::error::Error for Error {}

impl From<syn::Error> for Error {
    fn from(err: syn::Error) -> Self {
        Error::ParseError(err.to_string())
    }
}
