//! doc2api - API descriptions from annotated handler doc comments.
//!
//! Handlers document themselves with `@keyword` tags in their doc comments. The library
//! reads those tags, checks and resolves the type expressions they mention against the
//! structs and enums of the project, and assembles a hierarchical, resource-oriented API
//! document that serializes to YAML or JSON.
//!
//! # Annotation Format
//!
//! ```text
//! /// Fetch a book
//! ///
//! /// Returns the book with the given id.
//! /// @resource GET /books/{id}
//! /// @route {uint} id - The book id
//! /// @query {bool} [full=false] - Include the reviews
//! /// @response 200 {Book} The book
//! /// @auth
//! ```
//!
//! # Architecture
//!
//! 1. [`reader`] - Walks the project and collects annotated handlers and type layouts
//! 2. [`tags`] - Splits annotation blocks into keyword field groups
//! 3. [`type_resolver`] - Type expressions, definitions and dependents
//! 4. [`context`] - Keyword and type registries of one document
//! 5. [`interpreter`] - Field interpreters for descriptions, parameters, responses and examples
//! 6. [`route`] - One documented endpoint
//! 7. [`resource_tree`] - Routes grouped into nested resources
//! 8. [`documentation`] - Route collection and document assembly
//! 9. [`serializer`] - YAML and JSON output
//!
//! # Example Usage
//!
//! ```no_run
//! use doc2api::{
//!     context::ContextBuilder,
//!     documentation::{Documentation, RouteDeclaration},
//!     reader::ProjectReader,
//!     serializer::serialize_yaml,
//! };
//! use std::path::PathBuf;
//!
//! let source = ProjectReader::new(PathBuf::from("./my-project")).read().unwrap();
//!
//! let mut builder = ContextBuilder::new();
//! builder.define_layouts(&source.layouts);
//!
//! let mut documentation = Documentation::new(builder.finish());
//! for handler in &source.handlers {
//!     let declaration = RouteDeclaration::new(handler.name.clone(), handler.annotation.clone());
//!     if let Err(e) = documentation.add_route(&declaration) {
//!         eprintln!("{}: {}", handler.name, e);
//!     }
//! }
//!
//! let yaml = serialize_yaml(&documentation.build()).unwrap();
//! println!("{}", yaml);
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module which provides a complete CLI application.

pub mod cli;
pub mod config;
pub mod context;
pub mod documentation;
pub mod error;
pub mod interpreter;
pub mod reader;
pub mod resource_tree;
pub mod route;
pub mod serializer;
pub mod tags;
pub mod type_resolver;
