use crate::tags::has_tags;
use crate::type_resolver::{collect_layouts, TypeLayout};
use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use syn::visit::Visit;
use walkdir::WalkDir;

/// Reads the annotated handlers and the type declarations of a Rust project.
///
/// The reader recursively walks the project directory for `.rs` files, skipping `target`
/// and hidden directories. Files that cannot be parsed are reported and skipped.
///
/// # Example
///
/// ```no_run
/// use doc2api::reader::ProjectReader;
/// use std::path::PathBuf;
///
/// let reader = ProjectReader::new(PathBuf::from("./my-project"));
/// let source = reader.read().unwrap();
/// println!("Found {} annotated handlers", source.handlers.len());
/// ```
pub struct ProjectReader {
    root_path: PathBuf,
}

/// A function whose doc comment carries at least one tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handler {
    /// Function name, used to join structured declarations
    pub name: String,
    /// File the function is declared in
    pub path: PathBuf,
    /// Doc comment rebuilt as `//` lines
    pub annotation: String,
}

/// Everything read from a project
#[derive(Debug, Default)]
pub struct ProjectSource {
    /// Every `.rs` file found
    pub rust_files: Vec<PathBuf>,
    /// Files that were parsed successfully
    pub parsed_files: usize,
    pub handlers: Vec<Handler>,
    pub layouts: Vec<TypeLayout>,
    /// Issues encountered while reading (inaccessible paths, syntax errors)
    pub warnings: Vec<String>,
}

impl ProjectReader {
    pub fn new(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    /// Collects all `.rs` files below the root directory
    pub fn scan(&self) -> (Vec<PathBuf>, Vec<String>) {
        let mut rust_files = Vec::new();
        let mut warnings = Vec::new();

        for entry in WalkDir::new(&self.root_path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                if e.path() == self.root_path {
                    return true;
                }
                let file_name = e.file_name().to_string_lossy();
                !file_name.starts_with('.') && file_name != "target"
            })
        {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("rs") {
                        rust_files.push(path.to_path_buf());
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        (rust_files, warnings)
    }

    /// Scans the project and reads handlers and type layouts from every parsable file
    pub fn read(&self) -> Result<ProjectSource> {
        if !self.root_path.is_dir() {
            anyhow::bail!("Not a directory: {}", self.root_path.display());
        }

        let (rust_files, warnings) = self.scan();
        let mut source = ProjectSource {
            warnings,
            ..ProjectSource::default()
        };

        for path in &rust_files {
            match parse_file(path) {
                Ok(syntax_tree) => {
                    source.parsed_files += 1;
                    source.handlers.extend(annotated_handlers(&syntax_tree, path));
                    source.layouts.extend(collect_layouts(&syntax_tree));
                }
                Err(e) => {
                    let warning = format!("Skipping {}: {:#}", path.display(), e);
                    warn!("{}", warning);
                    source.warnings.push(warning);
                }
            }
        }

        debug!(
            "Read {} handlers and {} type layouts from {} files",
            source.handlers.len(),
            source.layouts.len(),
            source.parsed_files
        );
        source.rust_files = rust_files;
        Ok(source)
    }
}

/// Parses a single Rust source file
pub fn parse_file(path: &Path) -> Result<syn::File> {
    debug!("Parsing file: {}", path.display());
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    syn::parse_file(&content)
        .with_context(|| format!("Failed to parse Rust syntax in file: {}", path.display()))
}

/// Functions and methods of a file whose doc comments carry tags
pub fn annotated_handlers(file: &syn::File, path: &Path) -> Vec<Handler> {
    let mut visitor = HandlerVisitor {
        path,
        handlers: Vec::new(),
    };
    visitor.visit_file(file);
    visitor.handlers
}

/// Rebuilds the doc comment of an item as `//` comment lines
pub fn doc_block(attrs: &[syn::Attribute]) -> String {
    let mut lines = Vec::new();
    for attr in attrs {
        if !attr.path().is_ident("doc") {
            continue;
        }
        if let syn::Meta::NameValue(meta) = &attr.meta {
            if let syn::Expr::Lit(syn::ExprLit {
                lit: syn::Lit::Str(text),
                ..
            }) = &meta.value
            {
                let value = text.value();
                // block doc comments keep their leading `*` on every line
                let is_block = value.contains('\n');
                // `split` keeps the empty value of a blank `///` line
                for line in value.split('\n') {
                    let line = match line.trim_start().strip_prefix('*') {
                        Some(rest) if is_block => rest,
                        _ => line,
                    };
                    lines.push(format!("//{}", line));
                }
            }
        }
    }
    lines.join("\n")
}

struct HandlerVisitor<'p> {
    path: &'p Path,
    handlers: Vec<Handler>,
}

impl HandlerVisitor<'_> {
    fn record(&mut self, ident: &syn::Ident, attrs: &[syn::Attribute]) {
        let annotation = doc_block(attrs);
        if !has_tags(&annotation) {
            return;
        }
        debug!("Found annotated handler {} in {}", ident, self.path.display());
        self.handlers.push(Handler {
            name: ident.to_string(),
            path: self.path.to_path_buf(),
            annotation,
        });
    }
}

impl<'ast> Visit<'ast> for HandlerVisitor<'_> {
    fn visit_item_fn(&mut self, node: &'ast syn::ItemFn) {
        self.record(&node.sig.ident, &node.attrs);
        syn::visit::visit_item_fn(self, node);
    }

    fn visit_impl_item_fn(&mut self, node: &'ast syn::ImplItemFn) {
        self.record(&node.sig.ident, &node.attrs);
        syn::visit::visit_impl_item_fn(self, node);
    }
}
