use crate::config::Config;
use crate::context::ContextBuilder;
use crate::documentation::{Document, Documentation, RouteDeclaration};
use crate::reader::{Handler, ProjectReader};
use crate::serializer::{serialize_json, serialize_yaml, write_to_file};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::path::PathBuf;

/// doc2api - Generate an API description from annotated handler doc comments
#[derive(Parser, Debug)]
#[command(name = "doc2api")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the Rust project directory
    #[arg(value_name = "PROJECT_PATH")]
    pub project_path: PathBuf,

    /// Configuration file (API info, keywords, primitives, aliases, route declarations)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_path: Option<PathBuf>,

    /// Output format (yaml or json)
    #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
}

/// Parse command line arguments
pub fn parse_args() -> Result<CliArgs> {
    let args = CliArgs::parse();
    parse_args_from_parsed(args)
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.project_path.exists() {
        anyhow::bail!(
            "Project path does not exist: {}",
            args.project_path.display()
        );
    }

    if !args.project_path.is_dir() {
        anyhow::bail!(
            "Project path is not a directory: {}",
            args.project_path.display()
        );
    }

    if let Some(ref config) = args.config_path {
        if !config.is_file() {
            anyhow::bail!("Configuration file does not exist: {}", config.display());
        }
    }

    info!("Project path: {}", args.project_path.display());
    info!("Output format: {:?}", args.output_format);
    if let Some(ref output) = args.output_path {
        info!("Output file: {}", output.display());
    } else {
        info!("Output: stdout");
    }

    Ok(args)
}

/// Route declarations of the project: configured routes joined to their handler's
/// annotation by name, then the annotated handlers no configured route refers to
fn route_declarations(config: &Config, handlers: &[Handler]) -> Vec<RouteDeclaration> {
    let mut declarations = Vec::new();
    let mut used: HashSet<&str> = HashSet::new();

    for route in &config.routes {
        let annotation = match &route.handler {
            Some(name) => match handlers.iter().find(|h| &h.name == name) {
                Some(handler) => {
                    used.insert(handler.name.as_str());
                    handler.annotation.as_str()
                }
                None => {
                    warn!("Handler {} not found, using its configuration only", name);
                    ""
                }
            },
            None => "",
        };
        declarations.push(route.to_declaration(annotation));
    }

    for handler in handlers {
        if used.contains(handler.name.as_str()) {
            continue;
        }
        let origin = format!("{} ({})", handler.name, handler.path.display());
        declarations.push(RouteDeclaration::new(origin, handler.annotation.clone()));
    }

    declarations
}

/// Reads the project and assembles its document
pub fn generate(args: &CliArgs) -> Result<Document> {
    let config = match &args.config_path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    // Step 1: Read handlers and type declarations
    info!("Reading project sources...");
    let reader = ProjectReader::new(args.project_path.clone());
    let source = reader.read()?;
    info!(
        "Found {} Rust files, {} annotated handlers",
        source.rust_files.len(),
        source.handlers.len()
    );

    // Step 2: Configure the context
    info!("Registering types and keywords...");
    let mut builder = ContextBuilder::new();
    let registered = builder.define_layouts(&source.layouts);
    debug!("Registered {} types from the sources", registered);
    config
        .configure(&mut builder)
        .context("Failed to apply configuration")?;
    let context = builder.finish();

    // Step 3: Add the routes
    info!("Assembling routes...");
    let mut documentation = Documentation::with_info(context, config.api_info());
    let mut skipped = 0;
    for declaration in route_declarations(&config, &source.handlers) {
        if let Err(e) = documentation.add_route(&declaration) {
            debug!("Route from {} not added: {}", declaration.origin, e);
            skipped += 1;
        }
    }

    let added = documentation.routes().count();
    if added == 0 {
        warn!("No routes found in the project");
    }

    // Step 4: Build the document
    let document = documentation.build();
    info!("Summary:");
    info!("  - Files parsed: {}", source.parsed_files);
    info!("  - Routes added: {}", added);
    info!("  - Routes skipped: {}", skipped);
    info!("  - Diagnostics: {}", documentation.diagnostics().len());
    info!("  - Types: {}", document.types.len());
    for name in &document.unresolved_types {
        warn!("Type {} is used but never defined", name);
    }

    Ok(document)
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    info!("Starting API document generation...");
    let document = generate(&args)?;

    info!("Serializing to {:?} format...", args.output_format);
    let content = match args.output_format {
        OutputFormat::Yaml => serialize_yaml(&document)?,
        OutputFormat::Json => serialize_json(&document)?,
    };

    if let Some(output_path) = &args.output_path {
        info!("Writing output to: {}", output_path.display());
        write_to_file(&content, output_path)?;
        info!("Successfully wrote document to {}", output_path.display());
    } else {
        println!("{}", content);
    }

    Ok(())
}
