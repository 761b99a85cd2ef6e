//! doc2api - Command-line tool for generating API descriptions.
//!
//! This binary reads the annotated handlers of a Rust project and writes a resource-oriented
//! API document built from their doc comment tags.
//!
//! # Usage
//!
//! ```bash
//! doc2api [OPTIONS] <PROJECT_PATH>
//! ```
//!
//! # Examples
//!
//! Generate YAML documentation:
//! ```bash
//! doc2api ./my-api-project -o api.yaml
//! ```
//!
//! Generate JSON documentation with a configuration file:
//! ```bash
//! doc2api ./my-api-project -c doc2api.yaml -f json -o api.json
//! ```

use anyhow::Result;
use clap::Parser;
use doc2api::cli;
use log::info;

fn main() -> Result<()> {
    // Parse once for the verbose flag, validate after the logger is up
    let args_for_verbose = cli::CliArgs::parse();

    let log_level = if args_for_verbose.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("doc2api starting...");

    let args = cli::parse_args_from_parsed(args_for_verbose)?;
    cli::run(args)?;

    info!("API document generation completed successfully");

    Ok(())
}
