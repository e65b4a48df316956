//! # formdef CLI entry point
//!
//! Parses command-line arguments, loads configuration and the form
//! registry, and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use formdef_cli::config::CliConfig;
use formdef_cli::generate::{run_codegen, run_json_schema, CodegenArgs, JsonSchemaArgs};
use formdef_cli::import::{run_import, ImportArgs};
use formdef_cli::merge::{run_merge, MergeArgs};
use formdef_cli::validate::{run_compile, run_validate, ValidateArgs};
use formdef_cli::Session;

/// Form definition toolchain.
///
/// Validates data against canonical form definitions, compiles them into
/// runtime schemas, JSON Schema and Rust types, and imports definitions
/// from schema catalogs and legacy documentation.
#[derive(Parser, Debug)]
#[command(name = "formdef", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file. Defaults to ./formdef.yaml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory of canonical form files used to resolve sub-form ids.
    #[arg(long, global = true)]
    forms_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate data documents against a form.
    Validate(ValidateArgs),

    /// Check data documents with the compiled schema of a form.
    Compile(ValidateArgs),

    /// Finalize a canonical form file.
    Merge(MergeArgs),

    /// Import forms from a schema catalog and legacy documentation.
    Import(ImportArgs),

    /// Print Rust type declarations for a form.
    Codegen(CodegenArgs),

    /// Print the JSON Schema export of a form.
    #[command(name = "json-schema")]
    JsonSchema(JsonSchemaArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<u8> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config = CliConfig::resolve(cli.config.as_deref(), &cwd)?;
    let session = Session::open(config, cli.forms_dir.as_deref())?;

    match cli.command {
        Commands::Validate(args) => run_validate(&args, &session),
        Commands::Compile(args) => run_compile(&args, &session),
        Commands::Merge(args) => run_merge(&args, &session),
        Commands::Import(args) => run_import(&args, &session),
        Commands::Codegen(args) => run_codegen(&args, &session),
        Commands::JsonSchema(args) => run_json_schema(&args, &session),
    }
}
