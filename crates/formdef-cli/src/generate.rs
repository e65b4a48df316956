//! # Codegen and JSON Schema Subcommands

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use formdef_schema::{build_validator, generate_rust_types, to_json_schema};

use crate::{read_data, Session};

#[derive(Args, Debug)]
pub struct CodegenArgs {
    /// Canonical form file to generate types for.
    #[arg(long)]
    pub form: PathBuf,

    /// Write to this file instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct JsonSchemaArgs {
    /// Canonical form file to export.
    #[arg(long)]
    pub form: PathBuf,

    /// Write to this file instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Validate these documents against the exported schema.
    #[arg(long = "check", value_name = "DATA")]
    pub check: Vec<PathBuf>,
}

/// Execute `formdef codegen`.
pub fn run_codegen(args: &CodegenArgs, session: &Session) -> Result<u8> {
    let form = session.load_form(&args.form)?;
    let source = generate_rust_types(&form, session.registry());
    emit(args.out.as_ref(), &source)?;
    Ok(0)
}

/// Execute `formdef json-schema`.
pub fn run_json_schema(args: &JsonSchemaArgs, session: &Session) -> Result<u8> {
    let form = session.load_form(&args.form)?;
    let schema = to_json_schema(&form, session.registry());
    let mut text = serde_json::to_string_pretty(&schema).context("failed to serialize schema")?;
    text.push('\n');
    emit(args.out.as_ref(), &text)?;

    if args.check.is_empty() {
        return Ok(0);
    }
    let validator = build_validator(&form, session.registry())
        .with_context(|| format!("failed to build validator: {}", args.form.display()))?;
    let mut failed = false;
    for path in &args.check {
        let data = read_data(path)?;
        for error in validator.iter_errors(&data) {
            eprintln!("{}: {}: {error}", path.display(), error.instance_path);
            failed = true;
        }
    }
    Ok(u8::from(failed))
}

fn emit(out: Option<&PathBuf>, text: &str) -> Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, text)
                .with_context(|| format!("failed to write output: {}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote output");
        }
        None => print!("{text}"),
    }
    Ok(())
}
