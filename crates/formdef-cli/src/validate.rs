//! # Validate and Compile Subcommands
//!
//! `formdef validate` walks each data document with the validator and
//! prints every issue. `formdef compile` compiles the form once and checks
//! each document against the compiled schema. Both exit 1 when any
//! document has an error.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use formdef_core::FormRegistry;
use formdef_schema::SchemaCompiler;
use formdef_validate::validate_with;

use crate::{read_data, Session};

/// Arguments shared by `validate` and `compile`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Canonical form file describing the data.
    #[arg(long)]
    pub form: PathBuf,

    /// Data documents (JSON, or YAML by extension).
    #[arg(required = true)]
    pub data: Vec<PathBuf>,

    /// Print warnings as well as errors.
    #[arg(long)]
    pub warnings: bool,
}

/// Execute `formdef validate`.
pub fn run_validate(args: &ValidateArgs, session: &Session) -> Result<u8> {
    let form = session.load_form(&args.form)?;
    let options = session.config.validation_options();
    let mut failed = 0usize;

    for path in &args.data {
        let data = read_data(path)?;
        let issues = validate_with(&data, &form, session.registry(), &options);
        let errors = issues.iter().filter(|i| i.is_error()).count();
        for issue in issues.iter().filter(|i| args.warnings || i.is_error()) {
            println!("{}: {issue}", path.display());
        }
        if errors > 0 {
            failed += 1;
        }
        tracing::info!(path = %path.display(), issues = issues.len(), errors, "validated document");
    }

    Ok(summarize(args.data.len(), failed))
}

/// Execute `formdef compile`.
pub fn run_compile(args: &ValidateArgs, session: &Session) -> Result<u8> {
    let form = session.load_form(&args.form)?;
    let registry: Arc<dyn FormRegistry> = session.registry.clone();
    let compiler = SchemaCompiler::with_options(registry, session.config.compile_options());
    let schema = compiler
        .compile(&form)
        .with_context(|| format!("failed to compile form: {}", args.form.display()))?;
    tracing::info!(form = %schema.form_id(), nodes = schema.len(), "compiled schema");

    let mut failed = 0usize;
    for path in &args.data {
        let data = read_data(path)?;
        if let Err(issues) = schema.check(&data) {
            for issue in &issues {
                println!("{}: {issue}", path.display());
            }
            failed += 1;
        }
    }

    Ok(summarize(args.data.len(), failed))
}

fn summarize(total: usize, failed: usize) -> u8 {
    println!("{} of {total} document(s) valid", total - failed);
    u8::from(failed > 0)
}
