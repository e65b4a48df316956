//! # Import Subcommand
//!
//! Runs the import pipeline over a schema catalog and optional legacy
//! documentation, using the canonical files already in `--out` as the
//! hand-authored side. By default the staged files are written back with
//! fresh `generated*` keys; `--finalize` writes canonical forms instead.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use formdef_import::{file_name_for, CanonicalFormFile, ImportPipeline, ImportReport, SchemaCatalog};

use crate::Session;

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Interchange schema catalog (JSON).
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Legacy documentation files. Repeatable.
    #[arg(long)]
    pub legacy: Vec<PathBuf>,

    /// Directory of canonical form files to read and write.
    #[arg(long)]
    pub out: PathBuf,

    /// Write finalized forms instead of staged files.
    #[arg(long)]
    pub finalize: bool,

    /// Print the import report as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Execute `formdef import`.
pub fn run_import(args: &ImportArgs, session: &Session) -> Result<u8> {
    if args.catalog.is_none() && args.legacy.is_empty() {
        anyhow::bail!("nothing to import: pass --catalog and/or --legacy");
    }

    let mut pipeline = ImportPipeline::new().with_legacy_options(session.config.legacy_options());
    if let Some(path) = &args.catalog {
        let catalog = SchemaCatalog::load(path)
            .with_context(|| format!("failed to load catalog: {}", path.display()))?;
        pipeline = pipeline.with_catalog(catalog);
    }
    for path in &args.legacy {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read legacy docs: {}", path.display()))?;
        pipeline.add_legacy_docs(&text);
    }
    if args.out.is_dir() {
        pipeline
            .load_authored_dir(&args.out)
            .with_context(|| format!("failed to load forms: {}", args.out.display()))?;
    }

    let (files, mut report) = pipeline.stage();
    for file in files {
        if args.finalize {
            let path = file.path.clone();
            let (form, advisories) = file.finalize();
            report.advisories.extend(advisories);
            write(&args.out, CanonicalFormFile { form, path })?;
        } else {
            write(&args.out, file)?;
        }
    }

    print_report(&report, args.json)?;
    Ok(0)
}

/// Save to the file the form was loaded from, or to its canonical name.
fn write(dir: &Path, file: CanonicalFormFile) -> Result<()> {
    let id = file.id().context("imported form has no id")?;
    let path = file
        .path
        .clone()
        .unwrap_or_else(|| dir.join(file_name_for(id)));
    file.save(&path)
        .with_context(|| format!("failed to write form: {}", path.display()))
}

fn print_report(report: &ImportReport, json: bool) -> Result<()> {
    if json {
        let text = serde_json::to_string_pretty(report).context("failed to serialize report")?;
        println!("{text}");
        return Ok(());
    }
    for (id, sources) in &report.sources {
        let from = if sources.is_empty() {
            "authored only".to_string()
        } else {
            sources.join(", ")
        };
        println!("  {id:<40} {from}");
    }
    for advisory in &report.advisories {
        println!("  {advisory}");
    }
    println!();
    println!(
        "Imported {} form(s), {} advisory(ies)",
        report.forms.len(),
        report.advisories.len()
    );
    Ok(())
}
