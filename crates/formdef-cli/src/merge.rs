//! # Merge Subcommand
//!
//! Finalizes a canonical form file: staged generator fragments are folded
//! into the hand-authored content and the result is normalized.
//! Tombstoned fields are kept so later imports still honor them. Prints
//! the canonical JSON, or rewrites the file in place with `--write`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use formdef_import::CanonicalFormFile;

use crate::Session;

#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Canonical form file to finalize.
    pub file: PathBuf,

    /// Overwrite the file instead of printing the result.
    #[arg(long)]
    pub write: bool,
}

/// Execute `formdef merge`.
pub fn run_merge(args: &MergeArgs, _session: &Session) -> Result<u8> {
    let file = CanonicalFormFile::load(&args.file)
        .with_context(|| format!("failed to load form: {}", args.file.display()))?;
    let (form, advisories) = file.finalize();
    for advisory in &advisories {
        eprintln!("{advisory}");
    }

    if args.write {
        CanonicalFormFile::new(form)
            .save(&args.file)
            .with_context(|| format!("failed to write form: {}", args.file.display()))?;
        println!("wrote {}", args.file.display());
    } else {
        let text = serde_json::to_string_pretty(&form).context("failed to serialize form")?;
        println!("{text}");
    }
    Ok(0)
}
