//! # formdef-cli — Form Definition Command-Line Interface
//!
//! Provides the `formdef` binary. Argument parsing lives in the
//! subcommand modules; behavior is delegated to the library crates.
//!
//! ## Subcommands
//!
//! - `formdef validate`: validate JSON/YAML data against a form.
//! - `formdef compile`: check data with the compiled schema.
//! - `formdef merge`: finalize a canonical form file.
//! - `formdef import`: run the catalog and legacy-doc import pipeline.
//! - `formdef codegen`: print Rust type declarations for a form.
//! - `formdef json-schema`: print (and optionally apply) the JSON Schema export.
//!
//! ```bash
//! formdef --forms-dir forms validate --form forms/minecraft_health.form.json data/*.json
//! formdef import --catalog catalog.json --legacy docs/entities.md --out forms
//! ```

pub mod config;
pub mod generate;
pub mod import;
pub mod merge;
pub mod validate;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use formdef_core::{Form, FormRegistry, InMemoryFormRegistry};
use formdef_import::CanonicalFormFile;
use serde_json::Value;

use crate::config::CliConfig;

/// Configuration plus the registry every subcommand resolves
/// `subFormId`s through.
#[derive(Debug)]
pub struct Session {
    pub config: CliConfig,
    pub registry: Arc<InMemoryFormRegistry>,
}

impl Session {
    /// Build a session, loading every canonical file in `forms_dir`
    /// (falling back to the configured directory).
    pub fn open(config: CliConfig, forms_dir: Option<&Path>) -> Result<Self> {
        let session = Self {
            registry: Arc::new(InMemoryFormRegistry::new()),
            config,
        };
        let dir = forms_dir.map(Path::to_path_buf).or_else(|| session.config.forms_dir.clone());
        if let Some(dir) = dir {
            let count = session.load_forms_dir(&dir)?;
            tracing::info!(dir = %dir.display(), forms = count, "loaded form registry");
        }
        Ok(session)
    }

    /// Load, finalize and register every `*.json` file in `dir`.
    pub fn load_forms_dir(&self, dir: &Path) -> Result<usize> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
            .with_context(|| format!("failed to read forms directory: {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|e| e == "json"))
            .collect();
        paths.sort();
        for path in &paths {
            self.load_form(path)?;
        }
        Ok(paths.len())
    }

    /// Load a canonical form file, fold in any staged fragments, drop
    /// tombstones and register the result.
    pub fn load_form(&self, path: &Path) -> Result<Arc<Form>> {
        let file = CanonicalFormFile::load(path)
            .with_context(|| format!("failed to load form: {}", path.display()))?;
        let (form, advisories) = file.resolve();
        for advisory in &advisories {
            tracing::warn!(path = %path.display(), "{advisory}");
        }
        Ok(self.registry.register(form))
    }

    pub fn registry(&self) -> &dyn FormRegistry {
        self.registry.as_ref()
    }
}

/// Read a data document. `.yaml`/`.yml` files are parsed as YAML,
/// everything else as JSON.
pub fn read_data(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read data: {}", path.display()))?;
    let is_yaml = path
        .extension()
        .is_some_and(|e| e == "yaml" || e == "yml");
    if is_yaml {
        serde_yaml::from_str(&text).with_context(|| format!("failed to parse YAML: {}", path.display()))
    } else {
        serde_json::from_str(&text).with_context(|| format!("failed to parse JSON: {}", path.display()))
    }
}
