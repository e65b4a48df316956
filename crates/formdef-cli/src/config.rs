//! # CLI Configuration
//!
//! Optional YAML file (`--config`, or `formdef.yaml` in the working
//! directory when present):
//!
//! ```yaml
//! forms_dir: forms
//! enforce_constraints: true
//! report_unknown_properties: true
//! legacy_max_depth: 8
//! ```
//!
//! Every key is optional. Relative `forms_dir` values resolve against the
//! directory holding the config file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use formdef_import::LegacyImportOptions;
use formdef_schema::CompileOptions;
use formdef_validate::ValidationOptions;
use serde::Deserialize;

/// Name of the config file picked up from the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "formdef.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Directory of canonical form files used to resolve `subFormId`s.
    pub forms_dir: Option<PathBuf>,
    pub enforce_constraints: bool,
    pub report_unknown_properties: bool,
    pub legacy_max_depth: usize,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            forms_dir: None,
            enforce_constraints: true,
            report_unknown_properties: true,
            legacy_max_depth: LegacyImportOptions::default().max_depth,
        }
    }
}

impl CliConfig {
    /// Parse a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        let mut config: Self = if text.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(&text)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        };
        if let (Some(dir), Some(base)) = (&config.forms_dir, path.parent()) {
            if dir.is_relative() {
                config.forms_dir = Some(base.join(dir));
            }
        }
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// The explicit config when given, else `formdef.yaml` in `cwd` when it
    /// exists, else defaults.
    pub fn resolve(explicit: Option<&Path>, cwd: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let implicit = cwd.join(DEFAULT_CONFIG_FILE);
        if implicit.is_file() {
            Self::load(&implicit)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validation_options(&self) -> ValidationOptions {
        ValidationOptions {
            enforce_constraints: self.enforce_constraints,
            report_unknown_properties: self.report_unknown_properties,
        }
    }

    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            enforce_constraints: self.enforce_constraints,
        }
    }

    pub fn legacy_options(&self) -> LegacyImportOptions {
        LegacyImportOptions {
            max_depth: self.legacy_max_depth,
        }
    }
}
