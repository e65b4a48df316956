//! # Import Pipeline
//!
//! Gathers fragments for each logical form id from a schema catalog,
//! legacy documentation and hand-authored canonical files, stages the
//! generated ones into the canonical file and finalizes it. A bad node
//! never stops the run; everything unusual lands in the [`ImportReport`].

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use formdef_core::{Advisory, AdvisoryKind, Form};
use serde::Serialize;

use crate::canonical::{merge_targeted, CanonicalFormFile, Source};
use crate::catalog::{CatalogImporter, SchemaCatalog};
use crate::error::ImportError;
use crate::legacy::{parse_legacy_docs, LegacyImportOptions};

/// Summary of one pipeline run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    /// Ids of the forms produced, in order.
    pub forms: Vec<String>,
    /// Which generated sources contributed to each form.
    pub sources: BTreeMap<String, Vec<&'static str>>,
    pub advisories: Vec<Advisory>,
}

impl ImportReport {
    pub fn count(&self, kind: AdvisoryKind) -> usize {
        self.advisories.iter().filter(|a| a.kind == kind).count()
    }
}

/// Collects inputs, then [`stage`](Self::stage)s or [`build`](Self::build)s.
#[derive(Debug, Default)]
pub struct ImportPipeline {
    catalog: Option<SchemaCatalog>,
    legacy: BTreeMap<String, Form>,
    authored: BTreeMap<String, CanonicalFormFile>,
    options: LegacyImportOptions,
    advisories: Vec<Advisory>,
}

impl ImportPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_legacy_options(mut self, options: LegacyImportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_catalog(mut self, catalog: SchemaCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Parse legacy documentation. Sections naming the same form id are
    /// merged in document order.
    pub fn add_legacy_docs(&mut self, text: &str) {
        let (forms, advisories) = parse_legacy_docs(text, &self.options);
        self.advisories.extend(advisories);
        for form in forms {
            let Some(id) = form.id.clone() else {
                continue;
            };
            match self.legacy.get_mut(&id) {
                Some(existing) => self.advisories.extend(merge_targeted(existing, &form)),
                None => {
                    self.legacy.insert(id, form);
                }
            }
        }
    }

    pub fn add_authored(&mut self, file: CanonicalFormFile) {
        if let Some(id) = file.id().map(str::to_string) {
            self.authored.insert(id, file);
        }
    }

    /// Load every `*.json` file in `dir` as a canonical form file.
    /// Returns how many were loaded.
    pub fn load_authored_dir(&mut self, dir: &Path) -> Result<usize, ImportError> {
        let entries = std::fs::read_dir(dir).map_err(|source| ImportError::Read {
            path: dir.to_path_buf(),
            source,
        })?;
        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| ImportError::Read {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|e| e == "json") {
                paths.push(path);
            }
        }
        paths.sort();
        for path in &paths {
            self.add_authored(CanonicalFormFile::load(path)?);
        }
        tracing::info!(dir = %dir.display(), files = paths.len(), "loaded hand-authored form files");
        Ok(paths.len())
    }

    /// Canonical files with freshly staged generated fragments.
    pub fn stage(mut self) -> (Vec<CanonicalFormFile>, ImportReport) {
        let mut ids: BTreeSet<String> = self.authored.keys().cloned().collect();
        ids.extend(self.legacy.keys().cloned());
        if let Some(catalog) = &self.catalog {
            ids.extend(catalog.ids().map(str::to_string));
        }

        let mut report = ImportReport::default();
        let mut files = Vec::with_capacity(ids.len());
        let mut importer = self.catalog.as_ref().map(CatalogImporter::new);

        for id in ids {
            let mut file = self
                .authored
                .remove(&id)
                .unwrap_or_else(|| CanonicalFormFile::new(Form::new(id.clone())));
            let mut sources = Vec::new();

            if let Some(fragment) = importer.as_mut().and_then(|i| i.import(&id)) {
                file.stage_generated(Source::SchemaCatalog, fragment);
                sources.push("catalog");
            }
            if let Some(fragment) = self.legacy.remove(&id) {
                file.stage_generated(Source::LegacyDocs, fragment);
                sources.push("legacy");
            }

            report.forms.push(id.clone());
            report.sources.insert(id, sources);
            files.push(file);
        }

        if let Some(importer) = importer.as_mut() {
            self.advisories.extend(importer.take_advisories());
        }
        report.advisories = self.advisories;
        tracing::info!(
            forms = report.forms.len(),
            advisories = report.advisories.len(),
            "staged import fragments"
        );
        (files, report)
    }

    /// Stage, then finalize every file into a canonical form. Tombstones
    /// are kept so the forms can be persisted as the next run's
    /// hand-authored side.
    pub fn build(self) -> (Vec<Form>, ImportReport) {
        let (files, mut report) = self.stage();
        let forms = files
            .into_iter()
            .map(|file| {
                let (form, advisories) = file.finalize();
                report.advisories.extend(advisories);
                form
            })
            .collect();
        (forms, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formdef_core::{DataType, Field};
    use serde_json::json;

    fn catalog() -> SchemaCatalog {
        SchemaCatalog::from_value(json!({
            "definitions": {
                "minecraft:light_block": {
                    "type": "object",
                    "properties": {
                        "luminance": {"type": "integer", "minimum": 0, "maximum": 15},
                        "size": {"anyOf": [{"type": "integer"}, {"type": "string"}]}
                    }
                }
            }
        }))
        .unwrap()
    }

    const DOCS: &str = "\
## minecraft:light_block
| Name | Default Value | Type | Description |
| luminance | 0 | Integer | Light level. |
| legacy_flag | false | Boolean | Unused. |

## minecraft:health
| Name | Default Value | Type | Description |
| value | 20 | Integer | Hit points. |
";

    #[test]
    fn fragments_from_every_source_fold_into_one_form() {
        let mut removed = Field::new("legacy_flag", DataType::Boolean);
        removed.is_removed = true;

        let mut pipeline = ImportPipeline::new().with_catalog(catalog());
        pipeline.add_legacy_docs(DOCS);
        pipeline.add_authored(CanonicalFormFile::new(
            Form::new("minecraft:light_block").with_title("Light").with_field(removed),
        ));
        let (forms, report) = pipeline.build();

        assert_eq!(report.forms, vec!["minecraft:health", "minecraft:light_block"]);
        assert_eq!(report.sources["minecraft:light_block"], vec!["catalog", "legacy"]);
        assert_eq!(report.sources["minecraft:health"], vec!["legacy"]);

        let light = &forms[1];
        assert_eq!(light.title.as_deref(), Some("Light"));
        assert!(light.field("legacy_flag").is_some_and(|f| f.is_removed));
        let luminance = light.field("luminance").unwrap();
        assert_eq!(luminance.max_value, Some(15.0));
        assert_eq!(luminance.default_value, Some(json!(0)));
        assert_eq!(luminance.description.as_deref(), Some("Light level."));

        let size = light.field("size").unwrap();
        assert_eq!(size.variant_count(), 2);
        assert!(!light.has_staging());
    }

    #[test]
    fn staged_files_keep_generated_keys() {
        let mut pipeline = ImportPipeline::new().with_catalog(catalog());
        pipeline.add_legacy_docs(DOCS);
        let (files, report) = pipeline.stage();
        assert_eq!(files.len(), 2);
        assert!(report.advisories.is_empty());
        let light = files.iter().find(|f| f.id() == Some("minecraft:light_block")).unwrap();
        assert!(light.form.generated.is_some());
        assert!(light.form.generated_from_schema.is_some());
        assert!(light.form.fields.is_empty());
    }

    #[test]
    fn shared_cycle_is_reported_once_and_not_fatal() {
        let catalog = SchemaCatalog::from_value(json!({
            "definitions": {
                "a": {"type": "object", "properties": {"b": {"$ref": "#/definitions/b"}}},
                "b": {"type": "object", "properties": {"a": {"$ref": "#/definitions/a"}}}
            }
        }))
        .unwrap();
        let (forms, report) = ImportPipeline::new().with_catalog(catalog).build();
        assert_eq!(forms.len(), 2);
        assert_eq!(report.count(AdvisoryKind::DependencyCycle), 1);
    }

    #[test]
    fn authored_directory_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        CanonicalFormFile::new(Form::new("x").with_field(Field::new("f", DataType::Int)))
            .save(&dir.path().join("x.form.json"))
            .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut pipeline = ImportPipeline::new();
        assert_eq!(pipeline.load_authored_dir(dir.path()).unwrap(), 1);
        let (forms, _) = pipeline.build();
        assert_eq!(forms[0].field("f").unwrap().data_type, DataType::Int);
    }
}
