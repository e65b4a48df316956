//! End-to-end import: catalog and legacy docs on disk, hand-authored
//! files in a forms directory, staged and finalized output written back.

use std::fs;

use formdef_core::{AdvisoryKind, DataType};
use formdef_import::{file_name_for, CanonicalFormFile, ImportPipeline, SchemaCatalog};

const CATALOG: &str = r##"{
  "definitions": {
    "minecraft:health": {
      "type": "object",
      "properties": {
        "value": {"type": "integer", "minimum": 0},
        "max": {"type": "integer"}
      },
      "required": ["value"]
    },
    "minecraft:event": {
      "type": "object",
      "properties": {
        "randomize": {"type": "array", "items": {"$ref": "#/definitions/weighted"}}
      }
    },
    "weighted": {
      "type": "object",
      "properties": {
        "weight": {"type": "number"},
        "event": {"$ref": "#/definitions/minecraft:event"}
      }
    }
  }
}"##;

const DOCS: &str = "\
## minecraft:health
Sets the health of the entity.

| Name | Default Value | Type | Description |
|:-----|:--------------|:-----|:------------|
| value | 20 | Integer | Current hit points. |
| max | *not set* | Integer | Maximum hit points. |
";

#[test]
fn stage_write_reload_and_finalize() {
    let dir = tempfile::tempdir().unwrap();
    let catalog_path = dir.path().join("catalog.json");
    fs::write(&catalog_path, CATALOG).unwrap();
    let forms_dir = dir.path().join("forms");
    fs::create_dir_all(&forms_dir).unwrap();

    // Stage and write every canonical file.
    let mut pipeline =
        ImportPipeline::new().with_catalog(SchemaCatalog::load(&catalog_path).unwrap());
    pipeline.add_legacy_docs(DOCS);
    let (files, report) = pipeline.stage();
    assert_eq!(files.len(), 3);
    assert_eq!(report.count(AdvisoryKind::DependencyCycle), 1);
    for file in &files {
        let id = file.id().unwrap();
        file.save(&forms_dir.join(file_name_for(id))).unwrap();
    }
    assert!(forms_dir.join("minecraft_health.form.json").exists());

    // Hand-edit one file, then re-run against the saved directory.
    let health_path = forms_dir.join("minecraft_health.form.json");
    let mut health = CanonicalFormFile::load(&health_path).unwrap();
    health.form.title = Some("Health".into());
    health.save(&health_path).unwrap();

    let mut pipeline =
        ImportPipeline::new().with_catalog(SchemaCatalog::load(&catalog_path).unwrap());
    pipeline.add_legacy_docs(DOCS);
    assert_eq!(pipeline.load_authored_dir(&forms_dir).unwrap(), 3);
    let (forms, report) = pipeline.build();
    assert_eq!(report.forms.len(), 3);

    let health = forms
        .iter()
        .find(|f| f.id.as_deref() == Some("minecraft:health"))
        .unwrap();
    assert_eq!(health.title.as_deref(), Some("Health"));
    assert_eq!(health.description.as_deref(), Some("Sets the health of the entity."));
    assert!(!health.has_staging());

    let value = health.field("value").unwrap();
    assert_eq!(value.data_type, DataType::Int);
    assert!(value.is_required);
    assert_eq!(value.min_value, Some(0.0));
    assert_eq!(value.default_value, Some(serde_json::json!(20)));
    assert_eq!(value.description.as_deref(), Some("Current hit points."));
    assert_eq!(health.field("max").unwrap().default_value, None);
}

#[test]
fn missing_catalog_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = SchemaCatalog::load(&dir.path().join("absent.json")).unwrap_err();
    assert!(err.to_string().contains("absent.json"));
}

#[test]
fn tombstones_persist_across_finalized_runs() {
    let catalog = || {
        SchemaCatalog::from_value(serde_json::json!({
            "definitions": {
                "minecraft:light_block": {
                    "type": "object",
                    "properties": {
                        "luminance": {"type": "integer"},
                        "legacy_flag": {"type": "boolean"}
                    }
                }
            }
        }))
        .unwrap()
    };
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(file_name_for("minecraft:light_block"));

    let mut removed = formdef_core::Field::new("legacy_flag", DataType::Boolean);
    removed.is_removed = true;
    CanonicalFormFile::new(formdef_core::Form::new("minecraft:light_block").with_field(removed))
        .save(&path)
        .unwrap();

    for _ in 0..2 {
        let mut pipeline = ImportPipeline::new().with_catalog(catalog());
        pipeline.load_authored_dir(dir.path()).unwrap();
        let (forms, _) = pipeline.build();
        assert_eq!(forms.len(), 1);
        let form = &forms[0];
        assert!(form.field("legacy_flag").is_some_and(|f| f.is_removed));
        assert!(form.field("luminance").is_some());
        CanonicalFormFile::new(form.clone()).save(&path).unwrap();
    }

    let (resolved, _) = CanonicalFormFile::load(&path).unwrap().resolve();
    assert!(resolved.field("legacy_flag").is_none());
    assert!(resolved.field("luminance").is_some());
}
