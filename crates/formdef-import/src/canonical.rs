//! # Canonical Form Files
//!
//! One JSON file per logical form id. The file holds the hand-authored
//! form plus two generator-owned staging keys
//! (`generated_doNotEdit`, `generatedFromSchema_doNotEdit`) that importers
//! overwrite on every run. [`CanonicalFormFile::finalize`] folds the
//! staging fragments into the hand-authored content with
//! [`merge_targeted`] and strips everything generator-only.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use formdef_core::{Advisory, AdvisoryKind, Field, Form};

use crate::error::ImportError;

/// Which generator produced a staged fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    /// Legacy prose documentation (`generated_doNotEdit`).
    LegacyDocs,
    /// Interchange schema catalog (`generatedFromSchema_doNotEdit`).
    SchemaCatalog,
}

/// File name for a form id: `minecraft:health` → `minecraft_health.form.json`.
pub fn file_name_for(id: &str) -> String {
    let stem: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.' { c } else { '_' })
        .collect();
    format!("{stem}.form.json")
}

/// A canonical form file: hand-authored content plus staging keys.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalFormFile {
    pub form: Form,
    /// Where the file was loaded from, if anywhere.
    pub path: Option<PathBuf>,
}

impl CanonicalFormFile {
    pub fn new(form: Form) -> Self {
        Self { form, path: None }
    }

    pub fn id(&self) -> Option<&str> {
        self.form.id.as_deref()
    }

    pub fn load(path: &Path) -> Result<Self, ImportError> {
        let text = std::fs::read_to_string(path).map_err(|source| ImportError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let form: Form = serde_json::from_str(&text).map_err(|source| ImportError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if form.id.is_none() {
            return Err(ImportError::MissingId(path.to_path_buf()));
        }
        tracing::debug!(path = %path.display(), form = %form.display_id(), "loaded canonical form file");
        Ok(Self {
            form,
            path: Some(path.to_path_buf()),
        })
    }

    /// Write the file as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ImportError> {
        let mut text = serde_json::to_string_pretty(&self.form).map_err(|source| ImportError::Serialize {
            form: self.form.display_id().to_string(),
            source,
        })?;
        text.push('\n');
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ImportError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, text).map_err(|source| ImportError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), form = %self.form.display_id(), "saved canonical form file");
        Ok(())
    }

    /// Replace the staged fragment for `source`.
    pub fn stage_generated(&mut self, source: Source, fragment: Form) {
        let slot = match source {
            Source::LegacyDocs => &mut self.form.generated,
            Source::SchemaCatalog => &mut self.form.generated_from_schema,
        };
        *slot = Some(Box::new(fragment));
    }

    /// Fold staged fragments into the hand-authored form and normalize.
    ///
    /// Hand-authored attributes win; the catalog fragment fills gaps
    /// before the legacy one. Both staging keys are absent from the
    /// result. Tombstoned fields stay, so the result can be saved back
    /// over the canonical file and keep suppressing generated fields on
    /// the next run; use [`resolve`](Self::resolve) for the form data is
    /// checked against.
    pub fn finalize(self) -> (Form, Vec<Advisory>) {
        let mut form = self.form;
        let (legacy, catalog) = form.take_staging();

        let mut advisories = Vec::new();
        for fragment in [catalog, legacy].into_iter().flatten() {
            advisories.extend(merge_targeted(&mut form, &fragment));
        }

        let (form, normalized) = formdef_merge::normalize(form);
        advisories.extend(normalized);
        tracing::debug!(form = %form.display_id(), advisories = advisories.len(), "finalized canonical form");
        (form, advisories)
    }

    /// [`finalize`](Self::finalize), then drop tombstoned fields. The
    /// result is what validation, compilation and codegen consume; it is
    /// never written back.
    pub fn resolve(self) -> (Form, Vec<Advisory>) {
        let (mut form, advisories) = self.finalize();
        strip_tombstones(&mut form);
        (form, advisories)
    }
}

/// Fill every attribute `target` leaves unset from `source`, merging
/// fields by id.
///
/// A target field marked `is_removed` is a tombstone: the same-id source
/// field is not merged in. Target fields keep their data type; shapes of
/// a same-id source union the target lacks become alternates. Source
/// fields whose id the target lacks are appended as-is, same-id union
/// fragments included.
pub fn merge_targeted(target: &mut Form, source: &Form) -> Vec<Advisory> {
    let mut advisories = Vec::new();

    fill(&mut target.id, &source.id);
    fill(&mut target.title, &source.title);
    fill(&mut target.description, &source.description);
    fill(&mut target.version, &source.version);
    fill(&mut target.samples, &source.samples);
    fill(&mut target.scalar_field_upgrade_name, &source.scalar_field_upgrade_name);
    if target.scalar_field_upgrade_name.is_none() {
        fill(&mut target.scalar_field, &source.scalar_field);
    }
    fill(&mut target.custom_field, &source.custom_field);
    target.is_deprecated |= source.is_deprecated;
    target.is_internal |= source.is_internal;
    for tag in &source.tags {
        if !target.tags.contains(tag) {
            target.tags.push(tag.clone());
        }
    }

    let path = target.display_id().to_string();
    let authored: HashSet<String> = target.fields.iter().map(|f| f.id.clone()).collect();
    let mut declared: HashMap<&str, usize> = HashMap::new();
    for field in &source.fields {
        *declared.entry(field.id.as_str()).or_default() += 1;
    }
    for field in &source.fields {
        let existing = authored
            .contains(&field.id)
            .then(|| target.fields.iter_mut().find(|f| f.id == field.id))
            .flatten();
        match existing {
            Some(existing) if existing.is_removed => {
                tracing::debug!(form = %path, field = %field.id, "generated field suppressed by tombstone");
            }
            Some(existing) => {
                let union = declared[field.id.as_str()] > 1 || !field.alternates.is_empty();
                merge_variants(existing, field, union, &path, &mut advisories);
            }
            None => target.fields.push(field.clone()),
        }
    }

    if target.ensure_scalar_authority() {
        advisories.push(Advisory::record(
            AdvisoryKind::ScalarAuthorityConflict,
            path,
            "both scalarField and scalarFieldUpgradeName set; upgrade name kept",
        ));
    }
    advisories
}

fn fill<T: Clone>(target: &mut Option<T>, source: &Option<T>) {
    if target.is_none() {
        target.clone_from(source);
    }
}

/// Merge each variant of `source` into the authored variant with the same
/// data type. When `source` is one shape of a union, a shape the authored
/// field lacks becomes a new alternate; otherwise the authored primary
/// keeps its data type and takes the attributes.
fn merge_variants(
    target: &mut Field,
    source: &Field,
    union: bool,
    path: &str,
    advisories: &mut Vec<Advisory>,
) {
    for variant in source.variants() {
        let mut variant = variant.clone();
        variant.alternates.clear();
        if target.data_type == variant.data_type {
            merge_field(target, &variant, path, advisories);
        } else if let Some(alternate) = target.alternates.iter_mut().find(|a| a.data_type == variant.data_type) {
            merge_field(alternate, &variant, path, advisories);
        } else if union {
            tracing::debug!(
                form = %path,
                field = %target.id,
                data_type = %variant.data_type,
                "generated union shape added as alternate"
            );
            target.alternates.push(variant);
        } else {
            merge_field(target, &variant, path, advisories);
        }
    }
}

fn merge_field(target: &mut Field, source: &Field, path: &str, advisories: &mut Vec<Advisory>) {
    fill(&mut target.alt_id, &source.alt_id);
    fill(&mut target.title, &source.title);
    fill(&mut target.description, &source.description);
    fill(&mut target.default_value, &source.default_value);
    fill(&mut target.min_value, &source.min_value);
    fill(&mut target.max_value, &source.max_value);
    fill(&mut target.min_length, &source.min_length);
    fill(&mut target.max_length, &source.max_length);
    fill(&mut target.valid_pattern, &source.valid_pattern);
    fill(&mut target.custom_field, &source.custom_field);
    if target.choices.is_empty() {
        target.choices.clone_from(&source.choices);
    }
    if target.alternates.is_empty() {
        target.alternates.clone_from(&source.alternates);
    }
    if target.visibility_conditions.is_empty() {
        target.visibility_conditions.clone_from(&source.visibility_conditions);
    }
    target.is_required |= source.is_required;
    target.is_deprecated |= source.is_deprecated;
    target.undefined_if_empty |= source.undefined_if_empty;

    if let Some(theirs) = &source.sub_form {
        match target.sub_form.as_mut() {
            Some(mine) => advisories.extend(merge_targeted(Arc::make_mut(mine), theirs)),
            None if target.sub_form_id.is_none() => target.sub_form = Some(Arc::clone(theirs)),
            None => advisories.push(Advisory::record(
                AdvisoryKind::SubFormConflict,
                format!("{path}/{}", target.id),
                "generated sub-form ignored; field references a named form",
            )),
        }
    }
    if target.sub_form.is_none() {
        fill(&mut target.sub_form_id, &source.sub_form_id);
    }
}

/// Remove tombstoned fields from `form` and every nested sub-form.
pub fn strip_tombstones(form: &mut Form) {
    form.fields.retain(|f| !f.is_removed);
    for field in &mut form.fields {
        strip_field(field);
        for alternate in &mut field.alternates {
            strip_field(alternate);
        }
    }
}

fn strip_field(field: &mut Field) {
    if let Some(sub) = &mut field.sub_form {
        if sub.fields.iter().any(has_tombstone) {
            strip_tombstones(Arc::make_mut(sub));
        }
    }
}

fn has_tombstone(field: &Field) -> bool {
    field.is_removed
        || field
            .sub_form
            .as_ref()
            .is_some_and(|sub| sub.fields.iter().any(has_tombstone))
        || field.alternates.iter().any(has_tombstone)
}
