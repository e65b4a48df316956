//! # Form Registry
//!
//! Resolves a `sub_form_id` to a loaded [`Form`]. Consumers (validator,
//! compiler, selectors) tolerate an unresolved id by treating the nested
//! value as an open object of unknown shape.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::form::Form;

/// Lookup of named forms.
pub trait FormRegistry: Send + Sync {
    fn get_form(&self, id: &str) -> Option<Arc<Form>>;
}

/// A registry that knows no forms.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoForms;

impl FormRegistry for NoForms {
    fn get_form(&self, _id: &str) -> Option<Arc<Form>> {
        None
    }
}

impl FormRegistry for BTreeMap<String, Arc<Form>> {
    fn get_form(&self, id: &str) -> Option<Arc<Form>> {
        self.get(id).cloned()
    }
}

/// Thread-safe in-memory registry keyed by form id.
#[derive(Debug, Default)]
pub struct InMemoryFormRegistry {
    forms: RwLock<BTreeMap<String, Arc<Form>>>,
}

impl InMemoryFormRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a form under its id, replacing any previous instance.
    ///
    /// Anonymous forms cannot be registered and are returned unchanged
    /// without being stored.
    pub fn register(&self, form: impl Into<Arc<Form>>) -> Arc<Form> {
        let form = form.into();
        match form.id.clone() {
            Some(id) => {
                if self.forms.write().insert(id.clone(), Arc::clone(&form)).is_some() {
                    tracing::debug!(form = %id, "replaced registered form");
                }
            }
            None => tracing::warn!("ignoring registration of anonymous form"),
        }
        form
    }

    pub fn remove(&self, id: &str) -> Option<Arc<Form>> {
        self.forms.write().remove(id)
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        self.forms.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.forms.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.read().is_empty()
    }
}

impl FormRegistry for InMemoryFormRegistry {
    fn get_form(&self, id: &str) -> Option<Arc<Form>> {
        self.forms.read().get(id).cloned()
    }
}
