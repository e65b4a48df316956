//! # formdef-merge — Merge Engine
//!
//! Combines form fragments from different origins into one canonical
//! [`Form`](formdef_core::Form).
//!
//! ## Passes
//!
//! - **Merge** (`merge.rs`): duplicate field ids fold into one primary
//!   plus a flat `alternates` list; the primary is chosen by a total order
//!   (sub-form owners, then complex kinds, then data-type tag).
//!
//! - **Fixup** (`fixup.rs`): any-key sentinel fields become keyed
//!   collections, array-of-element types or a form's custom field.
//!
//! - **Select** (`select.rs`): resolve a `/`-separated sub-form path.
//!   The only pass that fails: an unresolvable selector is an authoring
//!   error.
//!
//! - **Prune** (`prune.rs`): remove empty objects from data where the
//!   schema says empty means absent.
//!
//! Every normalizing pass is idempotent. Generators re-run them on each
//! incremental build, so running one on its own output changes nothing.

pub mod fixup;
pub mod merge;
pub mod prune;
pub mod select;

pub use fixup::fixup_fields;
pub use merge::{merge_fields, sort_and_clean_alternate_fields};
pub use prune::prune_empty_objects;
pub use select::select_sub_form;

use formdef_core::{Advisory, Form};

/// Run sentinel fixup then field merge, returning the normalized form.
pub fn normalize(mut form: Form) -> (Form, Vec<Advisory>) {
    let mut advisories = fixup_fields(&mut form, None);
    advisories.extend(merge_fields(&mut form));
    tracing::debug!(
        form = %form.display_id(),
        fields = form.fields.len(),
        advisories = advisories.len(),
        "normalized form"
    );
    (form, advisories)
}
