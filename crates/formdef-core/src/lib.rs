//! # formdef-core — Form Definition Model
//!
//! The vocabulary every other `formdef-*` crate speaks: the schema
//! description system ("form definitions") for structured JSON content
//! such as block, entity, item, biome and feature definitions.
//!
//! ## Contents
//!
//! - [`Field`] / [`Form`]: the schema model. Forms nest through fields'
//!   sub-forms; named forms may reference each other in cycles through
//!   `sub_form_id`.
//! - [`DataType`]: the closed, numerically tagged data-type enumeration.
//!   Tags are a wire contract and are only ever appended.
//! - [`Condition`] and the [`ValueSource`] container adapters.
//! - Field utilities: [`get_field_value`], [`field_title`], [`evaluate`].
//! - [`FormRegistry`]: resolution of named forms.
//! - [`Advisory`]: non-fatal import/merge anomalies.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `formdef-*` crates.
//! - Forms are treated as immutable once merged; shared sub-forms are
//!   `Arc<Form>` so their identity is stable.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod advisory;
pub mod condition;
pub mod container;
pub mod data_type;
pub mod error;
pub mod field;
pub mod form;
pub mod registry;
pub mod utilities;

pub use advisory::{Advisory, AdvisoryKind};
pub use condition::{Comparison, Condition};
pub use container::{
    AccessorObject, Container, GetSetAccessor, KeyedMap, PropertyAccess, PropertyObject,
    ValueSource,
};
pub use data_type::{DataType, DATA_TYPE_COUNT};
pub use error::FormError;
pub use field::{Choice, Field};
pub use form::Form;
pub use registry::{FormRegistry, InMemoryFormRegistry, NoForms};
pub use utilities::{
    evaluate, field_title, get_field_value, humanize_id, is_version_string, visible_fields,
};

/// Sentinel field id standing for "any property name".
pub const ANY_KEY_SENTINEL: &str = "<any>";
