//! # formdef-import — Form Definition Importers
//!
//! Turns upstream descriptions of a data format into canonical forms:
//!
//! - [`catalog`]: an interchange JSON Schema catalog. Each definition
//!   becomes a form fragment; `$ref` cycles are linked by id and reported.
//! - [`legacy`]: line-oriented prose documentation with headed sections
//!   and field tables.
//! - [`canonical`]: the hand-authored canonical file format. Generators
//!   stage their fragments under `generated` / `generatedFromSchema`;
//!   [`CanonicalFormFile::finalize`] folds them in with a targeted merge
//!   that never overrides an authored attribute.
//! - [`pipeline`]: drives all three per logical form id.
//!
//! No import stops on a malformed node. Everything unusual is returned
//! as an [`Advisory`](formdef_core::Advisory).

pub mod canonical;
pub mod catalog;
pub mod error;
pub mod legacy;
pub mod pipeline;

pub use canonical::{file_name_for, merge_targeted, strip_tombstones, CanonicalFormFile, Source};
pub use catalog::{CatalogImporter, SchemaCatalog, SchemaNode};
pub use error::ImportError;
pub use legacy::{parse_legacy_docs, LegacyImportOptions};
pub use pipeline::{ImportPipeline, ImportReport};
