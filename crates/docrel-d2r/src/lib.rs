//! Document-to-relational translation.
//!
//! The [`D2RTranslator`] walks documents into per-level row batches
//! ([`CollectionData`]), drawing row ids from the [`ReservedIdGenerator`]
//! and physical identifiers from the generator in `docrel-meta`, while
//! staging every schema addition on the batch's metadata overlay.

pub mod docdata;
pub mod rid;
pub mod translator;

pub use docdata::{CollectionData, DocPartData, DocPartRow, FieldColumn, ScalarColumn};
pub use rid::ReservedIdGenerator;
pub use translator::{D2RTranslator, TranslatorConfig};
