//! The write-transaction boundary.
//!
//! Jobs execute against this trait; SQL text generation and driver
//! plumbing live behind it, out of the core's sight. One implementation
//! handle is reused across a whole batch's job sequence and must either
//! commit everything or roll all of it back.

use std::sync::Arc;

use docrel_d2r::DocPartData;
use docrel_error::Result;
use docrel_meta::MetaIndex;
use docrel_types::{FieldType, Identifier, TableRef};

/// A write transaction against the relational backend.
pub trait BackendTransaction {
    /// Create the backend-side container for a database.
    fn add_database(&mut self, database: &str, identifier: &Identifier) -> Result<()>;

    /// Create the backend-side container for a collection.
    fn add_collection(
        &mut self,
        database: &str,
        collection: &str,
        identifier: &Identifier,
    ) -> Result<()>;

    /// Create the table backing one doc part.
    fn add_doc_part(
        &mut self,
        database: &str,
        collection: &str,
        table_ref: &Arc<TableRef>,
        identifier: &Identifier,
    ) -> Result<()>;

    /// Add a named, typed column to a doc-part table.
    fn add_field(
        &mut self,
        database: &str,
        collection: &str,
        doc_part: &Identifier,
        name: &str,
        field_type: FieldType,
        identifier: &Identifier,
    ) -> Result<()>;

    /// Add a type-indexed scalar column to a doc-part table.
    fn add_scalar(
        &mut self,
        database: &str,
        collection: &str,
        doc_part: &Identifier,
        field_type: FieldType,
        identifier: &Identifier,
    ) -> Result<()>;

    /// Create a secondary index.
    fn create_index(&mut self, database: &str, collection: &str, index: &MetaIndex) -> Result<()>;

    /// Insert one doc part's accumulated rows.
    fn insert(&mut self, database: &str, collection: &str, data: &DocPartData) -> Result<()>;

    /// Make the batch's changes durable.
    fn commit(&mut self) -> Result<()>;

    /// Undo everything the batch wrote.
    fn rollback(&mut self) -> Result<()>;
}
