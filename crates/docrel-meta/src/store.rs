//! Metadata persistence boundary.
//!
//! The core reads its startup state through this trait and stays agnostic
//! to where it lives (a SQL catalog, a file, an in-memory map in tests).
//! DDL execution does not go through here; that is the backend
//! transaction's job.

use docrel_error::Result;
use docrel_types::RowId;

use crate::meta::{MetaCollection, MetaDatabase, MetaDocPart, MetaSnapshot};

/// Read access to persisted metadata.
pub trait MetaStore {
    /// Read the committed metadata tree.
    fn read_metadata_snapshot(&self) -> Result<MetaSnapshot>;

    /// Read the last row id used in one doc-part table, or `RowId::new(-1)`
    /// when the table has no rows yet.
    fn read_last_row_id_used(
        &self,
        database: &MetaDatabase,
        collection: &MetaCollection,
        doc_part: &MetaDocPart,
    ) -> Result<RowId>;
}
