//! In-memory backend.
//!
//! Backs the integration tests and serves as the reference implementation
//! of the two traits a real backend provides: [`MetaStore`] for startup
//! reads and [`BackendTransaction`] for job execution. Tables live in a
//! shared map keyed by physical identifier; a transaction works on a
//! clone of the whole state and publishes it on commit, so a rolled-back
//! batch leaves no trace.

use std::collections::HashMap;
use std::sync::Arc;

use docrel_backend::BackendTransaction;
use docrel_d2r::DocPartData;
use docrel_error::{DocRelError, Result};
use docrel_meta::{MetaCollection, MetaDatabase, MetaDocPart, MetaIndex, MetaSnapshot, MetaStore};
use docrel_types::{DocValue, FieldType, Identifier, RowId, TableRef};
use parking_lot::Mutex;
use tracing::debug;

/// One materialized row of an in-memory table.
#[derive(Debug, Clone, PartialEq)]
pub struct MemRow {
    /// Root document id.
    pub did: i64,
    /// Row id.
    pub rid: i64,
    /// Parent row id, absent on root rows.
    pub pid: Option<i64>,
    /// Array position, present on array-element rows.
    pub seq: Option<i32>,
    /// Values keyed by physical column identifier.
    pub values: HashMap<String, DocValue>,
}

#[derive(Debug, Clone, Default)]
struct MemTable {
    columns: Vec<String>,
    rows: Vec<MemRow>,
}

#[derive(Debug, Clone, Default)]
struct MemState {
    snapshot: MetaSnapshot,
    databases: Vec<String>,
    collections: Vec<(String, String)>,
    tables: HashMap<String, MemTable>,
}

/// Shared in-memory backend state.
#[derive(Debug, Clone, Default)]
pub struct MemBackend {
    state: Arc<Mutex<MemState>>,
}

impl MemBackend {
    /// An empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the committed snapshot, as a real catalog writer would
    /// after folding a batch. Lets tests exercise engine restarts.
    pub fn install_snapshot(&self, snapshot: MetaSnapshot) {
        self.state.lock().snapshot = snapshot;
    }

    /// Begin a write transaction over a working copy of the state.
    #[must_use]
    pub fn begin(&self) -> MemTransaction {
        let working = self.state.lock().clone();
        MemTransaction {
            shared: Arc::clone(&self.state),
            working,
        }
    }

    /// The committed rows of one table, by physical identifier.
    #[must_use]
    pub fn table_rows(&self, identifier: &str) -> Option<Vec<MemRow>> {
        self.state
            .lock()
            .tables
            .get(identifier)
            .map(|t| t.rows.clone())
    }

    /// The committed column identifiers of one table.
    #[must_use]
    pub fn table_columns(&self, identifier: &str) -> Option<Vec<String>> {
        self.state
            .lock()
            .tables
            .get(identifier)
            .map(|t| t.columns.clone())
    }

    /// Identifiers of all committed tables.
    #[must_use]
    pub fn table_identifiers(&self) -> Vec<String> {
        self.state.lock().tables.keys().cloned().collect()
    }

    /// Databases created through committed transactions.
    #[must_use]
    pub fn database_names(&self) -> Vec<String> {
        self.state.lock().databases.clone()
    }
}

impl MetaStore for MemBackend {
    fn read_metadata_snapshot(&self) -> Result<MetaSnapshot> {
        Ok(self.state.lock().snapshot.clone())
    }

    fn read_last_row_id_used(
        &self,
        _database: &MetaDatabase,
        _collection: &MetaCollection,
        doc_part: &MetaDocPart,
    ) -> Result<RowId> {
        let state = self.state.lock();
        let last = state
            .tables
            .get(doc_part.identifier().as_str())
            .and_then(|t| t.rows.iter().map(|r| r.rid).max())
            .unwrap_or(-1);
        Ok(RowId::new(last))
    }
}

/// A write transaction over [`MemBackend`].
#[derive(Debug)]
pub struct MemTransaction {
    shared: Arc<Mutex<MemState>>,
    working: MemState,
}

impl MemTransaction {
    fn table_mut(&mut self, identifier: &Identifier) -> Result<&mut MemTable> {
        self.working
            .tables
            .get_mut(identifier.as_str())
            .ok_or_else(|| {
                DocRelError::backend(format!("no such table: {identifier}"))
            })
    }
}

impl BackendTransaction for MemTransaction {
    fn add_database(&mut self, database: &str, identifier: &Identifier) -> Result<()> {
        debug!(database, identifier = %identifier, "mem: add database");
        self.working.databases.push(database.to_owned());
        Ok(())
    }

    fn add_collection(
        &mut self,
        database: &str,
        collection: &str,
        _identifier: &Identifier,
    ) -> Result<()> {
        self.working
            .collections
            .push((database.to_owned(), collection.to_owned()));
        Ok(())
    }

    fn add_doc_part(
        &mut self,
        _database: &str,
        _collection: &str,
        _table_ref: &Arc<TableRef>,
        identifier: &Identifier,
    ) -> Result<()> {
        if self.working.tables.contains_key(identifier.as_str()) {
            return Err(DocRelError::backend(format!(
                "table already exists: {identifier}"
            )));
        }
        self.working
            .tables
            .insert(identifier.as_str().to_owned(), MemTable::default());
        Ok(())
    }

    fn add_field(
        &mut self,
        _database: &str,
        _collection: &str,
        doc_part: &Identifier,
        _name: &str,
        _field_type: FieldType,
        identifier: &Identifier,
    ) -> Result<()> {
        let column = identifier.as_str().to_owned();
        let table = self.table_mut(doc_part)?;
        if table.columns.contains(&column) {
            return Err(DocRelError::backend(format!(
                "column already exists: {identifier}"
            )));
        }
        table.columns.push(column);
        Ok(())
    }

    fn add_scalar(
        &mut self,
        database: &str,
        collection: &str,
        doc_part: &Identifier,
        field_type: FieldType,
        identifier: &Identifier,
    ) -> Result<()> {
        self.add_field(database, collection, doc_part, "", field_type, identifier)
    }

    fn create_index(&mut self, _database: &str, _collection: &str, _index: &MetaIndex) -> Result<()> {
        Ok(())
    }

    fn insert(&mut self, _database: &str, _collection: &str, data: &DocPartData) -> Result<()> {
        let mut rows = Vec::with_capacity(data.row_count());
        for row in data.rows() {
            let mut values = HashMap::new();
            for (i, column) in data.field_columns().iter().enumerate() {
                if let Some(v) = row.field_value(i) {
                    values.insert(column.identifier().as_str().to_owned(), v.clone());
                }
            }
            for (i, column) in data.scalar_columns().iter().enumerate() {
                if let Some(v) = row.scalar_value(i) {
                    values.insert(column.identifier().as_str().to_owned(), v.clone());
                }
            }
            rows.push(MemRow {
                did: row.did().get(),
                rid: row.rid().get(),
                pid: row.pid().map(RowId::get),
                seq: row.seq().map(docrel_types::SeqIdx::get),
                values,
            });
        }
        let table = self.table_mut(data.identifier())?;
        table.rows.extend(rows);
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        let mut shared = self.shared.lock();
        *shared = std::mem::take(&mut self.working);
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        // Discard the working copy; the shared state never saw it.
        self.working = self.shared.lock().clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rollback_leaves_shared_state_untouched() {
        let backend = MemBackend::new();
        let mut tx = backend.begin();
        tx.add_database("shop", &Identifier::new("shop")).unwrap();
        tx.add_doc_part(
            "shop",
            "orders",
            &TableRef::root(),
            &Identifier::new("orders_t"),
        )
        .unwrap();
        tx.rollback().unwrap();
        assert!(backend.table_identifiers().is_empty());
        assert!(backend.database_names().is_empty());
    }

    #[test]
    fn commit_publishes_the_working_copy() {
        let backend = MemBackend::new();
        let mut tx = backend.begin();
        tx.add_doc_part(
            "shop",
            "orders",
            &TableRef::root(),
            &Identifier::new("orders_t"),
        )
        .unwrap();
        tx.add_field(
            "shop",
            "orders",
            &Identifier::new("orders_t"),
            "a",
            FieldType::Integer,
            &Identifier::new("a_i"),
        )
        .unwrap();
        tx.commit().unwrap();

        assert_eq!(backend.table_columns("orders_t").unwrap(), vec!["a_i"]);
    }

    #[test]
    fn duplicate_ddl_is_a_backend_error() {
        let backend = MemBackend::new();
        let mut tx = backend.begin();
        let root = TableRef::root();
        tx.add_doc_part("d", "c", &root, &Identifier::new("t")).unwrap();
        let err = tx
            .add_doc_part("d", "c", &root, &Identifier::new("t"))
            .unwrap_err();
        assert!(matches!(err, DocRelError::Backend { .. }));
    }
}
