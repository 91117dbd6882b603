//! Mutable batch overlays over an immutable snapshot.
//!
//! A translation batch never mutates shared metadata in place. It builds an
//! overlay that wraps the current snapshot, stages its additions (new doc
//! parts, fields, scalars, indexes, collections, databases) with
//! created-on-batch provenance, and folds everything into a fresh immutable
//! snapshot at commit. One batch = one thread; the wrapped snapshot stays
//! safe for concurrent readers.

use std::collections::HashMap;
use std::sync::Arc;

use docrel_types::{FieldType, Identifier, TableRef};
use tracing::debug;

use crate::identifier::IdentifierChecker;
use crate::meta::{
    MetaCollection, MetaDatabase, MetaDocPart, MetaField, MetaIndex, MetaScalar, MetaSnapshot,
};

// ---------------------------------------------------------------------------
// MutableMetaDocPart
// ---------------------------------------------------------------------------

/// One doc part as seen by the current batch: the snapshot's columns plus
/// anything this batch added.
#[derive(Debug, Clone)]
pub struct MutableMetaDocPart {
    inner: MetaDocPart,
    created_on_batch: bool,
    batch_fields: Vec<(String, FieldType)>,
    batch_scalars: Vec<FieldType>,
}

impl MutableMetaDocPart {
    /// Wrap a doc part that already exists in the snapshot.
    #[must_use]
    pub fn from_meta(meta: &MetaDocPart) -> Self {
        Self {
            inner: meta.clone(),
            created_on_batch: false,
            batch_fields: Vec::new(),
            batch_scalars: Vec::new(),
        }
    }

    /// Stage a brand new doc part.
    #[must_use]
    pub fn new_on_batch(table_ref: Arc<TableRef>, identifier: Identifier) -> Self {
        Self {
            inner: MetaDocPart::new(table_ref, identifier),
            created_on_batch: true,
            batch_fields: Vec::new(),
            batch_scalars: Vec::new(),
        }
    }

    /// Position of this table in the document structure.
    #[must_use]
    pub const fn table_ref(&self) -> &Arc<TableRef> {
        self.inner.table_ref()
    }

    /// Physical table identifier.
    #[must_use]
    pub const fn identifier(&self) -> &Identifier {
        self.inner.identifier()
    }

    /// Whether this doc part was first seen in the current batch.
    #[must_use]
    pub const fn is_created_on_batch(&self) -> bool {
        self.created_on_batch
    }

    /// Whether the planner has any DDL to emit for this doc part.
    #[must_use]
    pub fn has_batch_changes(&self) -> bool {
        self.created_on_batch || !self.batch_fields.is_empty() || !self.batch_scalars.is_empty()
    }

    /// Look up a field column (snapshot or staged) by name and type.
    #[must_use]
    pub fn field(&self, name: &str, field_type: FieldType) -> Option<&MetaField> {
        self.inner.field(name, field_type)
    }

    /// Look up a scalar column (snapshot or staged) by type.
    #[must_use]
    pub fn scalar(&self, field_type: FieldType) -> Option<&MetaScalar> {
        self.inner.scalar(field_type)
    }

    /// Whether any column (field or scalar) already uses `candidate`.
    #[must_use]
    pub fn column_identifier_in_use(&self, candidate: &str) -> bool {
        self.inner
            .fields()
            .any(|f| f.identifier().as_str() == candidate)
            || self
                .inner
                .scalars()
                .any(|s| s.identifier().as_str() == candidate)
    }

    /// Stage a new field column.
    pub fn add_field(&mut self, field: MetaField) {
        debug!(
            table_ref = %self.table_ref(),
            field = field.name(),
            field_type = ?field.field_type(),
            identifier = %field.identifier(),
            "staging field column"
        );
        self.batch_fields
            .push((field.name().to_owned(), field.field_type()));
        self.inner.insert_field(field);
    }

    /// Stage a new scalar column.
    pub fn add_scalar(&mut self, scalar: MetaScalar) {
        debug!(
            table_ref = %self.table_ref(),
            field_type = ?scalar.field_type(),
            identifier = %scalar.identifier(),
            "staging scalar column"
        );
        self.batch_scalars.push(scalar.field_type());
        self.inner.insert_scalar(scalar);
    }

    /// Fields added by the current batch, in staging order.
    pub fn fields_added_on_batch(&self) -> impl Iterator<Item = &MetaField> {
        self.batch_fields
            .iter()
            .filter_map(|(name, ft)| self.inner.field(name, *ft))
    }

    /// Scalars added by the current batch, in staging order.
    pub fn scalars_added_on_batch(&self) -> impl Iterator<Item = &MetaScalar> {
        self.batch_scalars
            .iter()
            .filter_map(|ft| self.inner.scalar(*ft))
    }

    /// Fold into the immutable representation.
    #[must_use]
    pub fn into_meta(self) -> MetaDocPart {
        self.inner
    }
}

// ---------------------------------------------------------------------------
// MutableMetaCollection
// ---------------------------------------------------------------------------

/// One collection as seen by the current batch.
#[derive(Debug, Clone)]
pub struct MutableMetaCollection {
    name: String,
    identifier: Identifier,
    created_on_batch: bool,
    base: Option<MetaCollection>,
    touched: HashMap<Arc<TableRef>, MutableMetaDocPart>,
    batch_indexes: Vec<MetaIndex>,
}

impl MutableMetaCollection {
    /// Wrap a collection that already exists in the snapshot.
    #[must_use]
    pub fn from_meta(meta: &MetaCollection) -> Self {
        Self {
            name: meta.name().to_owned(),
            identifier: meta.identifier().clone(),
            created_on_batch: false,
            base: Some(meta.clone()),
            touched: HashMap::new(),
            batch_indexes: Vec::new(),
        }
    }

    /// Stage a brand new collection.
    #[must_use]
    pub fn new_on_batch(name: impl Into<String>, identifier: Identifier) -> Self {
        Self {
            name: name.into(),
            identifier,
            created_on_batch: true,
            base: None,
            touched: HashMap::new(),
            batch_indexes: Vec::new(),
        }
    }

    /// Logical collection name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Physical identifier.
    #[must_use]
    pub const fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// Whether this collection was first seen in the current batch.
    #[must_use]
    pub const fn is_created_on_batch(&self) -> bool {
        self.created_on_batch
    }

    /// Whether a doc part exists for `table_ref`, staged or committed.
    #[must_use]
    pub fn contains_doc_part(&self, table_ref: &TableRef) -> bool {
        self.touched.contains_key(table_ref)
            || self
                .base
                .as_ref()
                .is_some_and(|b| b.doc_part(table_ref).is_some())
    }

    /// A doc part this batch has touched, if any.
    #[must_use]
    pub fn touched_doc_part(&self, table_ref: &TableRef) -> Option<&MutableMetaDocPart> {
        self.touched.get(table_ref)
    }

    /// All doc parts this batch has touched.
    pub fn touched_doc_parts(&self) -> impl Iterator<Item = &MutableMetaDocPart> {
        self.touched.values()
    }

    /// Get a doc part for mutation, materializing the snapshot copy on
    /// first touch. Returns `None` when the doc part does not exist yet.
    pub fn touch_doc_part(&mut self, table_ref: &Arc<TableRef>) -> Option<&mut MutableMetaDocPart> {
        if !self.touched.contains_key(table_ref.as_ref()) {
            let from_base = self
                .base
                .as_ref()
                .and_then(|b| b.doc_part(table_ref))
                .map(MutableMetaDocPart::from_meta)?;
            self.touched.insert(Arc::clone(table_ref), from_base);
        }
        self.touched.get_mut(table_ref.as_ref())
    }

    /// Stage a brand new doc part. The caller has already checked it does
    /// not exist.
    pub fn add_doc_part(
        &mut self,
        table_ref: Arc<TableRef>,
        identifier: Identifier,
    ) -> &mut MutableMetaDocPart {
        debug!(
            collection = %self.name,
            table_ref = %table_ref,
            identifier = %identifier,
            "staging doc part"
        );
        let dp = MutableMetaDocPart::new_on_batch(Arc::clone(&table_ref), identifier);
        self.touched.insert(Arc::clone(&table_ref), dp);
        self.touched
            .get_mut(table_ref.as_ref())
            .expect("doc part staged above")
    }

    /// Stage a new index.
    pub fn add_index(&mut self, index: MetaIndex) {
        self.batch_indexes.push(index);
    }

    /// Indexes added by the current batch, in staging order.
    pub fn indexes_added_on_batch(&self) -> impl Iterator<Item = &MetaIndex> {
        self.batch_indexes.iter()
    }

    /// Whether any doc part or index of this collection (staged or
    /// committed) already uses `candidate`.
    #[must_use]
    pub fn table_identifier_in_use(&self, candidate: &str) -> bool {
        if self
            .touched
            .values()
            .any(|dp| dp.identifier().as_str() == candidate)
        {
            return true;
        }
        if self
            .batch_indexes
            .iter()
            .any(|ix| ix.identifier().as_str() == candidate)
        {
            return true;
        }
        self.base.as_ref().is_some_and(|b| {
            b.doc_parts()
                .any(|dp| dp.identifier().as_str() == candidate)
                || b.indexes().any(|ix| ix.identifier().as_str() == candidate)
        })
    }

    /// Fold staged changes into an immutable collection.
    #[must_use]
    pub fn into_meta(self) -> MetaCollection {
        let mut out = self
            .base
            .unwrap_or_else(|| MetaCollection::new(self.name, self.identifier));
        for (_, dp) in self.touched {
            out.insert_doc_part(dp.into_meta());
        }
        for ix in self.batch_indexes {
            out.insert_index(ix);
        }
        out
    }
}

// ---------------------------------------------------------------------------
// MutableMetaDatabase
// ---------------------------------------------------------------------------

/// One database as seen by the current batch.
#[derive(Debug, Clone)]
pub struct MutableMetaDatabase {
    name: String,
    identifier: Identifier,
    created_on_batch: bool,
    base: Option<MetaDatabase>,
    touched: HashMap<String, MutableMetaCollection>,
}

impl MutableMetaDatabase {
    /// Wrap a database that already exists in the snapshot.
    #[must_use]
    pub fn from_meta(meta: &MetaDatabase) -> Self {
        Self {
            name: meta.name().to_owned(),
            identifier: meta.identifier().clone(),
            created_on_batch: false,
            base: Some(meta.clone()),
            touched: HashMap::new(),
        }
    }

    /// Stage a brand new database.
    #[must_use]
    pub fn new_on_batch(name: impl Into<String>, identifier: Identifier) -> Self {
        Self {
            name: name.into(),
            identifier,
            created_on_batch: true,
            base: None,
            touched: HashMap::new(),
        }
    }

    /// Logical database name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Physical identifier.
    #[must_use]
    pub const fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// Whether this database was first seen in the current batch.
    #[must_use]
    pub const fn is_created_on_batch(&self) -> bool {
        self.created_on_batch
    }

    /// A collection this batch has touched, if any.
    #[must_use]
    pub fn touched_collection(&self, name: &str) -> Option<&MutableMetaCollection> {
        self.touched.get(name)
    }

    /// Get a collection for mutation, materializing the snapshot copy on
    /// first touch. Returns `None` when the collection does not exist yet.
    pub fn touch_collection(&mut self, name: &str) -> Option<&mut MutableMetaCollection> {
        if !self.touched.contains_key(name) {
            let from_base = self
                .base
                .as_ref()
                .and_then(|b| b.collection(name))
                .map(MutableMetaCollection::from_meta)?;
            self.touched.insert(name.to_owned(), from_base);
        }
        self.touched.get_mut(name)
    }

    /// Stage a brand new collection. The caller has already checked it
    /// does not exist.
    pub fn add_collection(
        &mut self,
        name: impl Into<String>,
        identifier: Identifier,
    ) -> &mut MutableMetaCollection {
        let name = name.into();
        debug!(database = %self.name, collection = %name, identifier = %identifier, "staging collection");
        self.touched.insert(
            name.clone(),
            MutableMetaCollection::new_on_batch(name.clone(), identifier),
        );
        self.touched
            .get_mut(&name)
            .expect("collection staged above")
    }

    /// Whether `name` exists as a collection, staged or committed.
    #[must_use]
    pub fn contains_collection(&self, name: &str) -> bool {
        self.touched.contains_key(name)
            || self
                .base
                .as_ref()
                .is_some_and(|b| b.collection(name).is_some())
    }

    /// Whether any table or index identifier in this database (staged or
    /// committed, across all collections) already uses `candidate`.
    #[must_use]
    pub fn table_identifier_in_use(&self, candidate: &str) -> bool {
        if self
            .touched
            .values()
            .any(|c| c.table_identifier_in_use(candidate))
        {
            return true;
        }
        self.base.as_ref().is_some_and(|b| {
            b.collections().any(|c| {
                // Collections untouched by the batch still occupy their
                // committed identifiers.
                self.touched_collection(c.name()).is_none()
                    && (c
                        .doc_parts()
                        .any(|dp| dp.identifier().as_str() == candidate)
                        || c.indexes().any(|ix| ix.identifier().as_str() == candidate))
            })
        })
    }

    /// Fold staged changes into an immutable database.
    #[must_use]
    pub fn into_meta(self) -> MetaDatabase {
        let mut out = self
            .base
            .unwrap_or_else(|| MetaDatabase::new(self.name, self.identifier));
        for (_, col) in self.touched {
            out.insert_collection(col.into_meta());
        }
        out
    }
}

// ---------------------------------------------------------------------------
// MutableMetaSnapshot
// ---------------------------------------------------------------------------

/// The whole metadata tree as seen by the current batch.
#[derive(Debug)]
pub struct MutableMetaSnapshot {
    base: Arc<MetaSnapshot>,
    touched: HashMap<String, MutableMetaDatabase>,
}

impl MutableMetaSnapshot {
    /// Start a batch overlay over `base`.
    #[must_use]
    pub fn new(base: Arc<MetaSnapshot>) -> Self {
        Self {
            base,
            touched: HashMap::new(),
        }
    }

    /// The wrapped immutable snapshot.
    #[must_use]
    pub fn base(&self) -> &Arc<MetaSnapshot> {
        &self.base
    }

    /// A database this batch has touched, if any.
    #[must_use]
    pub fn touched_database(&self, name: &str) -> Option<&MutableMetaDatabase> {
        self.touched.get(name)
    }

    /// Get a database for mutation, materializing the snapshot copy on
    /// first touch. Returns `None` when the database does not exist yet.
    pub fn touch_database(&mut self, name: &str) -> Option<&mut MutableMetaDatabase> {
        if !self.touched.contains_key(name) {
            let from_base = self.base.database(name).map(MutableMetaDatabase::from_meta)?;
            self.touched.insert(name.to_owned(), from_base);
        }
        self.touched.get_mut(name)
    }

    /// Stage a brand new database.
    pub fn add_database(
        &mut self,
        name: impl Into<String>,
        identifier: Identifier,
    ) -> &mut MutableMetaDatabase {
        let name = name.into();
        debug!(database = %name, identifier = %identifier, "staging database");
        self.touched.insert(
            name.clone(),
            MutableMetaDatabase::new_on_batch(name.clone(), identifier),
        );
        self.touched.get_mut(&name).expect("database staged above")
    }

    /// Whether any database identifier (staged or committed) already uses
    /// `candidate`.
    #[must_use]
    pub fn database_identifier_in_use(&self, candidate: &str) -> bool {
        self.touched
            .values()
            .any(|d| d.identifier().as_str() == candidate)
            || self
                .base
                .databases()
                .any(|d| d.identifier().as_str() == candidate)
    }

    /// Fold staged changes into a fresh immutable snapshot.
    #[must_use]
    pub fn commit(self) -> MetaSnapshot {
        let mut out = (*self.base).clone();
        for (_, db) in self.touched {
            out.insert_database(db.into_meta());
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Identifier checkers
// ---------------------------------------------------------------------------

/// Uniqueness scope for database identifiers.
pub struct DatabaseIdentifierChecker<'a> {
    snapshot: &'a MutableMetaSnapshot,
}

impl<'a> DatabaseIdentifierChecker<'a> {
    /// Create a checker over the batch's snapshot view.
    #[must_use]
    pub const fn new(snapshot: &'a MutableMetaSnapshot) -> Self {
        Self { snapshot }
    }
}

impl IdentifierChecker for DatabaseIdentifierChecker<'_> {
    fn is_unique(&self, candidate: &str) -> bool {
        !self.snapshot.database_identifier_in_use(candidate)
    }
}

/// Uniqueness scope for doc-part and index identifiers (database-wide).
pub struct TableIdentifierChecker<'a> {
    database: &'a MutableMetaDatabase,
}

impl<'a> TableIdentifierChecker<'a> {
    /// Create a checker over one database's batch view.
    #[must_use]
    pub const fn new(database: &'a MutableMetaDatabase) -> Self {
        Self { database }
    }
}

impl IdentifierChecker for TableIdentifierChecker<'_> {
    fn is_unique(&self, candidate: &str) -> bool {
        !self.database.table_identifier_in_use(candidate)
    }
}

/// Uniqueness scope for field and scalar identifiers (doc-part-wide).
pub struct FieldIdentifierChecker<'a> {
    doc_part: &'a MutableMetaDocPart,
}

impl<'a> FieldIdentifierChecker<'a> {
    /// Create a checker over one doc part's batch view.
    #[must_use]
    pub const fn new(doc_part: &'a MutableMetaDocPart) -> Self {
        Self { doc_part }
    }
}

impl IdentifierChecker for FieldIdentifierChecker<'_> {
    fn is_unique(&self, candidate: &str) -> bool {
        !self.doc_part.column_identifier_in_use(candidate)
    }
}

#[cfg(test)]
mod tests {
    use docrel_types::FieldType;

    use super::*;

    fn ident(s: &str) -> Identifier {
        Identifier::new(s)
    }

    fn snapshot_with_orders() -> MetaSnapshot {
        let root = TableRef::root();
        let mut dp = MetaDocPart::new(Arc::clone(&root), ident("orders"));
        dp.insert_field(MetaField::new("a", ident("a_i"), FieldType::Integer));
        let mut col = MetaCollection::new("orders", ident("orders"));
        col.insert_doc_part(dp);
        let mut db = MetaDatabase::new("shop", ident("shop"));
        db.insert_collection(col);
        let mut snapshot = MetaSnapshot::empty();
        snapshot.insert_database(db);
        snapshot
    }

    #[test]
    fn touch_materializes_snapshot_copy_once() {
        let snapshot = Arc::new(snapshot_with_orders());
        let mut overlay = MutableMetaSnapshot::new(Arc::clone(&snapshot));

        let db = overlay.touch_database("shop").unwrap();
        let col = db.touch_collection("orders").unwrap();
        let dp = col.touch_doc_part(&TableRef::root()).unwrap();
        assert!(!dp.is_created_on_batch());
        assert!(dp.field("a", FieldType::Integer).is_some());

        // Missing entities are not materialized.
        assert!(db.touch_collection("missing").is_none());
        assert!(overlay.touch_database("missing").is_none());
    }

    #[test]
    fn batch_provenance_tracks_additions_only() {
        let snapshot = Arc::new(snapshot_with_orders());
        let mut overlay = MutableMetaSnapshot::new(snapshot);
        let db = overlay.touch_database("shop").unwrap();
        let col = db.touch_collection("orders").unwrap();
        let dp = col.touch_doc_part(&TableRef::root()).unwrap();

        assert!(!dp.has_batch_changes());
        dp.add_field(MetaField::new("b", ident("b_s"), FieldType::String));
        dp.add_scalar(MetaScalar::new(ident("v_i"), FieldType::Integer));

        assert!(dp.has_batch_changes());
        let added: Vec<&str> = dp.fields_added_on_batch().map(MetaField::name).collect();
        assert_eq!(added, vec!["b"]);
        assert_eq!(dp.scalars_added_on_batch().count(), 1);
        // The pre-existing field is visible but not reported as added.
        assert!(dp.field("a", FieldType::Integer).is_some());
    }

    #[test]
    fn commit_folds_additions_into_new_snapshot() {
        let snapshot = Arc::new(snapshot_with_orders());
        let mut overlay = MutableMetaSnapshot::new(Arc::clone(&snapshot));
        {
            let db = overlay.touch_database("shop").unwrap();
            let col = db.touch_collection("orders").unwrap();
            let child = TableRef::child(&TableRef::root(), "b");
            col.add_doc_part(Arc::clone(&child), ident("orders_b"));
        }
        let folded = overlay.commit();

        let col = folded.database("shop").unwrap().collection("orders").unwrap();
        let probe = TableRef::child(&TableRef::root(), "b");
        assert!(col.doc_part(&probe).is_some());
        // The original snapshot is untouched.
        assert!(
            snapshot
                .database("shop")
                .unwrap()
                .collection("orders")
                .unwrap()
                .doc_part(&probe)
                .is_none()
        );
    }

    #[test]
    fn identifier_scopes() {
        let snapshot = Arc::new(snapshot_with_orders());
        let mut overlay = MutableMetaSnapshot::new(snapshot);

        assert!(!DatabaseIdentifierChecker::new(&overlay).is_unique("shop"));
        assert!(DatabaseIdentifierChecker::new(&overlay).is_unique("other"));

        let db = overlay.touch_database("shop").unwrap();
        {
            let checker = TableIdentifierChecker::new(db);
            assert!(!checker.is_unique("orders"));
            assert!(checker.is_unique("orders_b"));
        }

        let col = db.touch_collection("orders").unwrap();
        let dp = col.touch_doc_part(&TableRef::root()).unwrap();
        let checker = FieldIdentifierChecker::new(dp);
        assert!(!checker.is_unique("a_i"));
        assert!(checker.is_unique("a_s"));
    }
}
