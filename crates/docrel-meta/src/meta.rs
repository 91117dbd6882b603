//! The immutable metadata snapshot tree.
//!
//! Every entity carries a logical `name` (user-visible, renameable) and a
//! physical `identifier` (backend-safe, generated once, immutable).
//! Identifier uniqueness scopes: doc-part and index identifiers are unique
//! database-wide, field and scalar identifiers doc-part-wide.
//!
//! A snapshot is read-only and shared (`Arc`) across concurrent batches;
//! additions go through the overlays in [`crate::mutable`] and are folded
//! into a new snapshot at batch commit.

use std::collections::HashMap;
use std::sync::Arc;

use docrel_types::{FieldType, Identifier, TableRef};

/// A named, typed column of a doc part.
///
/// The same logical `name` may appear once per [`FieldType`]; heterogeneous
/// documents store each type in its own column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaField {
    name: String,
    identifier: Identifier,
    field_type: FieldType,
}

impl MetaField {
    /// Create a field column entry.
    #[must_use]
    pub fn new(name: impl Into<String>, identifier: Identifier, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            identifier,
            field_type,
        }
    }

    /// Logical field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Physical column identifier.
    #[must_use]
    pub const fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// Column type.
    #[must_use]
    pub const fn field_type(&self) -> FieldType {
        self.field_type
    }
}

/// A type-indexed generic column holding array-element values of one type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaScalar {
    identifier: Identifier,
    field_type: FieldType,
}

impl MetaScalar {
    /// Create a scalar column entry.
    #[must_use]
    pub const fn new(identifier: Identifier, field_type: FieldType) -> Self {
        Self {
            identifier,
            field_type,
        }
    }

    /// Physical column identifier.
    #[must_use]
    pub const fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// Column type.
    #[must_use]
    pub const fn field_type(&self) -> FieldType {
        self.field_type
    }
}

/// One column of an index definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaIndexColumn {
    table_ref: Arc<TableRef>,
    name: String,
    field_type: FieldType,
}

impl MetaIndexColumn {
    /// Create an index column entry.
    #[must_use]
    pub fn new(table_ref: Arc<TableRef>, name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            table_ref,
            name: name.into(),
            field_type,
        }
    }

    /// Doc part the indexed field lives in.
    #[must_use]
    pub const fn table_ref(&self) -> &Arc<TableRef> {
        &self.table_ref
    }

    /// Logical field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Indexed column type.
    #[must_use]
    pub const fn field_type(&self) -> FieldType {
        self.field_type
    }
}

/// A secondary index over one or more doc-part fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaIndex {
    name: String,
    identifier: Identifier,
    unique: bool,
    columns: Vec<MetaIndexColumn>,
}

impl MetaIndex {
    /// Create an index entry.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        identifier: Identifier,
        unique: bool,
        columns: Vec<MetaIndexColumn>,
    ) -> Self {
        Self {
            name: name.into(),
            identifier,
            unique,
            columns,
        }
    }

    /// Logical index name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Physical index identifier.
    #[must_use]
    pub const fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// Whether the index enforces uniqueness.
    #[must_use]
    pub const fn is_unique(&self) -> bool {
        self.unique
    }

    /// Indexed columns, in index order.
    #[must_use]
    pub fn columns(&self) -> &[MetaIndexColumn] {
        &self.columns
    }
}

/// One flat table of the relational image of a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaDocPart {
    table_ref: Arc<TableRef>,
    identifier: Identifier,
    fields: HashMap<(String, FieldType), MetaField>,
    scalars: HashMap<FieldType, MetaScalar>,
}

impl MetaDocPart {
    /// Create an empty doc part.
    #[must_use]
    pub fn new(table_ref: Arc<TableRef>, identifier: Identifier) -> Self {
        Self {
            table_ref,
            identifier,
            fields: HashMap::new(),
            scalars: HashMap::new(),
        }
    }

    /// Position of this table in the document structure.
    #[must_use]
    pub const fn table_ref(&self) -> &Arc<TableRef> {
        &self.table_ref
    }

    /// Physical table identifier.
    #[must_use]
    pub const fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// Look up a field column by logical name and type.
    #[must_use]
    pub fn field(&self, name: &str, field_type: FieldType) -> Option<&MetaField> {
        self.fields.get(&(name.to_owned(), field_type))
    }

    /// All field columns, in no particular order.
    pub fn fields(&self) -> impl Iterator<Item = &MetaField> {
        self.fields.values()
    }

    /// Look up a scalar column by type.
    #[must_use]
    pub fn scalar(&self, field_type: FieldType) -> Option<&MetaScalar> {
        self.scalars.get(&field_type)
    }

    /// All scalar columns.
    pub fn scalars(&self) -> impl Iterator<Item = &MetaScalar> {
        self.scalars.values()
    }

    /// Register a field column. Snapshot-construction API, used by
    /// persistence layers and the overlay fold.
    pub fn insert_field(&mut self, field: MetaField) {
        self.fields
            .insert((field.name().to_owned(), field.field_type()), field);
    }

    /// Register a scalar column.
    pub fn insert_scalar(&mut self, scalar: MetaScalar) {
        self.scalars.insert(scalar.field_type(), scalar);
    }
}

/// The relational image of one document collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaCollection {
    name: String,
    identifier: Identifier,
    doc_parts: HashMap<Arc<TableRef>, MetaDocPart>,
    indexes: HashMap<String, MetaIndex>,
}

impl MetaCollection {
    /// Create an empty collection.
    #[must_use]
    pub fn new(name: impl Into<String>, identifier: Identifier) -> Self {
        Self {
            name: name.into(),
            identifier,
            doc_parts: HashMap::new(),
            indexes: HashMap::new(),
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

    /// Look up a doc part by table ref.
    #[must_use]
    pub fn doc_part(&self, table_ref: &TableRef) -> Option<&MetaDocPart> {
        self.doc_parts.get(table_ref)
    }

    /// All doc parts, in no particular order.
    pub fn doc_parts(&self) -> impl Iterator<Item = &MetaDocPart> {
        self.doc_parts.values()
    }

    /// Look up an index by logical name.
    #[must_use]
    pub fn index(&self, name: &str) -> Option<&MetaIndex> {
        self.indexes.get(name)
    }

    /// All indexes.
    pub fn indexes(&self) -> impl Iterator<Item = &MetaIndex> {
        self.indexes.values()
    }

    /// Register a doc part. Snapshot-construction API.
    pub fn insert_doc_part(&mut self, doc_part: MetaDocPart) {
        self.doc_parts
            .insert(Arc::clone(doc_part.table_ref()), doc_part);
    }

    /// Register an index. Snapshot-construction API.
    pub fn insert_index(&mut self, index: MetaIndex) {
        self.indexes.insert(index.name().to_owned(), index);
    }
}

/// One database of the metadata tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaDatabase {
    name: String,
    identifier: Identifier,
    collections: HashMap<String, MetaCollection>,
}

impl MetaDatabase {
    /// Create an empty database.
    #[must_use]
    pub fn new(name: impl Into<String>, identifier: Identifier) -> Self {
        Self {
            name: name.into(),
            identifier,
            collections: HashMap::new(),
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

    /// Look up a collection by logical name.
    #[must_use]
    pub fn collection(&self, name: &str) -> Option<&MetaCollection> {
        self.collections.get(name)
    }

    /// All collections.
    pub fn collections(&self) -> impl Iterator<Item = &MetaCollection> {
        self.collections.values()
    }

    /// Register a collection. Snapshot-construction API.
    pub fn insert_collection(&mut self, collection: MetaCollection) {
        self.collections
            .insert(collection.name().to_owned(), collection);
    }
}

/// The root of an immutable metadata snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaSnapshot {
    databases: HashMap<String, MetaDatabase>,
}

impl MetaSnapshot {
    /// A snapshot with no databases.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Look up a database by logical name.
    #[must_use]
    pub fn database(&self, name: &str) -> Option<&MetaDatabase> {
        self.databases.get(name)
    }

    /// All databases.
    pub fn databases(&self) -> impl Iterator<Item = &MetaDatabase> {
        self.databases.values()
    }

    /// Register a database. Snapshot-construction API.
    pub fn insert_database(&mut self, database: MetaDatabase) {
        self.databases
            .insert(database.name().to_owned(), database);
    }
}
