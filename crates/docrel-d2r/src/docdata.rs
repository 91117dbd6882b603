//! In-memory row accumulators.
//!
//! One [`DocPartData`] per doc part touched by a translation batch, grouped
//! into a [`CollectionData`]. Rows hold their values positionally against
//! the doc part's column layout; columns appear lazily as the batch first
//! writes them, and rows created before a column simply read as absent for
//! it. The whole structure is created fresh per batch and consumed exactly
//! once by the job planner.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use docrel_types::{DocValue, FieldType, Identifier, RowId, SeqIdx, TableRef};

/// Layout entry for one named, typed column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldColumn {
    name: String,
    field_type: FieldType,
    identifier: Identifier,
}

impl FieldColumn {
    /// Logical field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column type.
    #[must_use]
    pub const fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Physical column identifier.
    #[must_use]
    pub const fn identifier(&self) -> &Identifier {
        &self.identifier
    }
}

/// Layout entry for one type-indexed scalar column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarColumn {
    field_type: FieldType,
    identifier: Identifier,
}

impl ScalarColumn {
    /// Column type.
    #[must_use]
    pub const fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Physical column identifier.
    #[must_use]
    pub const fn identifier(&self) -> &Identifier {
        &self.identifier
    }
}

/// One logical row of a doc-part table.
#[derive(Debug, Clone, PartialEq)]
pub struct DocPartRow {
    did: RowId,
    rid: RowId,
    pid: Option<RowId>,
    seq: Option<SeqIdx>,
    field_values: Vec<Option<DocValue>>,
    scalar_values: Vec<Option<DocValue>>,
}

impl DocPartRow {
    fn new(did: RowId, rid: RowId, pid: Option<RowId>, seq: Option<SeqIdx>) -> Self {
        Self {
            did,
            rid,
            pid,
            seq,
            field_values: Vec::new(),
            scalar_values: Vec::new(),
        }
    }

    /// Root document id this row belongs to.
    #[must_use]
    pub const fn did(&self) -> RowId {
        self.did
    }

    /// This row's own id.
    #[must_use]
    pub const fn rid(&self) -> RowId {
        self.rid
    }

    /// Id of the parent row, absent on root rows.
    #[must_use]
    pub const fn pid(&self) -> Option<RowId> {
        self.pid
    }

    /// Array position, present exactly on array-element rows.
    #[must_use]
    pub const fn seq(&self) -> Option<SeqIdx> {
        self.seq
    }

    /// Value under field column `index`, absent when the row predates the
    /// column or never wrote it.
    #[must_use]
    pub fn field_value(&self, index: usize) -> Option<&DocValue> {
        self.field_values.get(index).and_then(Option::as_ref)
    }

    /// Value under scalar column `index`.
    #[must_use]
    pub fn scalar_value(&self, index: usize) -> Option<&DocValue> {
        self.scalar_values.get(index).and_then(Option::as_ref)
    }

    fn set_field(&mut self, index: usize, value: DocValue) {
        if self.field_values.len() <= index {
            self.field_values.resize(index + 1, None);
        }
        self.field_values[index] = Some(value);
    }

    fn set_scalar(&mut self, index: usize, value: DocValue) {
        if self.scalar_values.len() <= index {
            self.scalar_values.resize(index + 1, None);
        }
        self.scalar_values[index] = Some(value);
    }
}

/// Accumulated rows and column layout of one doc part.
#[derive(Debug, Clone, PartialEq)]
pub struct DocPartData {
    table_ref: Arc<TableRef>,
    identifier: Identifier,
    field_columns: Vec<FieldColumn>,
    field_index: HashMap<(String, FieldType), usize>,
    scalar_columns: Vec<ScalarColumn>,
    scalar_index: HashMap<FieldType, usize>,
    rows: Vec<DocPartRow>,
}

impl DocPartData {
    /// Create an empty accumulator for one doc part.
    #[must_use]
    pub fn new(table_ref: Arc<TableRef>, identifier: Identifier) -> Self {
        Self {
            table_ref,
            identifier,
            field_columns: Vec::new(),
            field_index: HashMap::new(),
            scalar_columns: Vec::new(),
            scalar_index: HashMap::new(),
            rows: Vec::new(),
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

    /// Number of accumulated rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of field columns the batch has written.
    #[must_use]
    pub fn field_columns_count(&self) -> usize {
        self.field_columns.len()
    }

    /// Number of scalar columns the batch has written.
    #[must_use]
    pub fn scalar_columns_count(&self) -> usize {
        self.scalar_columns.len()
    }

    /// Rows in insertion order.
    pub fn rows(&self) -> impl Iterator<Item = &DocPartRow> {
        self.rows.iter()
    }

    /// Field column layout, in first-written order.
    #[must_use]
    pub fn field_columns(&self) -> &[FieldColumn] {
        &self.field_columns
    }

    /// Scalar column layout, in first-written order.
    #[must_use]
    pub fn scalar_columns(&self) -> &[ScalarColumn] {
        &self.scalar_columns
    }

    /// Position of a field column, if the batch has written it.
    #[must_use]
    pub fn field_column_index(&self, name: &str, field_type: FieldType) -> Option<usize> {
        self.field_index.get(&(name.to_owned(), field_type)).copied()
    }

    /// Position of a scalar column, if the batch has written it.
    #[must_use]
    pub fn scalar_column_index(&self, field_type: FieldType) -> Option<usize> {
        self.scalar_index.get(&field_type).copied()
    }

    /// Append a row and return its position.
    pub fn append_row(
        &mut self,
        did: RowId,
        rid: RowId,
        pid: Option<RowId>,
        seq: Option<SeqIdx>,
    ) -> usize {
        self.rows.push(DocPartRow::new(did, rid, pid, seq));
        self.rows.len() - 1
    }

    /// Get or register the field column, returning its position.
    pub fn ensure_field_column(
        &mut self,
        name: &str,
        field_type: FieldType,
        identifier: &Identifier,
    ) -> usize {
        let key = (name.to_owned(), field_type);
        if let Some(&index) = self.field_index.get(&key) {
            return index;
        }
        self.field_columns.push(FieldColumn {
            name: name.to_owned(),
            field_type,
            identifier: identifier.clone(),
        });
        let index = self.field_columns.len() - 1;
        self.field_index.insert(key, index);
        index
    }

    /// Get or register the scalar column, returning its position.
    pub fn ensure_scalar_column(&mut self, field_type: FieldType, identifier: &Identifier) -> usize {
        if let Some(&index) = self.scalar_index.get(&field_type) {
            return index;
        }
        self.scalar_columns.push(ScalarColumn {
            field_type,
            identifier: identifier.clone(),
        });
        let index = self.scalar_columns.len() - 1;
        self.scalar_index.insert(field_type, index);
        index
    }

    /// Write a field value on a row.
    pub fn set_field_value(&mut self, row: usize, column: usize, value: DocValue) {
        self.rows[row].set_field(column, value);
    }

    /// Write a scalar value on a row.
    pub fn set_scalar_value(&mut self, row: usize, column: usize, value: DocValue) {
        self.rows[row].set_scalar(column, value);
    }
}

/// All rows a translation batch produced for one collection, one
/// [`DocPartData`] per touched doc part, iterated parents-first.
#[derive(Debug, Default)]
pub struct CollectionData {
    doc_parts: BTreeMap<Arc<TableRef>, DocPartData>,
}

impl CollectionData {
    /// Create an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the batch produced no rows at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.doc_parts.values().all(|dp| dp.row_count() == 0)
    }

    /// Number of touched doc parts.
    #[must_use]
    pub fn doc_part_count(&self) -> usize {
        self.doc_parts.len()
    }

    /// The accumulator of one doc part.
    #[must_use]
    pub fn doc_part(&self, table_ref: &TableRef) -> Option<&DocPartData> {
        self.doc_parts.get(table_ref)
    }

    /// Touched doc parts, ancestors before descendants.
    pub fn doc_parts(&self) -> impl Iterator<Item = &DocPartData> {
        self.doc_parts.values()
    }

    /// Get or create the accumulator of one doc part.
    pub fn get_or_create(
        &mut self,
        table_ref: &Arc<TableRef>,
        identifier: &Identifier,
    ) -> &mut DocPartData {
        self.doc_parts
            .entry(Arc::clone(table_ref))
            .or_insert_with(|| DocPartData::new(Arc::clone(table_ref), identifier.clone()))
    }

    /// The accumulator of one doc part, mutably.
    #[must_use]
    pub fn doc_part_mut(&mut self, table_ref: &TableRef) -> Option<&mut DocPartData> {
        self.doc_parts.get_mut(table_ref)
    }
}

impl IntoIterator for CollectionData {
    type Item = (Arc<TableRef>, DocPartData);
    type IntoIter = std::collections::btree_map::IntoIter<Arc<TableRef>, DocPartData>;

    /// Consume into (table ref, data) pairs, ancestors before descendants.
    fn into_iter(self) -> Self::IntoIter {
        self.doc_parts.into_iter()
    }
}
