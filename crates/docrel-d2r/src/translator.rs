//! The document-to-relational translator.
//!
//! One translator instance serves one batch against one collection. Each
//! document becomes one row per nesting level it touches: scalars land in
//! named, typed columns; subdocuments and arrays continue in child doc
//! parts linked by parent row id, with array elements carrying their
//! position in a `seq` column. Every schema addition is staged on the
//! batch's metadata overlay with created-on-batch provenance so the job
//! planner knows which DDL must precede the inserts.

use std::sync::Arc;

use docrel_error::{DocRelError, Result};
use docrel_meta::{
    ChainConverter, FieldIdentifierChecker, MutableMetaDatabase, NameChain,
    TableIdentifierChecker, UniqueIdentifierGenerator,
};
use docrel_meta::{MetaField, MetaScalar};
use docrel_types::{DocValue, FieldType, Identifier, RowId, SeqIdx, TableRef};
use tracing::debug;

use crate::docdata::CollectionData;
use crate::rid::ReservedIdGenerator;

/// Name-chain component for scalar columns; the type mangle makes each
/// scalar column identifier unique within its doc part.
const SCALAR_COLUMN_STEM: &str = "v";

/// Translation policy knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslatorConfig {
    /// Array elements whose index is below this threshold are stored in
    /// per-index named columns; elements at or beyond it go to the doc
    /// part's type-indexed scalar columns. The default of 0 sends every
    /// element to scalar columns, which keeps column count independent of
    /// array length.
    pub scalar_array_threshold: usize,
    /// Maximum document nesting depth accepted before translation fails
    /// with a user-facing error.
    pub max_depth: u32,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            scalar_array_threshold: 0,
            max_depth: 128,
        }
    }
}

/// Translates documents of one collection into accumulated row data.
pub struct D2RTranslator<'a, C: ChainConverter> {
    rid_generator: &'a ReservedIdGenerator,
    id_generator: &'a mut UniqueIdentifierGenerator<C>,
    database: &'a mut MutableMetaDatabase,
    database_name: String,
    collection_name: String,
    config: TranslatorConfig,
    data: CollectionData,
}

impl<'a, C: ChainConverter> D2RTranslator<'a, C> {
    /// Create a translator for one batch, staging the collection itself if
    /// this batch is the first to see it.
    pub fn new(
        rid_generator: &'a ReservedIdGenerator,
        id_generator: &'a mut UniqueIdentifierGenerator<C>,
        database: &'a mut MutableMetaDatabase,
        collection_name: impl Into<String>,
        config: TranslatorConfig,
    ) -> Result<Self> {
        let collection_name = collection_name.into();
        if database.touch_collection(&collection_name).is_none() {
            let identifier = {
                let checker = TableIdentifierChecker::new(database);
                id_generator
                    .generate_unique_identifier(&NameChain::of([collection_name.clone()]), &checker)?
            };
            database.add_collection(collection_name.clone(), identifier);
        }
        let database_name = database.name().to_owned();
        Ok(Self {
            rid_generator,
            id_generator,
            database,
            database_name,
            collection_name,
            config,
            data: CollectionData::new(),
        })
    }

    /// Translate one document into the batch.
    pub fn translate(&mut self, doc: &DocValue) -> Result<()> {
        let Some(fields) = doc.as_document() else {
            return Err(DocRelError::translation(
                &self.database_name,
                &self.collection_name,
                None,
                format!("the root value must be a document, got {}", doc.type_name()),
            ));
        };

        let root = TableRef::root();
        self.ensure_doc_part(&root)?;
        let did = self.next_rid(&root)?;
        let row = self.append_row(&root, did, did, None, None);
        debug!(
            database = %self.database_name,
            collection = %self.collection_name,
            did = %did,
            "translating document"
        );
        self.translate_object_fields(&root, row, did, did, fields, 1)
    }

    /// The accumulated per-doc-part row data, consumed by the job planner.
    #[must_use]
    pub fn into_collection_data(self) -> CollectionData {
        self.data
    }

    fn translate_object_fields(
        &mut self,
        table_ref: &Arc<TableRef>,
        row: usize,
        did: RowId,
        parent_rid: RowId,
        fields: &[(String, DocValue)],
        depth: u32,
    ) -> Result<()> {
        if depth > self.config.max_depth {
            return Err(DocRelError::DepthExceeded {
                max: self.config.max_depth,
            });
        }
        for (name, value) in fields {
            match value {
                DocValue::Document(child_fields) => {
                    // The parent keeps a reference column; false = document.
                    self.write_field(table_ref, row, name, FieldType::Child, DocValue::Boolean(false))?;
                    let child_ref = TableRef::child(table_ref, name.clone());
                    self.ensure_doc_part(&child_ref)?;
                    let rid = self.next_rid(&child_ref)?;
                    let child_row =
                        self.append_row(&child_ref, did, rid, Some(parent_rid), None);
                    self.translate_object_fields(
                        &child_ref,
                        child_row,
                        did,
                        rid,
                        child_fields,
                        depth + 1,
                    )?;
                }
                DocValue::Array(elements) => {
                    self.write_field(table_ref, row, name, FieldType::Child, DocValue::Boolean(true))?;
                    let child_ref = TableRef::child(table_ref, name.clone());
                    self.ensure_doc_part(&child_ref)?;
                    self.translate_array_elements(
                        &child_ref,
                        did,
                        parent_rid,
                        elements,
                        1,
                        depth + 1,
                    )?;
                }
                scalar => {
                    self.write_field(table_ref, row, name, FieldType::of(scalar), scalar.clone())?;
                }
            }
        }
        Ok(())
    }

    /// Translate the elements of one array into rows of `table_ref`.
    /// `dimension` is the array-nesting dimension this table holds;
    /// arrays nested inside these elements continue in the
    /// `array_child(table_ref, dimension + 1)` doc part.
    fn translate_array_elements(
        &mut self,
        table_ref: &Arc<TableRef>,
        did: RowId,
        pid: RowId,
        elements: &[DocValue],
        dimension: u32,
        depth: u32,
    ) -> Result<()> {
        if depth > self.config.max_depth {
            return Err(DocRelError::DepthExceeded {
                max: self.config.max_depth,
            });
        }
        for (index, element) in elements.iter().enumerate() {
            let seq = SeqIdx::new(i32::try_from(index).map_err(|_| {
                DocRelError::translation(
                    &self.database_name,
                    &self.collection_name,
                    None,
                    "array has more elements than a sequence column can address",
                )
            })?);
            let rid = self.next_rid(table_ref)?;
            let row = self.append_row(table_ref, did, rid, Some(pid), Some(seq));
            match element {
                DocValue::Document(fields) => {
                    self.translate_object_fields(table_ref, row, did, rid, fields, depth + 1)?;
                }
                DocValue::Array(inner) => {
                    self.write_scalar(table_ref, row, FieldType::Child, DocValue::Boolean(true))?;
                    let child_ref = TableRef::array_child(table_ref, dimension + 1);
                    self.ensure_doc_part(&child_ref)?;
                    self.translate_array_elements(
                        &child_ref,
                        did,
                        rid,
                        inner,
                        dimension + 1,
                        depth + 1,
                    )?;
                }
                scalar => {
                    if index < self.config.scalar_array_threshold {
                        self.write_field(
                            table_ref,
                            row,
                            &index.to_string(),
                            FieldType::of(scalar),
                            scalar.clone(),
                        )?;
                    } else {
                        self.write_scalar(table_ref, row, FieldType::of(scalar), scalar.clone())?;
                    }
                }
            }
        }
        Ok(())
    }

    // -- metadata/bookkeeping helpers --------------------------------------

    /// Make sure the doc part exists in the batch's metadata view and the
    /// data accumulator.
    fn ensure_doc_part(&mut self, table_ref: &Arc<TableRef>) -> Result<()> {
        let exists = {
            let collection = self
                .database
                .touch_collection(&self.collection_name)
                .expect("collection ensured at construction");
            collection.touch_doc_part(table_ref).is_some()
        };
        if !exists {
            let identifier = {
                let mut chain = NameChain::of([self.collection_name.clone()]);
                for component in table_ref.path_components() {
                    chain.push(component);
                }
                let checker = TableIdentifierChecker::new(self.database);
                self.id_generator
                    .generate_unique_identifier(&chain, &checker)?
            };
            let collection = self
                .database
                .touch_collection(&self.collection_name)
                .expect("collection ensured at construction");
            collection.add_doc_part(Arc::clone(table_ref), identifier);
        }

        let identifier = self.doc_part_identifier(table_ref);
        self.data.get_or_create(table_ref, &identifier);
        Ok(())
    }

    /// Resolve or stage the field column and return its identifier.
    fn ensure_field(
        &mut self,
        table_ref: &Arc<TableRef>,
        name: &str,
        field_type: FieldType,
    ) -> Result<Identifier> {
        if let Some(found) = self
            .database
            .touched_collection(&self.collection_name)
            .and_then(|c| c.touched_doc_part(table_ref))
            .and_then(|dp| dp.field(name, field_type))
        {
            return Ok(found.identifier().clone());
        }

        let identifier = {
            let doc_part = self
                .database
                .touched_collection(&self.collection_name)
                .and_then(|c| c.touched_doc_part(table_ref))
                .expect("doc part ensured before field access");
            let checker = FieldIdentifierChecker::new(doc_part);
            self.id_generator.generate_unique_with_suffix(
                &NameChain::of([name]),
                field_type.identifier_mangle(),
                &checker,
            )?
        };

        let doc_part = self
            .database
            .touch_collection(&self.collection_name)
            .and_then(|c| c.touch_doc_part(table_ref))
            .expect("doc part ensured before field access");
        doc_part.add_field(MetaField::new(name, identifier.clone(), field_type));
        Ok(identifier)
    }

    /// Resolve or stage the scalar column and return its identifier.
    fn ensure_scalar(
        &mut self,
        table_ref: &Arc<TableRef>,
        field_type: FieldType,
    ) -> Result<Identifier> {
        if let Some(found) = self
            .database
            .touched_collection(&self.collection_name)
            .and_then(|c| c.touched_doc_part(table_ref))
            .and_then(|dp| dp.scalar(field_type))
        {
            return Ok(found.identifier().clone());
        }

        let identifier = {
            let doc_part = self
                .database
                .touched_collection(&self.collection_name)
                .and_then(|c| c.touched_doc_part(table_ref))
                .expect("doc part ensured before scalar access");
            let checker = FieldIdentifierChecker::new(doc_part);
            self.id_generator.generate_unique_with_suffix(
                &NameChain::of([SCALAR_COLUMN_STEM]),
                field_type.identifier_mangle(),
                &checker,
            )?
        };

        let doc_part = self
            .database
            .touch_collection(&self.collection_name)
            .and_then(|c| c.touch_doc_part(table_ref))
            .expect("doc part ensured before scalar access");
        doc_part.add_scalar(MetaScalar::new(identifier.clone(), field_type));
        Ok(identifier)
    }

    fn write_field(
        &mut self,
        table_ref: &Arc<TableRef>,
        row: usize,
        name: &str,
        field_type: FieldType,
        value: DocValue,
    ) -> Result<()> {
        let identifier = self.ensure_field(table_ref, name, field_type)?;
        let doc_part = self
            .data
            .doc_part_mut(table_ref)
            .expect("data accumulator ensured with doc part");
        let column = doc_part.ensure_field_column(name, field_type, &identifier);
        doc_part.set_field_value(row, column, value);
        Ok(())
    }

    fn write_scalar(
        &mut self,
        table_ref: &Arc<TableRef>,
        row: usize,
        field_type: FieldType,
        value: DocValue,
    ) -> Result<()> {
        let identifier = self.ensure_scalar(table_ref, field_type)?;
        let doc_part = self
            .data
            .doc_part_mut(table_ref)
            .expect("data accumulator ensured with doc part");
        let column = doc_part.ensure_scalar_column(field_type, &identifier);
        doc_part.set_scalar_value(row, column, value);
        Ok(())
    }

    fn append_row(
        &mut self,
        table_ref: &Arc<TableRef>,
        did: RowId,
        rid: RowId,
        pid: Option<RowId>,
        seq: Option<SeqIdx>,
    ) -> usize {
        self.data
            .doc_part_mut(table_ref)
            .expect("data accumulator ensured with doc part")
            .append_row(did, rid, pid, seq)
    }

    fn next_rid(&self, table_ref: &Arc<TableRef>) -> Result<RowId> {
        self.rid_generator
            .next_rid(&self.database_name, &self.collection_name, table_ref)
    }

    fn doc_part_identifier(&self, table_ref: &Arc<TableRef>) -> Identifier {
        self.database
            .touched_collection(&self.collection_name)
            .and_then(|c| c.touched_doc_part(table_ref))
            .expect("doc part ensured before identifier lookup")
            .identifier()
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use docrel_meta::{
        MetaCollection, MetaDatabase, MetaDocPart, MetaSnapshot, MetaStore, MutableMetaSnapshot,
    };
    use docrel_types::Identifier;

    use super::*;
    use crate::docdata::DocPartRow;

    struct EmptyStore;

    impl MetaStore for EmptyStore {
        fn read_metadata_snapshot(&self) -> Result<MetaSnapshot> {
            Ok(MetaSnapshot::empty())
        }

        fn read_last_row_id_used(
            &self,
            _database: &MetaDatabase,
            _collection: &MetaCollection,
            _doc_part: &MetaDocPart,
        ) -> Result<RowId> {
            Ok(RowId::new(-1))
        }
    }

    fn loaded_rid_generator() -> ReservedIdGenerator {
        let generator = ReservedIdGenerator::new();
        generator.load(&MetaSnapshot::empty(), &EmptyStore).unwrap();
        generator
    }

    fn doc(json: serde_json::Value) -> DocValue {
        DocValue::from_json(json)
    }

    /// Translate `docs` into a fresh overlay and return the data plus the
    /// folded overlay for metadata assertions.
    fn translate_all(
        docs: &[DocValue],
        config: TranslatorConfig,
    ) -> (CollectionData, MutableMetaSnapshot) {
        let rid_generator = loaded_rid_generator();
        let mut id_generator = UniqueIdentifierGenerator::with_defaults();
        let mut overlay = MutableMetaSnapshot::new(Arc::new(MetaSnapshot::empty()));
        let database = overlay.add_database("shop", Identifier::new("shop"));
        let mut translator =
            D2RTranslator::new(&rid_generator, &mut id_generator, database, "orders", config)
                .unwrap();
        for d in docs {
            translator.translate(d).unwrap();
        }
        let data = translator.into_collection_data();
        (data, overlay)
    }

    #[test]
    fn root_must_be_a_document() {
        let rid_generator = loaded_rid_generator();
        let mut id_generator = UniqueIdentifierGenerator::with_defaults();
        let mut overlay = MutableMetaSnapshot::new(Arc::new(MetaSnapshot::empty()));
        let database = overlay.add_database("shop", Identifier::new("shop"));
        let mut translator = D2RTranslator::new(
            &rid_generator,
            &mut id_generator,
            database,
            "orders",
            TranslatorConfig::default(),
        )
        .unwrap();

        let err = translator.translate(&DocValue::Integer(3)).unwrap_err();
        assert!(matches!(err, DocRelError::Translation { .. }));
        assert!(err.is_user_error());
    }

    #[test]
    fn scalars_nested_documents_and_arrays() {
        let (data, _) = translate_all(
            &[doc(serde_json::json!({"a": 1, "b": {"c": "x"}, "d": [1, 2, 3]}))],
            TranslatorConfig::default(),
        );

        let root = TableRef::root();
        let root_data = data.doc_part(&root).unwrap();
        assert_eq!(root_data.row_count(), 1);
        let row = root_data.rows().next().unwrap();
        assert_eq!(row.did(), RowId::new(0));
        assert_eq!(row.rid(), RowId::new(0));
        assert_eq!(row.pid(), None);
        assert_eq!(row.seq(), None);

        let a = root_data
            .field_column_index("a", FieldType::Integer)
            .unwrap();
        assert_eq!(row.field_value(a), Some(&DocValue::Integer(1)));
        let b_ref = root_data.field_column_index("b", FieldType::Child).unwrap();
        assert_eq!(row.field_value(b_ref), Some(&DocValue::Boolean(false)));
        let d_ref = root_data.field_column_index("d", FieldType::Child).unwrap();
        assert_eq!(row.field_value(d_ref), Some(&DocValue::Boolean(true)));

        // Subdocument "b": one row linked to the root row.
        let b = TableRef::child(&root, "b");
        let b_data = data.doc_part(&b).unwrap();
        assert_eq!(b_data.row_count(), 1);
        let b_row = b_data.rows().next().unwrap();
        assert_eq!(b_row.did(), RowId::new(0));
        assert_eq!(b_row.pid(), Some(RowId::new(0)));
        assert_eq!(b_row.seq(), None);
        let c = b_data.field_column_index("c", FieldType::String).unwrap();
        assert_eq!(b_row.field_value(c), Some(&DocValue::String("x".into())));

        // Array "d": three ordered scalar rows.
        let d = TableRef::child(&root, "d");
        let d_data = data.doc_part(&d).unwrap();
        assert_eq!(d_data.row_count(), 3);
        assert_eq!(d_data.scalar_columns_count(), 1);
        let column = d_data.scalar_column_index(FieldType::Integer).unwrap();
        let elements: Vec<(i32, &DocValue)> = d_data
            .rows()
            .map(|r| (r.seq().unwrap().get(), r.scalar_value(column).unwrap()))
            .collect();
        assert_eq!(
            elements,
            vec![
                (0, &DocValue::Integer(1)),
                (1, &DocValue::Integer(2)),
                (2, &DocValue::Integer(3)),
            ]
        );
        for r in d_data.rows() {
            assert_eq!(r.pid(), Some(RowId::new(0)));
        }
    }

    #[test]
    fn type_conflicts_create_one_column_per_type() {
        let (data, overlay) = translate_all(
            &[
                doc(serde_json::json!({"a": 1})),
                doc(serde_json::json!({"a": "one"})),
            ],
            TranslatorConfig::default(),
        );

        let root = TableRef::root();
        let root_data = data.doc_part(&root).unwrap();
        assert_eq!(root_data.row_count(), 2);
        assert_eq!(root_data.field_columns_count(), 2);
        let int_col = root_data
            .field_column_index("a", FieldType::Integer)
            .unwrap();
        let str_col = root_data
            .field_column_index("a", FieldType::String)
            .unwrap();
        let rows: Vec<&DocPartRow> = root_data.rows().collect();
        assert_eq!(rows[0].field_value(int_col), Some(&DocValue::Integer(1)));
        assert_eq!(rows[0].field_value(str_col), None);
        assert_eq!(rows[1].field_value(int_col), None);
        assert_eq!(
            rows[1].field_value(str_col),
            Some(&DocValue::String("one".into()))
        );

        // Metadata carries both typed columns under the same logical name.
        let dp = overlay
            .touched_database("shop")
            .unwrap()
            .touched_collection("orders")
            .unwrap()
            .touched_doc_part(&root)
            .unwrap();
        assert!(dp.field("a", FieldType::Integer).is_some());
        assert!(dp.field("a", FieldType::String).is_some());
        assert_ne!(
            dp.field("a", FieldType::Integer).unwrap().identifier(),
            dp.field("a", FieldType::String).unwrap().identifier()
        );
    }

    #[test]
    fn nested_arrays_continue_in_dimension_tables() {
        let (data, _) = translate_all(
            &[doc(serde_json::json!({"m": [[10, 20], 7]}))],
            TranslatorConfig::default(),
        );

        let root = TableRef::root();
        let m = TableRef::child(&root, "m");
        let m2 = TableRef::array_child(&m, 2);

        let m_data = data.doc_part(&m).unwrap();
        assert_eq!(m_data.row_count(), 2);
        let child_marker = m_data.scalar_column_index(FieldType::Child).unwrap();
        let int_scalar = m_data.scalar_column_index(FieldType::Integer).unwrap();
        let rows: Vec<&DocPartRow> = m_data.rows().collect();
        // Element 0 is the inner array, element 1 the plain integer.
        assert_eq!(rows[0].seq(), Some(SeqIdx::new(0)));
        assert_eq!(rows[0].scalar_value(child_marker), Some(&DocValue::Boolean(true)));
        assert_eq!(rows[1].seq(), Some(SeqIdx::new(1)));
        assert_eq!(rows[1].scalar_value(int_scalar), Some(&DocValue::Integer(7)));

        let m2_data = data.doc_part(&m2).unwrap();
        assert_eq!(m2_data.row_count(), 2);
        for (i, r) in m2_data.rows().enumerate() {
            assert_eq!(r.seq(), Some(SeqIdx::new(i32::try_from(i).unwrap())));
            // Inner elements hang off the inner-array row, not the root.
            assert_eq!(r.pid(), Some(rows[0].rid()));
        }
    }

    #[test]
    fn array_documents_share_the_element_table() {
        let (data, _) = translate_all(
            &[doc(serde_json::json!({"items": [{"sku": "a"}, {"sku": "b"}]}))],
            TranslatorConfig::default(),
        );

        let items = TableRef::child(&TableRef::root(), "items");
        let items_data = data.doc_part(&items).unwrap();
        assert_eq!(items_data.row_count(), 2);
        let sku = items_data
            .field_column_index("sku", FieldType::String)
            .unwrap();
        let skus: Vec<&DocValue> = items_data
            .rows()
            .map(|r| r.field_value(sku).unwrap())
            .collect();
        assert_eq!(
            skus,
            vec![&DocValue::String("a".into()), &DocValue::String("b".into())]
        );
    }

    #[test]
    fn per_index_columns_below_threshold() {
        let (data, _) = translate_all(
            &[doc(serde_json::json!({"d": [1, 2, 3]}))],
            TranslatorConfig {
                scalar_array_threshold: 2,
                ..TranslatorConfig::default()
            },
        );

        let d = TableRef::child(&TableRef::root(), "d");
        let d_data = data.doc_part(&d).unwrap();
        assert_eq!(d_data.row_count(), 3);
        // Indexes 0 and 1 get named per-index columns, index 2 the scalar.
        assert!(d_data.field_column_index("0", FieldType::Integer).is_some());
        assert!(d_data.field_column_index("1", FieldType::Integer).is_some());
        assert!(d_data.field_column_index("2", FieldType::Integer).is_none());
        assert_eq!(d_data.scalar_columns_count(), 1);
    }

    #[test]
    fn batch_provenance_marks_new_doc_parts_and_fields() {
        let (_, overlay) = translate_all(
            &[doc(serde_json::json!({"a": 1, "b": {"c": "x"}}))],
            TranslatorConfig::default(),
        );

        let collection = overlay
            .touched_database("shop")
            .unwrap()
            .touched_collection("orders")
            .unwrap();
        assert!(collection.is_created_on_batch());

        let root_dp = collection.touched_doc_part(&TableRef::root()).unwrap();
        assert!(root_dp.is_created_on_batch());
        let mut added: Vec<&str> = root_dp.fields_added_on_batch().map(MetaField::name).collect();
        added.sort_unstable();
        assert_eq!(added, vec!["a", "b"]);

        let b = TableRef::child(&TableRef::root(), "b");
        let b_dp = collection.touched_doc_part(&b).unwrap();
        assert!(b_dp.is_created_on_batch());
    }

    #[test]
    fn depth_limit_is_a_user_error() {
        let nested = doc(serde_json::json!({"a": {"b": {"c": {"d": 1}}}}));
        let rid_generator = loaded_rid_generator();
        let mut id_generator = UniqueIdentifierGenerator::with_defaults();
        let mut overlay = MutableMetaSnapshot::new(Arc::new(MetaSnapshot::empty()));
        let database = overlay.add_database("shop", Identifier::new("shop"));
        let mut translator = D2RTranslator::new(
            &rid_generator,
            &mut id_generator,
            database,
            "orders",
            TranslatorConfig {
                max_depth: 2,
                ..TranslatorConfig::default()
            },
        )
        .unwrap();

        let err = translator.translate(&nested).unwrap_err();
        assert!(matches!(err, DocRelError::DepthExceeded { max: 2 }));
        assert!(err.is_user_error());
    }

    #[test]
    fn row_ids_are_per_doc_part() {
        let (data, _) = translate_all(
            &[
                doc(serde_json::json!({"b": {"x": 1}})),
                doc(serde_json::json!({"b": {"x": 2}})),
            ],
            TranslatorConfig::default(),
        );

        let root = TableRef::root();
        let b = TableRef::child(&root, "b");
        let root_rids: Vec<i64> = data
            .doc_part(&root)
            .unwrap()
            .rows()
            .map(|r| r.rid().get())
            .collect();
        let b_rids: Vec<i64> = data
            .doc_part(&b)
            .unwrap()
            .rows()
            .map(|r| r.rid().get())
            .collect();
        // Each doc part draws from its own counter, both starting at 0.
        assert_eq!(root_rids, vec![0, 1]);
        assert_eq!(b_rids, vec![0, 1]);
        // Child rows link to their own document's root row.
        let b_rows: Vec<(i64, i64)> = data
            .doc_part(&b)
            .unwrap()
            .rows()
            .map(|r| (r.did().get(), r.pid().unwrap().get()))
            .collect();
        assert_eq!(b_rows, vec![(0, 0), (1, 1)]);
    }
}
