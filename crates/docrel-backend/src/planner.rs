//! The batch job planner.
//!
//! Consumes one batch's [`CollectionData`] plus its metadata overlay and
//! produces the ordered job list. The binding invariant is per doc part:
//! its AddDocPart job (if the part is new) precedes its AddField/AddScalar
//! jobs, which precede its single Insert. Jobs of different doc parts may
//! interleave freely; the planner happens to emit ancestors first, which
//! also keeps parent tables ahead of their children.

use std::collections::HashSet;
use std::sync::Arc;

use docrel_d2r::CollectionData;
use docrel_error::{DocRelError, Result};
use docrel_meta::{MutableMetaCollection, MutableMetaDatabase, MutableMetaDocPart};
use docrel_types::TableRef;
use tracing::debug;

use crate::jobs::BackendJob;

/// Plan the job sequence for one translated batch.
///
/// `database` is the batch's metadata overlay; `collection_name` must have
/// been touched by the batch that produced `data`.
pub fn plan_batch(
    database: &MutableMetaDatabase,
    collection_name: &str,
    data: CollectionData,
) -> Result<Vec<BackendJob>> {
    let collection = database.touched_collection(collection_name).ok_or_else(|| {
        DocRelError::illegal_state(format!(
            "collection '{collection_name}' was not touched by the planned batch"
        ))
    })?;

    let mut jobs = Vec::new();
    if database.is_created_on_batch() {
        jobs.push(BackendJob::AddDatabase {
            database: database.name().to_owned(),
            identifier: database.identifier().clone(),
        });
    }
    if collection.is_created_on_batch() {
        jobs.push(BackendJob::AddCollection {
            database: database.name().to_owned(),
            collection: collection.name().to_owned(),
            identifier: collection.identifier().clone(),
        });
    }

    // Doc parts with accumulated rows, ancestors first.
    let mut planned: HashSet<Arc<TableRef>> = HashSet::new();
    for (table_ref, doc_part_data) in data {
        planned.insert(Arc::clone(&table_ref));
        if let Some(meta) = collection.touched_doc_part(&table_ref) {
            push_doc_part_ddl(&mut jobs, database.name(), collection, meta);
        }
        if doc_part_data.row_count() > 0 {
            jobs.push(BackendJob::Insert {
                database: database.name().to_owned(),
                collection: collection.name().to_owned(),
                data: doc_part_data,
            });
        }
    }

    // Doc parts the batch changed without producing rows (DDL only).
    for meta in collection.touched_doc_parts() {
        if !planned.contains(meta.table_ref()) && meta.has_batch_changes() {
            push_doc_part_ddl(&mut jobs, database.name(), collection, meta);
        }
    }

    for index in collection.indexes_added_on_batch() {
        jobs.push(BackendJob::CreateIndex {
            database: database.name().to_owned(),
            collection: collection.name().to_owned(),
            index: index.clone(),
        });
    }

    debug!(
        database = database.name(),
        collection = collection_name,
        jobs = jobs.len(),
        "batch planned"
    );
    Ok(jobs)
}

fn push_doc_part_ddl(
    jobs: &mut Vec<BackendJob>,
    database: &str,
    collection: &MutableMetaCollection,
    meta: &MutableMetaDocPart,
) {
    if meta.is_created_on_batch() {
        jobs.push(BackendJob::AddDocPart {
            database: database.to_owned(),
            collection: collection.name().to_owned(),
            table_ref: Arc::clone(meta.table_ref()),
            identifier: meta.identifier().clone(),
        });
    }
    for field in meta.fields_added_on_batch() {
        jobs.push(BackendJob::AddField {
            database: database.to_owned(),
            collection: collection.name().to_owned(),
            doc_part: meta.identifier().clone(),
            name: field.name().to_owned(),
            field_type: field.field_type(),
            identifier: field.identifier().clone(),
        });
    }
    for scalar in meta.scalars_added_on_batch() {
        jobs.push(BackendJob::AddScalar {
            database: database.to_owned(),
            collection: collection.name().to_owned(),
            doc_part: meta.identifier().clone(),
            field_type: scalar.field_type(),
            identifier: scalar.identifier().clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use docrel_meta::{
        MetaField, MetaIndex, MetaIndexColumn, MetaScalar, MetaSnapshot, MutableMetaSnapshot,
    };
    use docrel_types::{DocValue, FieldType, Identifier, RowId};

    use super::*;
    use crate::jobs::JobKind;

    fn ident(s: &str) -> Identifier {
        Identifier::new(s)
    }

    fn overlay_with_collection() -> MutableMetaSnapshot {
        let mut overlay = MutableMetaSnapshot::new(Arc::new(MetaSnapshot::empty()));
        let db = overlay.add_database("shop", ident("shop"));
        db.add_collection("orders", ident("orders"));
        overlay
    }

    #[test]
    fn new_doc_part_with_rows_orders_ddl_before_insert() {
        let mut overlay = overlay_with_collection();
        let root = TableRef::root();
        {
            let col = overlay
                .touched_database("shop")
                .unwrap()
                .touched_collection("orders")
                .unwrap();
            assert!(col.is_created_on_batch());
        }
        let db = overlay.touch_database("shop").unwrap();
        let col = db.touch_collection("orders").unwrap();
        let dp = col.add_doc_part(Arc::clone(&root), ident("orders_t"));
        dp.add_field(MetaField::new("a", ident("a_i"), FieldType::Integer));
        dp.add_scalar(MetaScalar::new(ident("v_l"), FieldType::Long));

        let mut data = CollectionData::new();
        let dp_data = data.get_or_create(&root, &ident("orders_t"));
        for rid in 0..3 {
            dp_data.append_row(RowId::new(rid), RowId::new(rid), None, None);
        }
        let a = dp_data.ensure_field_column("a", FieldType::Integer, &ident("a_i"));
        dp_data.set_field_value(0, a, DocValue::Integer(1));

        let db = overlay.touched_database("shop").unwrap();
        let jobs = plan_batch(db, "orders", data).unwrap();
        let kinds: Vec<JobKind> = jobs.iter().map(BackendJob::kind).collect();

        // The database and collection are both batch-created here.
        assert_eq!(
            kinds,
            vec![
                JobKind::AddDatabase,
                JobKind::AddCollection,
                JobKind::AddDocPart,
                JobKind::AddField,
                JobKind::AddScalar,
                JobKind::Insert,
            ]
        );
        let insert_index = kinds.iter().position(|k| *k == JobKind::Insert).unwrap();
        let doc_part_index = kinds.iter().position(|k| *k == JobKind::AddDocPart).unwrap();
        for (i, kind) in kinds.iter().enumerate() {
            if matches!(kind, JobKind::AddField | JobKind::AddScalar) {
                assert!(doc_part_index < i && i < insert_index);
            }
        }
        match &jobs[insert_index] {
            BackendJob::Insert { data, .. } => assert_eq!(data.row_count(), 3),
            other => panic!("expected insert, got {other}"),
        }
    }

    #[test]
    fn empty_batch_produces_no_doc_part_jobs() {
        let overlay = {
            // Collection exists in the committed snapshot, so nothing is
            // batch-created.
            let mut snapshot = MetaSnapshot::empty();
            let mut db = docrel_meta::MetaDatabase::new("shop", ident("shop"));
            db.insert_collection(docrel_meta::MetaCollection::new("orders", ident("orders")));
            snapshot.insert_database(db);
            let mut overlay = MutableMetaSnapshot::new(Arc::new(snapshot));
            overlay
                .touch_database("shop")
                .unwrap()
                .touch_collection("orders")
                .unwrap();
            overlay
        };

        let db = overlay.touched_database("shop").unwrap();
        let jobs = plan_batch(db, "orders", CollectionData::new()).unwrap();
        assert!(jobs.is_empty());
    }

    #[test]
    fn rowless_doc_part_without_changes_contributes_nothing() {
        let mut overlay = overlay_with_collection();
        let root = TableRef::root();
        {
            let db = overlay.touch_database("shop").unwrap();
            let col = db.touch_collection("orders").unwrap();
            col.add_doc_part(Arc::clone(&root), ident("orders_t"));
        }

        // The doc part is new (DDL expected) but has no rows: no insert.
        let mut data = CollectionData::new();
        data.get_or_create(&root, &ident("orders_t"));

        let db = overlay.touched_database("shop").unwrap();
        let jobs = plan_batch(db, "orders", data).unwrap();
        let kinds: Vec<JobKind> = jobs.iter().map(BackendJob::kind).collect();
        assert!(!kinds.contains(&JobKind::Insert));
        assert!(kinds.contains(&JobKind::AddDocPart));
    }

    #[test]
    fn parent_tables_are_planned_before_children() {
        let mut overlay = overlay_with_collection();
        let root = TableRef::root();
        let child = TableRef::child(&root, "b");
        {
            let db = overlay.touch_database("shop").unwrap();
            let col = db.touch_collection("orders").unwrap();
            col.add_doc_part(Arc::clone(&root), ident("orders_t"));
            col.add_doc_part(Arc::clone(&child), ident("orders_b"));
        }

        let mut data = CollectionData::new();
        // Register child first; planning must still order the parent first.
        data.get_or_create(&child, &ident("orders_b"))
            .append_row(RowId::new(0), RowId::new(0), Some(RowId::new(0)), None);
        data.get_or_create(&root, &ident("orders_t"))
            .append_row(RowId::new(0), RowId::new(0), None, None);

        let db = overlay.touched_database("shop").unwrap();
        let jobs = plan_batch(db, "orders", data).unwrap();
        let doc_part_idents: Vec<String> = jobs
            .iter()
            .filter_map(|j| match j {
                BackendJob::AddDocPart { identifier, .. } => Some(identifier.to_string()),
                _ => None,
            })
            .collect();
        assert_eq!(doc_part_idents, vec!["orders_t", "orders_b"]);
    }

    #[test]
    fn staged_indexes_are_created_after_doc_part_jobs() {
        let mut overlay = overlay_with_collection();
        let root = TableRef::root();
        {
            let db = overlay.touch_database("shop").unwrap();
            let col = db.touch_collection("orders").unwrap();
            let dp = col.add_doc_part(Arc::clone(&root), ident("orders_t"));
            dp.add_field(MetaField::new("a", ident("a_i"), FieldType::Integer));
            col.add_index(MetaIndex::new(
                "orders_a_idx",
                ident("orders_a_idx"),
                true,
                vec![MetaIndexColumn::new(
                    Arc::clone(&root),
                    "a",
                    FieldType::Integer,
                )],
            ));
        }

        let mut data = CollectionData::new();
        data.get_or_create(&root, &ident("orders_t")).append_row(
            RowId::new(0),
            RowId::new(0),
            None,
            None,
        );

        let db = overlay.touched_database("shop").unwrap();
        let jobs = plan_batch(db, "orders", data).unwrap();
        let kinds: Vec<JobKind> = jobs.iter().map(BackendJob::kind).collect();
        let insert = kinds.iter().position(|k| *k == JobKind::Insert).unwrap();
        let index = kinds
            .iter()
            .position(|k| *k == JobKind::CreateIndex)
            .unwrap();
        assert!(insert < index, "index DDL must follow the doc-part jobs");
        match &jobs[index] {
            BackendJob::CreateIndex { index, .. } => {
                assert_eq!(index.name(), "orders_a_idx");
                assert!(index.is_unique());
                assert_eq!(index.columns().len(), 1);
            }
            other => panic!("expected create index, got {other}"),
        }
    }

    #[test]
    fn unplanned_collection_is_an_illegal_state() {
        let overlay = overlay_with_collection();
        let db = overlay.touched_database("shop").unwrap();
        let err = plan_batch(db, "missing", CollectionData::new()).unwrap_err();
        assert!(matches!(err, DocRelError::IllegalState { .. }));
    }
}
