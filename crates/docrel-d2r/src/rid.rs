//! Reserved row-id generation.
//!
//! Row ids are issued per (database, collection, table ref). The generator
//! starts unloaded; [`ReservedIdGenerator::load`] reads the last used id of
//! every known doc part from the metadata store, and from then on every
//! reservation is served from memory. Per-key counters are independent
//! atomics behind a read-mostly map, so reservations for different keys
//! never contend beyond the map's read lock, and reservations for the same
//! key are a single `fetch_add`.
//!
//! Ids for a fresh key start at 0 (counters are created at −1). Aborted
//! batches leave gaps; ids are never reused.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use docrel_error::{DocRelError, Result};
use docrel_meta::{MetaSnapshot, MetaStore};
use docrel_types::{RowId, TableRef};
use parking_lot::RwLock;
use tracing::{debug, info};

/// Base counter value for a key that has never issued an id.
const FRESH_BASE: i64 = -1;

/// Composite key of one row-id counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RidKey {
    database: String,
    collection: String,
    table_ref: Arc<TableRef>,
}

impl RidKey {
    fn new(database: &str, collection: &str, table_ref: &Arc<TableRef>) -> Self {
        Self {
            database: database.to_owned(),
            collection: collection.to_owned(),
            table_ref: Arc::clone(table_ref),
        }
    }
}

/// Issues unique, increasing row ids per (database, collection, table ref).
#[derive(Debug, Default)]
pub struct ReservedIdGenerator {
    /// `None` until [`Self::load`] succeeds.
    counters: RwLock<Option<HashMap<RidKey, Arc<AtomicI64>>>>,
}

impl ReservedIdGenerator {
    /// Create an unloaded generator. Every issuing operation fails with an
    /// illegal-state error until [`Self::load`] is called.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether [`Self::load`] has completed.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.counters.read().is_some()
    }

    /// Load the last used row id of every doc part in `snapshot` from the
    /// store. May be called exactly once.
    pub fn load(&self, snapshot: &MetaSnapshot, store: &dyn MetaStore) -> Result<()> {
        let mut map = HashMap::new();
        for database in snapshot.databases() {
            for collection in database.collections() {
                for doc_part in collection.doc_parts() {
                    let last = store.read_last_row_id_used(database, collection, doc_part)?;
                    map.insert(
                        RidKey::new(database.name(), collection.name(), doc_part.table_ref()),
                        Arc::new(AtomicI64::new(last.get())),
                    );
                }
            }
        }

        let mut guard = self.counters.write();
        if guard.is_some() {
            return Err(DocRelError::illegal_state(
                "reserved-id generator loaded twice",
            ));
        }
        info!(doc_parts = map.len(), "reserved-id generator loaded");
        *guard = Some(map);
        Ok(())
    }

    /// Issue the next row id for the key. The first id of a fresh key is 0.
    pub fn next_rid(
        &self,
        database: &str,
        collection: &str,
        table_ref: &Arc<TableRef>,
    ) -> Result<RowId> {
        let counter = self.counter(database, collection, table_ref)?;
        let rid = counter.fetch_add(1, Ordering::Relaxed) + 1;
        if rid < 0 {
            return Err(DocRelError::backend("row id space exhausted"));
        }
        Ok(RowId::new(rid))
    }

    /// Ensure the next issued id is at least `next`. Monotone: a value at
    /// or below the current position is a no-op.
    pub fn set_next_rid(
        &self,
        database: &str,
        collection: &str,
        table_ref: &Arc<TableRef>,
        next: RowId,
    ) -> Result<()> {
        let counter = self.counter(database, collection, table_ref)?;
        let floor = next.get().saturating_sub(1);
        let before = counter.fetch_max(floor, Ordering::Relaxed);
        info!(
            database,
            collection,
            table_ref = %table_ref,
            last_used_before = before,
            next_rid = next.get(),
            "row-id counter resynchronized"
        );
        Ok(())
    }

    /// Atomically reserve `how_many` consecutive ids and return the first.
    /// The reservation stands even if the caller later aborts; gaps are
    /// intentional.
    pub fn consume_rids(
        &self,
        database: &str,
        collection: &str,
        table_ref: &Arc<TableRef>,
        how_many: u32,
    ) -> Result<RowId> {
        let counter = self.counter(database, collection, table_ref)?;
        let first = counter.fetch_add(i64::from(how_many), Ordering::Relaxed) + 1;
        if first < 0 || first.checked_add(i64::from(how_many)).is_none() {
            return Err(DocRelError::backend("row id space exhausted"));
        }
        debug!(
            database,
            collection,
            table_ref = %table_ref,
            first_rid = first,
            count = how_many,
            "row-id range reserved"
        );
        Ok(RowId::new(first))
    }

    /// Last id issued for the key, or −1 when the key is fresh.
    /// Diagnostic; racy by nature under concurrent issuing.
    pub fn last_used(
        &self,
        database: &str,
        collection: &str,
        table_ref: &Arc<TableRef>,
    ) -> Result<RowId> {
        let counter = self.counter(database, collection, table_ref)?;
        Ok(RowId::new(counter.load(Ordering::Relaxed)))
    }

    /// Get or lazily create the counter for a key. Creation happens
    /// exactly once per key, under the map's write lock; the fast path is
    /// a shared read.
    fn counter(
        &self,
        database: &str,
        collection: &str,
        table_ref: &Arc<TableRef>,
    ) -> Result<Arc<AtomicI64>> {
        let key = RidKey::new(database, collection, table_ref);
        {
            let guard = self.counters.read();
            let map = guard.as_ref().ok_or_else(|| {
                DocRelError::illegal_state("reserved-id generator used before load")
            })?;
            if let Some(counter) = map.get(&key) {
                return Ok(Arc::clone(counter));
            }
        }

        let mut guard = self.counters.write();
        let map = guard
            .as_mut()
            .ok_or_else(|| DocRelError::illegal_state("reserved-id generator used before load"))?;
        let counter = map.entry(key).or_insert_with(|| {
            debug!(
                database,
                collection,
                table_ref = %table_ref,
                "row-id counter created"
            );
            Arc::new(AtomicI64::new(FRESH_BASE))
        });
        Ok(Arc::clone(counter))
    }
}
