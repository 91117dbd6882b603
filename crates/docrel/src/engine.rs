//! The write-path orchestrator.
//!
//! [`DocRelEngine`] owns the pieces one process needs to accept document
//! writes: the admission guard, the row-id generator (loaded once at
//! open), the identifier generator, and the current metadata snapshot.
//! [`DocRelEngine::write_batch`] runs one batch end to end: admit a data
//! transaction, translate the documents against an overlay of the current
//! snapshot, plan the jobs, execute them on the caller's backend
//! transaction, commit, and fold the overlay into the new current
//! snapshot. Any failure rolls the backend transaction back and leaves
//! the snapshot untouched.

use std::sync::Arc;
use std::time::Duration;

use docrel_backend::{BackendTransaction, ConcurrentServerGuard, plan_batch};
use docrel_d2r::{D2RTranslator, DocPartData, ReservedIdGenerator, TranslatorConfig};
use docrel_error::Result;
use docrel_meta::{
    DatabaseIdentifierChecker, HashSuffixConverter, MetaSnapshot, MetaStore, MutableMetaSnapshot,
    NameChain, UniqueIdentifierGenerator,
};
use docrel_types::DocValue;
use parking_lot::{Mutex, RwLock};
use tracing::{error, info, warn};

/// What one batch did, for callers and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    /// Documents translated.
    pub documents: usize,
    /// Rows accumulated across all doc parts.
    pub rows: usize,
    /// Jobs executed (DDL + inserts).
    pub jobs: usize,
}

/// Engine wiring the translation core to a metadata store and a backend.
pub struct DocRelEngine<S: MetaStore> {
    store: S,
    guard: ConcurrentServerGuard,
    rid_generator: ReservedIdGenerator,
    id_generator: Mutex<UniqueIdentifierGenerator<HashSuffixConverter>>,
    snapshot: RwLock<Arc<MetaSnapshot>>,
    config: TranslatorConfig,
}

impl<S: MetaStore> DocRelEngine<S> {
    /// Open the engine: read the committed snapshot and load the row-id
    /// generator from it.
    pub fn open(store: S, config: TranslatorConfig) -> Result<Self> {
        let snapshot = store.read_metadata_snapshot()?;
        let rid_generator = ReservedIdGenerator::new();
        rid_generator.load(&snapshot, &store)?;
        info!(
            databases = snapshot.databases().count(),
            "engine opened"
        );
        Ok(Self {
            store,
            guard: ConcurrentServerGuard::new(),
            rid_generator,
            id_generator: Mutex::new(UniqueIdentifierGenerator::with_defaults()),
            snapshot: RwLock::new(Arc::new(snapshot)),
            config,
        })
    }

    /// The current metadata snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<MetaSnapshot> {
        Arc::clone(&self.snapshot.read())
    }

    /// The DDL/DML admission guard, for collaborators that run schema
    /// operations.
    #[must_use]
    pub const fn guard(&self) -> &ConcurrentServerGuard {
        &self.guard
    }

    /// The row-id generator, for collaborators that resynchronize ids.
    #[must_use]
    pub const fn rid_generator(&self) -> &ReservedIdGenerator {
        &self.rid_generator
    }

    /// The metadata store the engine was opened with.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Translate and persist one batch of documents.
    pub fn write_batch<T: BackendTransaction>(
        &self,
        tx: &mut T,
        database: &str,
        collection: &str,
        docs: &[DocValue],
        timeout: Duration,
    ) -> Result<BatchSummary> {
        let admission = self.guard.create_transaction(timeout, || Ok(()))?;
        let outcome = self.run_batch(tx, database, collection, docs);
        admission.close()?;
        outcome
    }

    fn run_batch<T: BackendTransaction>(
        &self,
        tx: &mut T,
        database: &str,
        collection: &str,
        docs: &[DocValue],
    ) -> Result<BatchSummary> {
        let mut overlay = MutableMetaSnapshot::new(self.snapshot());
        if overlay.touch_database(database).is_none() {
            let identifier = {
                let checker = DatabaseIdentifierChecker::new(&overlay);
                self.id_generator
                    .lock()
                    .generate_unique_identifier(&NameChain::of([database]), &checker)?
            };
            overlay.add_database(database, identifier);
        }

        let summary = {
            let db = overlay
                .touch_database(database)
                .expect("database ensured above");
            let mut id_generator = self.id_generator.lock();
            let mut translator = D2RTranslator::new(
                &self.rid_generator,
                &mut id_generator,
                db,
                collection,
                self.config,
            )?;
            for doc in docs {
                translator.translate(doc)?;
            }
            let data = translator.into_collection_data();
            let rows = data.doc_parts().map(DocPartData::row_count).sum();

            let jobs = plan_batch(db, collection, data)?;
            for job in &jobs {
                if let Err(e) = job.execute(tx) {
                    warn!(job = %job, error = %e, "backend job failed; rolling back batch");
                    if let Err(rollback_err) = tx.rollback() {
                        error!(error = %rollback_err, "rollback failed");
                    }
                    return Err(e);
                }
            }
            tx.commit()?;
            BatchSummary {
                documents: docs.len(),
                rows,
                jobs: jobs.len(),
            }
        };

        *self.snapshot.write() = Arc::new(overlay.commit());
        info!(
            database,
            collection,
            documents = summary.documents,
            rows = summary.rows,
            jobs = summary.jobs,
            "batch committed"
        );
        Ok(summary)
    }
}
