//! DocRel: a document-to-relational storage engine.
//!
//! DocRel maps schemaless, MongoDB-style documents onto a strict
//! relational schema. Each nesting level of a document becomes a flat
//! "doc part" table; scalars land in named, typed columns, arrays in
//! type-indexed scalar columns with an order-preserving sequence column,
//! and parent-child linkage rides on generated row ids. Schema evolves
//! incrementally as documents arrive, and bulk schema changes are
//! serialized against concurrent data writes by an admission guard.
//!
//! The crates underneath, re-exported here:
//! - `docrel-types`: table refs, document values, field types, row ids.
//! - `docrel-error`: the error taxonomy.
//! - `docrel-meta`: metadata snapshots, batch overlays, identifier
//!   generation, the persistence trait.
//! - `docrel-d2r`: the translator, row accumulators, row-id reservation.
//! - `docrel-backend`: job planning, the backend transaction trait, the
//!   DDL/DML guard.
//!
//! [`DocRelEngine`] wires them into the write path: admit → translate →
//! plan → execute → fold the new snapshot. [`mem`] provides the in-memory
//! backend the integration tests run against.

pub mod engine;
pub mod mem;

pub use docrel_backend::{
    BackendJob, BackendJobFactory, BackendTransaction, ConcurrentServerGuard, GuardConfig,
    JobKind, SchemaHandle, TransactionHandle, plan_batch,
};
pub use docrel_d2r::{
    CollectionData, D2RTranslator, DocPartData, DocPartRow, ReservedIdGenerator, TranslatorConfig,
};
pub use docrel_error::{DocRelError, ErrorKind, Result};
pub use docrel_meta::{
    HashSuffixConverter, IdentifierChecker, IdentifierConstraints, MetaCollection, MetaDatabase,
    MetaDocPart, MetaField, MetaIndex, MetaIndexColumn, MetaScalar, MetaSnapshot, MetaStore,
    MutableMetaSnapshot, NameChain, RandomTruncationConverter, UniqueIdentifierGenerator,
};
pub use docrel_types::{DocValue, FieldType, Identifier, RowId, SeqIdx, TableRef};
pub use engine::{BatchSummary, DocRelEngine};
