//! Ordered units of work against the backend.
//!
//! A [`BackendJob`] is created by the planner, executed exactly once
//! against a [`BackendTransaction`], and discarded. A job error means the
//! whole batch must be rolled back; execution stops at the first failure.

use std::fmt;
use std::sync::Arc;

use docrel_d2r::DocPartData;
use docrel_error::Result;
use docrel_meta::MetaIndex;
use docrel_types::{FieldType, Identifier, TableRef};
use tracing::debug;

use crate::connection::BackendTransaction;

/// One unit of backend work.
#[derive(Debug)]
pub enum BackendJob {
    /// Create the container for a database new in this batch.
    AddDatabase {
        /// Logical database name.
        database: String,
        /// Physical identifier.
        identifier: Identifier,
    },
    /// Create the container for a collection new in this batch.
    AddCollection {
        /// Logical database name.
        database: String,
        /// Logical collection name.
        collection: String,
        /// Physical identifier.
        identifier: Identifier,
    },
    /// Create the table backing a doc part new in this batch.
    AddDocPart {
        /// Logical database name.
        database: String,
        /// Logical collection name.
        collection: String,
        /// Position of the table in the document structure.
        table_ref: Arc<TableRef>,
        /// Physical table identifier.
        identifier: Identifier,
    },
    /// Add a field column new in this batch.
    AddField {
        /// Logical database name.
        database: String,
        /// Logical collection name.
        collection: String,
        /// Identifier of the owning doc-part table.
        doc_part: Identifier,
        /// Logical field name.
        name: String,
        /// Column type.
        field_type: FieldType,
        /// Physical column identifier.
        identifier: Identifier,
    },
    /// Add a scalar column new in this batch.
    AddScalar {
        /// Logical database name.
        database: String,
        /// Logical collection name.
        collection: String,
        /// Identifier of the owning doc-part table.
        doc_part: Identifier,
        /// Column type.
        field_type: FieldType,
        /// Physical column identifier.
        identifier: Identifier,
    },
    /// Create an index staged in this batch.
    CreateIndex {
        /// Logical database name.
        database: String,
        /// Logical collection name.
        collection: String,
        /// The staged index definition.
        index: MetaIndex,
    },
    /// Insert one doc part's accumulated rows.
    Insert {
        /// Logical database name.
        database: String,
        /// Logical collection name.
        collection: String,
        /// The rows and column layout to insert.
        data: DocPartData,
    },
}

/// Discriminant of a [`BackendJob`], for assertions and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    /// See [`BackendJob::AddDatabase`].
    AddDatabase,
    /// See [`BackendJob::AddCollection`].
    AddCollection,
    /// See [`BackendJob::AddDocPart`].
    AddDocPart,
    /// See [`BackendJob::AddField`].
    AddField,
    /// See [`BackendJob::AddScalar`].
    AddScalar,
    /// See [`BackendJob::CreateIndex`].
    CreateIndex,
    /// See [`BackendJob::Insert`].
    Insert,
}

impl BackendJob {
    /// This job's discriminant.
    #[must_use]
    pub const fn kind(&self) -> JobKind {
        match self {
            Self::AddDatabase { .. } => JobKind::AddDatabase,
            Self::AddCollection { .. } => JobKind::AddCollection,
            Self::AddDocPart { .. } => JobKind::AddDocPart,
            Self::AddField { .. } => JobKind::AddField,
            Self::AddScalar { .. } => JobKind::AddScalar,
            Self::CreateIndex { .. } => JobKind::CreateIndex,
            Self::Insert { .. } => JobKind::Insert,
        }
    }

    /// Execute this job against a write transaction. Any error signals
    /// that the whole batch must be rolled back.
    pub fn execute(&self, tx: &mut dyn BackendTransaction) -> Result<()> {
        debug!(job = %self, "executing backend job");
        match self {
            Self::AddDatabase {
                database,
                identifier,
            } => tx.add_database(database, identifier),
            Self::AddCollection {
                database,
                collection,
                identifier,
            } => tx.add_collection(database, collection, identifier),
            Self::AddDocPart {
                database,
                collection,
                table_ref,
                identifier,
            } => tx.add_doc_part(database, collection, table_ref, identifier),
            Self::AddField {
                database,
                collection,
                doc_part,
                name,
                field_type,
                identifier,
            } => tx.add_field(database, collection, doc_part, name, *field_type, identifier),
            Self::AddScalar {
                database,
                collection,
                doc_part,
                field_type,
                identifier,
            } => tx.add_scalar(database, collection, doc_part, *field_type, identifier),
            Self::CreateIndex {
                database,
                collection,
                index,
            } => tx.create_index(database, collection, index),
            Self::Insert {
                database,
                collection,
                data,
            } => tx.insert(database, collection, data),
        }
    }
}

impl fmt::Display for BackendJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddDatabase { database, .. } => write!(f, "add database {database}"),
            Self::AddCollection {
                database,
                collection,
                ..
            } => write!(f, "add collection {database}.{collection}"),
            Self::AddDocPart {
                database,
                collection,
                table_ref,
                ..
            } => write!(f, "add doc part {database}.{collection}{table_ref}"),
            Self::AddField {
                doc_part,
                name,
                field_type,
                ..
            } => write!(f, "add field {name} ({field_type:?}) to {doc_part}"),
            Self::AddScalar {
                doc_part,
                field_type,
                ..
            } => write!(f, "add scalar ({field_type:?}) to {doc_part}"),
            Self::CreateIndex { index, .. } => write!(f, "create index {}", index.name()),
            Self::Insert { data, .. } => write!(
                f,
                "insert {} rows into {}",
                data.row_count(),
                data.identifier()
            ),
        }
    }
}

/// Constructors mirroring the job variants, for collaborators that build
/// job sequences outside the planner.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackendJobFactory;

impl BackendJobFactory {
    /// Build an [`BackendJob::AddDatabase`] job.
    #[must_use]
    pub fn create_add_database_job(
        &self,
        database: impl Into<String>,
        identifier: Identifier,
    ) -> BackendJob {
        BackendJob::AddDatabase {
            database: database.into(),
            identifier,
        }
    }

    /// Build an [`BackendJob::AddCollection`] job.
    #[must_use]
    pub fn create_add_collection_job(
        &self,
        database: impl Into<String>,
        collection: impl Into<String>,
        identifier: Identifier,
    ) -> BackendJob {
        BackendJob::AddCollection {
            database: database.into(),
            collection: collection.into(),
            identifier,
        }
    }

    /// Build an [`BackendJob::AddDocPart`] job.
    #[must_use]
    pub fn create_add_doc_part_job(
        &self,
        database: impl Into<String>,
        collection: impl Into<String>,
        table_ref: Arc<TableRef>,
        identifier: Identifier,
    ) -> BackendJob {
        BackendJob::AddDocPart {
            database: database.into(),
            collection: collection.into(),
            table_ref,
            identifier,
        }
    }

    /// Build an [`BackendJob::AddField`] job.
    #[must_use]
    pub fn create_add_field_job(
        &self,
        database: impl Into<String>,
        collection: impl Into<String>,
        doc_part: Identifier,
        name: impl Into<String>,
        field_type: FieldType,
        identifier: Identifier,
    ) -> BackendJob {
        BackendJob::AddField {
            database: database.into(),
            collection: collection.into(),
            doc_part,
            name: name.into(),
            field_type,
            identifier,
        }
    }

    /// Build an [`BackendJob::AddScalar`] job.
    #[must_use]
    pub fn create_add_scalar_job(
        &self,
        database: impl Into<String>,
        collection: impl Into<String>,
        doc_part: Identifier,
        field_type: FieldType,
        identifier: Identifier,
    ) -> BackendJob {
        BackendJob::AddScalar {
            database: database.into(),
            collection: collection.into(),
            doc_part,
            field_type,
            identifier,
        }
    }

    /// Build a [`BackendJob::CreateIndex`] job.
    #[must_use]
    pub fn create_index_job(
        &self,
        database: impl Into<String>,
        collection: impl Into<String>,
        index: MetaIndex,
    ) -> BackendJob {
        BackendJob::CreateIndex {
            database: database.into(),
            collection: collection.into(),
            index,
        }
    }

    /// Build a [`BackendJob::Insert`] job.
    #[must_use]
    pub fn create_insert_job(
        &self,
        database: impl Into<String>,
        collection: impl Into<String>,
        data: DocPartData,
    ) -> BackendJob {
        BackendJob::Insert {
            database: database.into(),
            collection: collection.into(),
            data,
        }
    }
}
