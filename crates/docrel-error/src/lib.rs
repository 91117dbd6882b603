//! Primary error type for DocRel operations.
//!
//! Low-level failures (SQL driver errors, I/O) are wrapped into this
//! taxonomy at the boundary; the core never inspects backend-specific
//! error types. Structured variants for the common cases, a kind
//! classification for policy decisions, convenience constructors for the
//! hot paths.

use thiserror::Error;

/// Primary error type for DocRel operations.
#[derive(Error, Debug)]
pub enum DocRelError {
    /// An operation was invoked in a state that forbids it, e.g. issuing
    /// row ids before the generator is loaded, or closing a guard counter
    /// that is already zero. Programming error: fatal, never retried.
    #[error("illegal state: {detail}")]
    IllegalState {
        /// What was attempted and why the state forbids it.
        detail: String,
    },

    /// A document could not be translated.
    #[error("cannot translate document for {database}.{collection}: {detail}")]
    Translation {
        /// Target database name.
        database: String,
        /// Target collection name.
        collection: String,
        /// Offending field, when one is identifiable.
        field: Option<String>,
        /// What went wrong.
        detail: String,
    },

    /// Document nesting exceeded the configured limit.
    #[error("document nesting exceeds the maximum depth of {max}")]
    DepthExceeded {
        /// The configured maximum depth.
        max: u32,
    },

    /// Admission to the concurrency guard was not granted in time.
    #[error("timed out after {waited_ms}ms waiting to open a {operation}")]
    Timeout {
        /// What was being opened ("transaction" or "schema handler").
        operation: &'static str,
        /// How long the caller waited, in milliseconds.
        waited_ms: u64,
    },

    /// No unique, allowed identifier was found within the retry budget.
    #[error("no free identifier for name chain '{chain}' after {attempts} attempts")]
    IdentifierExhausted {
        /// The logical name chain being encoded.
        chain: String,
        /// How many candidates were tried.
        attempts: u32,
    },

    /// A job signalled that the whole batch must be undone.
    #[error("batch rolled back: {reason}")]
    Rollback {
        /// Why the batch was abandoned.
        reason: String,
    },

    /// A backend operation failed; the driver error is flattened to text
    /// at the boundary.
    #[error("backend error: {detail}")]
    Backend {
        /// Flattened driver-level detail.
        detail: String,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of a [`DocRelError`], for policy decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Programming error; fatal.
    IllegalState,
    /// Caller-visible business failure; the batch is abandoned.
    User,
    /// Deadline expired; the caller may retry.
    Timeout,
    /// Infrastructure failure.
    System,
    /// Explicit batch rollback signal.
    Rollback,
}

impl DocRelError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::IllegalState { .. } => ErrorKind::IllegalState,
            Self::Translation { .. } | Self::DepthExceeded { .. } => ErrorKind::User,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::IdentifierExhausted { .. } | Self::Backend { .. } | Self::Io(_) => {
                ErrorKind::System
            }
            Self::Rollback { .. } => ErrorKind::Rollback,
        }
    }

    /// Whether this error may succeed on retry.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Whether the caller can likely fix this without code changes.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(self.kind(), ErrorKind::User)
    }

    /// Create an illegal-state error.
    pub fn illegal_state(detail: impl Into<String>) -> Self {
        Self::IllegalState {
            detail: detail.into(),
        }
    }

    /// Create a translation error.
    pub fn translation(
        database: impl Into<String>,
        collection: impl Into<String>,
        field: Option<&str>,
        detail: impl Into<String>,
    ) -> Self {
        Self::Translation {
            database: database.into(),
            collection: collection.into(),
            field: field.map(str::to_owned),
            detail: detail.into(),
        }
    }

    /// Create a timeout error.
    #[must_use]
    pub const fn timeout(operation: &'static str, waited_ms: u64) -> Self {
        Self::Timeout {
            operation,
            waited_ms,
        }
    }

    /// Create a rollback error.
    pub fn rollback(reason: impl Into<String>) -> Self {
        Self::Rollback {
            reason: reason.into(),
        }
    }

    /// Create a backend error.
    pub fn backend(detail: impl Into<String>) -> Self {
        Self::Backend {
            detail: detail.into(),
        }
    }
}

/// Result type alias using [`DocRelError`].
pub type Result<T> = std::result::Result<T, DocRelError>;
