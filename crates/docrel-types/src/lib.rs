//! Leaf data structures shared by every DocRel crate.
//!
//! This crate has no opinion about translation or storage; it only defines
//! the vocabulary: row identifiers, physical identifiers, table paths
//! ([`TableRef`]), document values ([`DocValue`]) and their column-type
//! image ([`FieldType`]).

pub mod field_type;
pub mod table_ref;
pub mod value;

pub use field_type::FieldType;
pub use table_ref::TableRef;
pub use value::DocValue;

use std::fmt;

/// A row identifier inside one doc-part table.
///
/// Row ids are issued per (database, collection, table ref) by the
/// reserved-id generator. The first id issued for a fresh key is 0; ids are
/// strictly increasing and never reused, even across aborted batches.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct RowId(i64);

impl RowId {
    /// Largest representable row id.
    pub const MAX: Self = Self(i64::MAX);

    /// Create a row id from a raw value.
    #[inline]
    #[must_use]
    pub const fn new(n: i64) -> Self {
        Self(n)
    }

    /// Get the raw value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of an array element within its parent array.
///
/// Stored on every array-element row so element order is restorable on read.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct SeqIdx(i32);

impl SeqIdx {
    /// Create a sequence index from a raw value.
    #[inline]
    #[must_use]
    pub const fn new(n: i32) -> Self {
        Self(n)
    }

    /// Get the raw value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for SeqIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A backend-safe physical identifier for a table, column or index.
///
/// Generated once by the unique identifier generator and immutable
/// afterwards: renaming a logical name never changes its identifier.
/// Compared case-sensitively.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Wrap an already-validated identifier string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the identifier as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length of the identifier in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the identifier is empty (never true for generated ones).
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
