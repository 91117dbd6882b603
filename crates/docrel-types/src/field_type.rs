//! Column types.
//!
//! Every [`DocValue`] variant maps to exactly one [`FieldType`]; containers
//! (documents and arrays) map to [`FieldType::Child`], the boolean reference
//! column that records "this field continues in a child table". The mapping
//! is total so the compiler flags every classification site when the value
//! set grows.

use serde::{Deserialize, Serialize};

use crate::DocValue;

/// The storage type of one column in a doc-part table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum FieldType {
    /// Explicit null.
    Null,
    /// Boolean.
    Boolean,
    /// 32-bit integer.
    Integer,
    /// 64-bit integer.
    Long,
    /// 64-bit float.
    Double,
    /// decimal128 image.
    Decimal128,
    /// UTF-8 text.
    String,
    /// Calendar date.
    Date,
    /// Time of day.
    Time,
    /// Point on the timeline.
    Instant,
    /// Replication timestamp.
    MongoTimestamp,
    /// Binary blob.
    Binary,
    /// 12-byte object id.
    MongoObjectId,
    /// Regular expression.
    Regex,
    /// Smallest value in the type ordering.
    MinKey,
    /// Largest value in the type ordering.
    MaxKey,
    /// Legacy symbol/undefined family.
    Deprecated,
    /// Reference column for a subdocument (false) or array (true) that
    /// continues in a child doc part.
    Child,
}

impl FieldType {
    /// All field types, in identifier-mangle order.
    pub const ALL: [Self; 18] = [
        Self::Null,
        Self::Boolean,
        Self::Integer,
        Self::Long,
        Self::Double,
        Self::Decimal128,
        Self::String,
        Self::Date,
        Self::Time,
        Self::Instant,
        Self::MongoTimestamp,
        Self::Binary,
        Self::MongoObjectId,
        Self::Regex,
        Self::MinKey,
        Self::MaxKey,
        Self::Deprecated,
        Self::Child,
    ];

    /// The column type a value is stored under. Total over the value set.
    #[must_use]
    pub const fn of(value: &DocValue) -> Self {
        match value {
            DocValue::Null => Self::Null,
            DocValue::Boolean(_) => Self::Boolean,
            DocValue::Integer(_) => Self::Integer,
            DocValue::Long(_) => Self::Long,
            DocValue::Double(_) => Self::Double,
            DocValue::Decimal128 { .. } => Self::Decimal128,
            DocValue::String(_) => Self::String,
            DocValue::Date(_) => Self::Date,
            DocValue::Time(_) => Self::Time,
            DocValue::Instant(_) => Self::Instant,
            DocValue::MongoTimestamp { .. } => Self::MongoTimestamp,
            DocValue::Binary { .. } => Self::Binary,
            DocValue::ObjectId(_) => Self::MongoObjectId,
            DocValue::Regex { .. } => Self::Regex,
            DocValue::MinKey => Self::MinKey,
            DocValue::MaxKey => Self::MaxKey,
            DocValue::Deprecated(_) => Self::Deprecated,
            DocValue::Array(_) | DocValue::Document(_) => Self::Child,
        }
    }

    /// One-letter suffix appended to column identifiers so a logical field
    /// name may carry one column per type.
    #[must_use]
    pub const fn identifier_mangle(self) -> &'static str {
        match self {
            Self::Null => "_n",
            Self::Boolean => "_b",
            Self::Integer => "_i",
            Self::Long => "_l",
            Self::Double => "_d",
            Self::Decimal128 => "_m",
            Self::String => "_s",
            Self::Date => "_c",
            Self::Time => "_t",
            Self::Instant => "_g",
            Self::MongoTimestamp => "_y",
            Self::Binary => "_r",
            Self::MongoObjectId => "_x",
            Self::Regex => "_j",
            Self::MinKey => "_k",
            Self::MaxKey => "_z",
            Self::Deprecated => "_u",
            Self::Child => "_e",
        }
    }
}
