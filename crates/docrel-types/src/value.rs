//! The document value model.
//!
//! [`DocValue`] is the closed set of values a stored document may contain,
//! mirroring the BSON type family. Translation dispatches on this set with
//! exhaustive matches, so adding a variant is a compile-visible event
//! everywhere a value is classified.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime, Time};

use crate::FieldType;

/// A dynamically-typed document value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DocValue {
    /// Explicit null.
    Null,
    /// Boolean.
    Boolean(bool),
    /// 32-bit signed integer.
    Integer(i32),
    /// 64-bit signed integer.
    Long(i64),
    /// 64-bit IEEE 754 floating point.
    Double(f64),
    /// IEEE 754-2008 decimal128, kept as its raw 128-bit image so storage
    /// is lossless without a decimal arithmetic dependency.
    Decimal128 {
        /// High 64 bits of the decimal128 image.
        high: u64,
        /// Low 64 bits of the decimal128 image.
        low: u64,
    },
    /// UTF-8 string.
    String(String),
    /// Calendar date without time-of-day.
    Date(Date),
    /// Time-of-day without date.
    Time(Time),
    /// Point on the timeline.
    Instant(OffsetDateTime),
    /// Internal replication timestamp (seconds + ordinal).
    MongoTimestamp {
        /// Seconds since the epoch.
        secs: u32,
        /// Ordinal within the second.
        ordinal: u32,
    },
    /// Binary blob with its subtype tag.
    Binary {
        /// BSON binary subtype byte.
        subtype: u8,
        /// Payload bytes.
        bytes: Vec<u8>,
    },
    /// 12-byte object id.
    ObjectId([u8; 12]),
    /// Regular expression with its option flags.
    Regex {
        /// Pattern source text.
        pattern: String,
        /// Option flags, e.g. `"i"`.
        options: String,
    },
    /// Smallest value in the type ordering.
    MinKey,
    /// Largest value in the type ordering.
    MaxKey,
    /// Legacy symbol/undefined family, kept as its textual image.
    Deprecated(String),
    /// Ordered sequence of values.
    Array(Vec<DocValue>),
    /// Ordered set of named fields; insertion order is preserved.
    Document(Vec<(String, DocValue)>),
}

impl DocValue {
    /// Whether this is the null value.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether this value is a container (document or array).
    #[must_use]
    pub const fn is_container(&self) -> bool {
        matches!(self, Self::Document(_) | Self::Array(_))
    }

    /// Borrow the fields of a document value.
    #[must_use]
    pub fn as_document(&self) -> Option<&[(String, DocValue)]> {
        match self {
            Self::Document(fields) => Some(fields),
            _ => None,
        }
    }

    /// Borrow the elements of an array value.
    #[must_use]
    pub fn as_array(&self) -> Option<&[DocValue]> {
        match self {
            Self::Array(elems) => Some(elems),
            _ => None,
        }
    }

    /// Borrow a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Extract a boolean value.
    #[must_use]
    pub const fn as_boolean(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract an integral value, widening `Integer` to i64.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i as i64),
            Self::Long(l) => Some(*l),
            _ => None,
        }
    }

    /// The column type this value is stored under.
    #[must_use]
    pub const fn field_type(&self) -> FieldType {
        FieldType::of(self)
    }

    /// Short type name for diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Long(_) => "long",
            Self::Double(_) => "double",
            Self::Decimal128 { .. } => "decimal128",
            Self::String(_) => "string",
            Self::Date(_) => "date",
            Self::Time(_) => "time",
            Self::Instant(_) => "instant",
            Self::MongoTimestamp { .. } => "timestamp",
            Self::Binary { .. } => "binary",
            Self::ObjectId(_) => "objectId",
            Self::Regex { .. } => "regex",
            Self::MinKey => "minKey",
            Self::MaxKey => "maxKey",
            Self::Deprecated(_) => "deprecated",
            Self::Array(_) => "array",
            Self::Document(_) => "document",
        }
    }

    /// Build a value from parsed JSON.
    ///
    /// JSON integers land in `Integer` when they fit in 32 bits, otherwise
    /// `Long`; every other JSON number becomes `Double`. Object key order
    /// is preserved.
    #[must_use]
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Boolean(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    i32::try_from(i).map_or(Self::Long(i), Self::Integer)
                } else {
                    Self::Double(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(elems) => {
                Self::Array(elems.into_iter().map(Self::from_json).collect())
            }
            serde_json::Value::Object(fields) => Self::Document(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Self::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for DocValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Long(l) => write!(f, "{l}"),
            Self::Double(d) => write!(f, "{d}"),
            Self::Decimal128 { high, low } => write!(f, "decimal128({high:#x}, {low:#x})"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Date(d) => write!(f, "{d}"),
            Self::Time(t) => write!(f, "{t}"),
            Self::Instant(i) => write!(f, "{i}"),
            Self::MongoTimestamp { secs, ordinal } => write!(f, "timestamp({secs}, {ordinal})"),
            Self::Binary { subtype, bytes } => {
                write!(f, "binary(subtype={subtype}, {} bytes)", bytes.len())
            }
            Self::ObjectId(bytes) => {
                f.write_str("objectId(")?;
                for b in bytes {
                    write!(f, "{b:02x}")?;
                }
                f.write_str(")")
            }
            Self::Regex { pattern, options } => write!(f, "/{pattern}/{options}"),
            Self::MinKey => f.write_str("minKey"),
            Self::MaxKey => f.write_str("maxKey"),
            Self::Deprecated(s) => write!(f, "deprecated({s:?})"),
            Self::Array(elems) => write!(f, "array[{}]", elems.len()),
            Self::Document(fields) => write!(f, "document{{{} fields}}", fields.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_json_number_widths() {
        let v = DocValue::from_json(serde_json::json!(7));
        assert_eq!(v, DocValue::Integer(7));

        let v = DocValue::from_json(serde_json::json!(5_000_000_000_i64));
        assert_eq!(v, DocValue::Long(5_000_000_000));

        let v = DocValue::from_json(serde_json::json!(1.5));
        assert_eq!(v, DocValue::Double(1.5));
    }

    #[test]
    fn from_json_preserves_field_order() {
        let v = DocValue::from_json(serde_json::json!({"z": 1, "a": 2, "m": 3}));
        let fields = v.as_document().unwrap();
        let keys: Vec<&str> = fields.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn accessors() {
        assert!(DocValue::Null.is_null());
        assert!(DocValue::Array(vec![]).is_container());
        assert_eq!(DocValue::Integer(3).as_i64(), Some(3));
        assert_eq!(DocValue::Long(9).as_i64(), Some(9));
        assert_eq!(DocValue::String("x".into()).as_str(), Some("x"));
        assert_eq!(DocValue::Boolean(true).as_boolean(), Some(true));
        assert_eq!(DocValue::Double(1.0).as_i64(), None);
    }

    #[test]
    fn display_is_compact() {
        assert_eq!(DocValue::Null.to_string(), "null");
        assert_eq!(
            DocValue::Array(vec![DocValue::Integer(1)]).to_string(),
            "array[1]"
        );
        assert_eq!(
            DocValue::Regex {
                pattern: "^a".into(),
                options: "i".into()
            }
            .to_string(),
            "/^a/i"
        );
    }
}
