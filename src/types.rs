//! Shared primitive IDs, well-known column names, and cell values.

use std::borrow::Cow;

use serde::{Serialize, Serializer};

/// Record identifier coerced from the `id` column.
pub type RecordId = u64;

/// Identity column every store must carry.
pub const ID_COLUMN: &str = "id";
/// Column matched by the `first_name` search filter.
pub const FIRST_NAME_COLUMN: &str = "first_name";
/// Column matched by the `last_name` search filter.
pub const LAST_NAME_COLUMN: &str = "last_name";

/// One cell of a record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldValue {
    /// Empty cell.
    #[default]
    Null,
    /// Cell holding the canonical decimal form of an integer.
    Integer(i64),
    /// Any other cell text, kept verbatim.
    Text(String),
}

impl FieldValue {
    /// Classifies raw cell text.
    ///
    /// Only text that is exactly the canonical rendering of an `i64` becomes
    /// [`FieldValue::Integer`], so `from_cell(s).to_cell() == s` for every `s`.
    pub fn from_cell(raw: &str) -> Self {
        if raw.is_empty() {
            return Self::Null;
        }
        match raw.parse::<i64>() {
            Ok(n) if n.to_string() == raw => Self::Integer(n),
            _ => Self::Text(raw.to_string()),
        }
    }

    /// Renders the value as cell text.
    pub fn to_cell(&self) -> Cow<'_, str> {
        match self {
            Self::Null => Cow::Borrowed(""),
            Self::Integer(n) => Cow::Owned(n.to_string()),
            Self::Text(s) => Cow::Borrowed(s),
        }
    }

    /// Returns true for an empty cell.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::from_cell(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Integer(n) => serializer.serialize_i64(*n),
            Self::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// Coerces raw `id` cell text into a [`RecordId`].
///
/// Surrounding whitespace is ignored and integral decimals such as `3.0` are
/// accepted. Returns `None` for anything else, including negatives.
pub fn coerce_id(raw: &str) -> Option<RecordId> {
    let trimmed = raw.trim();
    if let Ok(id) = trimmed.parse::<RecordId>() {
        return Some(id);
    }
    let value: f64 = trimmed.parse().ok()?;
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= RecordId::MAX as f64 {
        Some(value as RecordId)
    } else {
        None
    }
}
