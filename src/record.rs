//! Record schema, rows, JSON views, and sparse patches.

use serde::{
    Serialize, Serializer,
    ser::{SerializeMap, SerializeSeq},
};
use serde_json::Value;
use thiserror::Error;

use crate::{
    core::collection::StoreError,
    types::{FieldValue, ID_COLUMN, RecordId},
};

/// Ordered column names taken from the store header.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    columns: Vec<String>,
    id_index: usize,
}

impl Schema {
    /// Validates a header row: names must be unique and include `id`.
    pub fn new(columns: Vec<String>) -> Result<Self, StoreError> {
        for (idx, name) in columns.iter().enumerate() {
            if columns[..idx].contains(name) {
                return Err(StoreError::DuplicateColumn(name.clone()));
            }
        }
        let id_index = columns
            .iter()
            .position(|c| c == ID_COLUMN)
            .ok_or(StoreError::MissingIdColumn)?;
        Ok(Self { columns, id_index })
    }

    /// Column names in header order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// True for the schema of a store that has never been written.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position of `name` in the header.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Position of the identity column.
    pub fn id_index(&self) -> usize {
        self.id_index
    }
}

/// One addressable row: its coerced identity plus every cell in schema order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    id: RecordId,
    values: Vec<FieldValue>,
}

impl Record {
    pub(crate) fn new(id: RecordId, values: Vec<FieldValue>) -> Self {
        Self { id, values }
    }

    /// Coerced identity.
    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Cells in schema order, including the raw `id` cell.
    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }

    /// Looks up a cell by column name.
    pub fn field<'a>(&'a self, schema: &Schema, name: &str) -> Option<&'a FieldValue> {
        schema.index_of(name).and_then(|idx| self.values.get(idx))
    }

    /// Pairs the record with its schema for JSON serialization.
    pub fn view<'a>(&'a self, schema: &'a Schema) -> RecordView<'a> {
        RecordView {
            schema,
            record: self,
        }
    }
}

/// Serializes a [`Record`] as a JSON object keyed by column name, in header order.
///
/// The identity column is emitted as the coerced integer.
#[derive(Debug, Clone, Copy)]
pub struct RecordView<'a> {
    schema: &'a Schema,
    record: &'a Record,
}

impl Serialize for RecordView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.schema.len()))?;
        for (idx, (name, value)) in self
            .schema
            .columns()
            .iter()
            .zip(self.record.values())
            .enumerate()
        {
            if idx == self.schema.id_index() {
                map.serialize_entry(name, &self.record.id)?;
            } else {
                map.serialize_entry(name, value)?;
            }
        }
        map.end()
    }
}

/// Owned list of records together with the schema needed to render them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordSet {
    /// Schema shared by every record.
    pub schema: Schema,
    /// Records in canonical order.
    pub records: Vec<Record>,
}

impl RecordSet {
    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no record is held.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Identities in order.
    pub fn ids(&self) -> Vec<RecordId> {
        self.records.iter().map(Record::id).collect()
    }
}

impl Serialize for RecordSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.records.len()))?;
        for record in &self.records {
            seq.serialize_element(&record.view(&self.schema))?;
        }
        seq.end()
    }
}

/// Rejection raised while building a [`RecordPatch`] from request input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    /// The body was not parseable JSON.
    #[error("request body must be valid JSON: {0}")]
    InvalidJson(String),
    /// The body was not a JSON object.
    #[error("update data must be a JSON object")]
    NotAnObject,
    /// The object carried no fields.
    #[error("no update data provided")]
    Empty,
    /// A field value was an array or an object.
    #[error("unsupported value for field '{field}'")]
    UnsupportedValue {
        /// Offending key.
        field: String,
    },
}

/// Sparse patch keyed by column name. Keys are resolved against a schema at
/// apply time; unknown names are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordPatch {
    fields: Vec<(String, FieldValue)>,
}

impl RecordPatch {
    /// Starts an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter; a later value for the same name wins.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
        self
    }

    /// Parses a raw request body. A blank body counts as an empty patch.
    pub fn from_slice(body: &[u8]) -> Result<Self, PatchError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(PatchError::Empty);
        }
        let value: Value =
            serde_json::from_slice(body).map_err(|err| PatchError::InvalidJson(err.to_string()))?;
        Self::from_json(&value)
    }

    /// Converts a JSON object body into a patch.
    ///
    /// `null` clears a cell, integral numbers become integers, and strings are
    /// classified like cell text. Other scalars are stored as their JSON text.
    pub fn from_json(body: &Value) -> Result<Self, PatchError> {
        let object = body.as_object().ok_or(PatchError::NotAnObject)?;
        if object.is_empty() {
            return Err(PatchError::Empty);
        }
        let mut fields = Vec::with_capacity(object.len());
        for (key, value) in object {
            let value = match value {
                Value::Null => FieldValue::Null,
                Value::String(s) => FieldValue::from_cell(s),
                Value::Number(n) => match n.as_i64() {
                    Some(i) => FieldValue::Integer(i),
                    None => FieldValue::Text(n.to_string()),
                },
                Value::Bool(b) => FieldValue::Text(b.to_string()),
                Value::Array(_) | Value::Object(_) => {
                    return Err(PatchError::UnsupportedValue { field: key.clone() });
                }
            };
            fields.push((key.clone(), value));
        }
        Ok(Self { fields })
    }

    /// Returns true when no fields are set.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Keeps only entries naming an existing, non-identity column.
    pub fn resolve(&self, schema: &Schema) -> ResolvedPatch {
        let entries = self
            .fields
            .iter()
            .filter_map(|(name, value)| {
                schema
                    .index_of(name)
                    .filter(|idx| *idx != schema.id_index())
                    .map(|idx| (idx, value.clone()))
            })
            .collect();
        ResolvedPatch { entries }
    }
}

/// A [`RecordPatch`] bound to column positions of one schema.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedPatch {
    entries: Vec<(usize, FieldValue)>,
}

impl ResolvedPatch {
    /// Number of columns the patch overwrites.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing in the source patch named a known column.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Applies this patch in place to `rec`.
    pub fn apply_to(&self, rec: &mut Record) {
        for (idx, value) in &self.entries {
            if let Some(slot) = rec.values.get_mut(*idx) {
                *slot = value.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn schema() -> Schema {
        Schema::new(vec![
            "id".into(),
            "first_name".into(),
            "last_name".into(),
            "age".into(),
        ])
        .unwrap()
    }

    #[test]
    fn schema_requires_unique_columns_and_id() {
        assert_eq!(
            Schema::new(vec!["name".into()]),
            Err(StoreError::MissingIdColumn)
        );
        assert_eq!(
            Schema::new(vec!["id".into(), "a".into(), "a".into()]),
            Err(StoreError::DuplicateColumn("a".into()))
        );
        assert_eq!(schema().id_index(), 0);
    }

    #[test]
    fn json_patch_maps_scalar_types() {
        let patch = RecordPatch::from_json(&json!({
            "first_name": "Joey",
            "age": 31,
            "height": 1.8,
            "married": false,
            "last_name": null,
        }))
        .unwrap();

        let expected = RecordPatch::new()
            .set("age", 31i64)
            .set("first_name", "Joey")
            .set("height", FieldValue::Text("1.8".into()))
            .set("last_name", FieldValue::Null)
            .set("married", FieldValue::Text("false".into()));
        let mut got: Vec<_> = patch.fields.clone();
        let mut want: Vec<_> = expected.fields.clone();
        got.sort_by(|a, b| a.0.cmp(&b.0));
        want.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(got, want);
    }

    #[test]
    fn json_patch_rejects_non_objects_and_nesting() {
        assert_eq!(
            RecordPatch::from_json(&json!([1, 2])),
            Err(PatchError::NotAnObject)
        );
        assert_eq!(RecordPatch::from_json(&json!({})), Err(PatchError::Empty));
        assert_eq!(
            RecordPatch::from_json(&json!({"tags": ["a"]})),
            Err(PatchError::UnsupportedValue {
                field: "tags".into()
            })
        );
    }

    #[test]
    fn raw_bodies_are_parsed_or_classified() {
        assert_eq!(RecordPatch::from_slice(b""), Err(PatchError::Empty));
        assert_eq!(RecordPatch::from_slice(b"  \n"), Err(PatchError::Empty));
        assert_eq!(RecordPatch::from_slice(b"{}"), Err(PatchError::Empty));
        assert!(matches!(
            RecordPatch::from_slice(b"not json"),
            Err(PatchError::InvalidJson(_))
        ));
        assert_eq!(
            RecordPatch::from_slice(br#"{"occupation":"Chef"}"#),
            Ok(RecordPatch::new().set("occupation", "Chef"))
        );
    }

    #[test]
    fn resolve_drops_unknown_and_identity_columns() {
        let patch = RecordPatch::new()
            .set("nickname", "X")
            .set("id", 99i64)
            .set("last_name", "Geller");
        let resolved = patch.resolve(&schema());
        assert_eq!(resolved.len(), 1);

        let mut rec = Record::new(
            1,
            vec![FieldValue::Integer(1), "Ross".into(), "G".into(), FieldValue::Integer(30)],
        );
        resolved.apply_to(&mut rec);
        assert_eq!(rec.id(), 1);
        assert_eq!(
            rec.values(),
            &[
                FieldValue::Integer(1),
                "Ross".into(),
                "Geller".into(),
                FieldValue::Integer(30)
            ]
        );
    }

    #[test]
    fn view_serializes_in_header_order_with_coerced_id() {
        let schema = schema();
        let rec = Record::new(
            4,
            vec!["4.0".into(), "Monica".into(), FieldValue::Null, FieldValue::Integer(29)],
        );
        let json = serde_json::to_string(&rec.view(&schema)).unwrap();
        assert_eq!(
            json,
            r#"{"id":4,"first_name":"Monica","last_name":null,"age":29}"#
        );
    }
}
