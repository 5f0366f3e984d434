use hashbrown::HashMap;
use thiserror::Error;

use crate::{
    record::{Record, RecordPatch, Schema},
    types::{FieldValue, RecordId, coerce_id},
};

/// Structural and lookup failures of a [`RecordCollection`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No record carries the requested id.
    #[error("no record with id {0}")]
    NotFound(RecordId),
    /// Two rows coerce to the same id.
    #[error("duplicate id {0}")]
    DuplicateId(RecordId),
    /// The header has no `id` column.
    #[error("missing id column")]
    MissingIdColumn,
    /// The header names a column twice.
    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),
    /// A row's width disagrees with the header.
    #[error("row {row} has {found} fields, expected {expected}")]
    RowWidth {
        /// One-based data row number.
        row: usize,
        /// Header width.
        expected: usize,
        /// Row width.
        found: usize,
    },
}

/// Id-ordered, id-addressable set of records sharing one schema.
///
/// Rows whose `id` cell cannot be coerced are kept aside as detached rows:
/// they are never returned by queries or reachable by id, but they are
/// written back on save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordCollection {
    schema: Schema,
    records: Vec<Record>,
    pos: HashMap<RecordId, usize>,
    detached: Vec<Vec<FieldValue>>,
}

impl RecordCollection {
    /// Collection for a store that does not exist yet.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a collection from a header and raw cell rows.
    ///
    /// Fails on an invalid header, a ragged row, or a duplicate id.
    pub fn from_rows<I>(header: Vec<String>, rows: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let schema = Schema::new(header)?;
        let mut records = Vec::new();
        let mut detached = Vec::new();

        for (idx, row) in rows.into_iter().enumerate() {
            if row.len() != schema.len() {
                return Err(StoreError::RowWidth {
                    row: idx + 1,
                    expected: schema.len(),
                    found: row.len(),
                });
            }
            let id = coerce_id(&row[schema.id_index()]);
            let values = row.iter().map(|cell| FieldValue::from_cell(cell)).collect();
            match id {
                Some(id) => records.push(Record::new(id, values)),
                None => detached.push(values),
            }
        }

        records.sort_by_key(Record::id);
        if let Some(pair) = records.windows(2).find(|w| w[0].id() == w[1].id()) {
            return Err(StoreError::DuplicateId(pair[0].id()));
        }

        let pos = records
            .iter()
            .enumerate()
            .map(|(idx, rec)| (rec.id(), idx))
            .collect();

        Ok(Self {
            schema,
            records,
            pos,
            detached,
        })
    }

    /// Column layout observed at load time.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Number of addressable records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no addressable record exists.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in ascending id order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Iterates records in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    /// Looks up a record by id.
    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.pos.get(&id).map(|idx| &self.records[*idx])
    }

    /// Returns true when `id` is addressable.
    pub fn contains(&self, id: RecordId) -> bool {
        self.pos.contains_key(&id)
    }

    /// Ids in canonical order.
    pub fn ordered_ids(&self) -> Vec<RecordId> {
        self.records.iter().map(Record::id).collect()
    }

    /// Rows excluded from addressing because their id failed coercion.
    pub fn detached_rows(&self) -> &[Vec<FieldValue>] {
        &self.detached
    }

    /// Overwrites every known, non-identity column named in `patch` on record `id`.
    pub fn update_by_id(&mut self, id: RecordId, patch: &RecordPatch) -> Result<&Record, StoreError> {
        let idx = *self.pos.get(&id).ok_or(StoreError::NotFound(id))?;
        let resolved = patch.resolve(&self.schema);
        let rec = &mut self.records[idx];
        resolved.apply_to(rec);
        Ok(rec)
    }

    /// Removes record `id`, keeping the remaining order.
    pub fn delete_by_id(&mut self, id: RecordId) -> Result<Record, StoreError> {
        let idx = self.pos.remove(&id).ok_or(StoreError::NotFound(id))?;
        let removed = self.records.remove(idx);
        for (offset, rec) in self.records[idx..].iter().enumerate() {
            self.pos.insert(rec.id(), idx + offset);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn header() -> Vec<String> {
        row(&["id", "first_name", "last_name"])
    }

    fn sample() -> RecordCollection {
        RecordCollection::from_rows(
            header(),
            vec![
                row(&["3", "Chandler", "Bing"]),
                row(&["1", "Rachel", "Green"]),
                row(&["x", "Gunther", ""]),
                row(&["2", "Ross", "Geller"]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn rows_sort_by_id_and_uncoercible_ids_detach() {
        let c = sample();
        assert_eq!(c.ordered_ids(), vec![1, 2, 3]);
        assert_eq!(c.detached_rows().len(), 1);
        assert_eq!(c.get(2).unwrap().values()[1], FieldValue::from("Ross"));
    }

    #[test]
    fn duplicate_ids_fail_the_build() {
        let err = RecordCollection::from_rows(
            header(),
            vec![row(&["1", "A", "B"]), row(&["1.0", "C", "D"])],
        )
        .unwrap_err();
        assert_eq!(err, StoreError::DuplicateId(1));
    }

    #[test]
    fn ragged_rows_fail_the_build() {
        let err = RecordCollection::from_rows(header(), vec![row(&["1", "A"])]).unwrap_err();
        assert_eq!(
            err,
            StoreError::RowWidth {
                row: 1,
                expected: 3,
                found: 2
            }
        );
    }

    #[test]
    fn delete_reindexes_the_tail() {
        let mut c = sample();
        let removed = c.delete_by_id(1).unwrap();
        assert_eq!(removed.id(), 1);
        assert_eq!(c.ordered_ids(), vec![2, 3]);
        assert_eq!(c.get(3).unwrap().id(), 3);
        assert!(!c.contains(1));
        assert_eq!(c.delete_by_id(1), Err(StoreError::NotFound(1)));
    }

    #[test]
    fn update_on_missing_id_is_not_found() {
        let mut c = sample();
        let patch = RecordPatch::new().set("first_name", "Joey");
        assert_eq!(
            c.update_by_id(9, &patch).unwrap_err(),
            StoreError::NotFound(9)
        );
    }
}
