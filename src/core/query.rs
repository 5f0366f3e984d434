//! Offset/limit pagination and name search over a [`RecordCollection`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    core::collection::RecordCollection,
    record::{Record, RecordSet},
    types::{FIRST_NAME_COLUMN, FieldValue, LAST_NAME_COLUMN},
};

/// Caller mistakes detected by the query engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Neither name filter was supplied.
    #[error("Please provide first_name or last_name")]
    EmptySearch,
}

/// Page bookkeeping returned next to the data slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    /// Requested one-based page.
    pub page: usize,
    /// Requested page size.
    pub per_page: usize,
    /// Records in the whole collection.
    pub total_records: usize,
    /// `ceil(total_records / per_page)`.
    pub total_pages: usize,
}

/// One page of records plus its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageResult {
    /// Page bookkeeping.
    pub meta: PageMeta,
    /// Records on this page, in id order.
    pub data: RecordSet,
}

/// Slices page `page` (one-based) of size `per_page` out of the canonical order.
///
/// Out-of-range pages yield empty data with correct metadata. A `per_page`
/// of zero yields no data and zero pages.
pub fn paginate(collection: &RecordCollection, page: usize, per_page: usize) -> PageResult {
    let total = collection.len();
    let total_pages = if per_page == 0 {
        0
    } else {
        total.div_ceil(per_page)
    };
    let start = page.saturating_sub(1).saturating_mul(per_page);
    let end = total.min(start.saturating_add(per_page));

    let records = if start >= total {
        Vec::new()
    } else {
        collection.records()[start..end].to_vec()
    };

    PageResult {
        meta: PageMeta {
            page,
            per_page,
            total_records: total,
            total_pages,
        },
        data: RecordSet {
            schema: collection.schema().clone(),
            records,
        },
    }
}

/// Optional, case-insensitive substring filters on the two name columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SearchQuery {
    /// Substring matched against `first_name`.
    pub first_name: Option<String>,
    /// Substring matched against `last_name`.
    pub last_name: Option<String>,
}

impl SearchQuery {
    /// Query on `first_name` only.
    pub fn first_name(value: impl Into<String>) -> Self {
        Self {
            first_name: Some(value.into()),
            last_name: None,
        }
    }

    /// Query on `last_name` only.
    pub fn last_name(value: impl Into<String>) -> Self {
        Self {
            first_name: None,
            last_name: Some(value.into()),
        }
    }

    /// True when neither filter carries a non-empty value.
    pub fn is_empty(&self) -> bool {
        self.filters().is_empty()
    }

    /// Empty strings count as absent.
    fn filters(&self) -> Vec<(&'static str, String)> {
        [
            (FIRST_NAME_COLUMN, &self.first_name),
            (LAST_NAME_COLUMN, &self.last_name),
        ]
        .into_iter()
        .filter_map(|(column, needle)| {
            needle
                .as_deref()
                .filter(|n| !n.is_empty())
                .map(|n| (column, n.to_lowercase()))
        })
        .collect()
    }
}

/// Returns records whose name columns contain every supplied filter.
///
/// Null cells and columns missing from the schema never match. An empty
/// result is a valid outcome.
pub fn search<'a>(
    collection: &'a RecordCollection,
    query: &SearchQuery,
) -> Result<Vec<&'a Record>, QueryError> {
    let filters = query.filters();
    if filters.is_empty() {
        return Err(QueryError::EmptySearch);
    }

    let schema = collection.schema();
    let columns: Vec<(Option<usize>, &str)> = filters
        .iter()
        .map(|(column, needle)| (schema.index_of(column), needle.as_str()))
        .collect();

    Ok(collection
        .iter()
        .filter(|rec| {
            columns.iter().all(|(idx, needle)| {
                idx.and_then(|i| rec.values().get(i))
                    .is_some_and(|value| contains_ignore_case(value, needle))
            })
        })
        .collect())
}

fn contains_ignore_case(value: &FieldValue, needle_lower: &str) -> bool {
    if value.is_null() {
        return false;
    }
    value.to_cell().to_lowercase().contains(needle_lower)
}
