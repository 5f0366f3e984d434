//! In-memory record collection, query engine, and mutations.

/// Id-ordered record collection with id-based mutations.
pub mod collection;
/// Pagination and name search.
pub mod query;
