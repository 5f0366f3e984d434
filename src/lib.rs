//! CSV-backed record collection with pagination, name search, partial
//! update, and deletion, served over HTTP.
//!
//! # Examples
//!
//! In-memory usage with [`core::collection::RecordCollection`]:
//! ```
//! use castlist::{
//!     core::{collection::RecordCollection, query},
//!     record::RecordPatch,
//! };
//!
//! let header = vec!["id".to_string(), "first_name".to_string(), "last_name".to_string()];
//! let rows = vec![
//!     vec!["2".to_string(), "Ross".to_string(), "Geller".to_string()],
//!     vec!["1".to_string(), "Rachel".to_string(), "Green".to_string()],
//! ];
//! let mut people = RecordCollection::from_rows(header, rows).expect("valid rows");
//! assert_eq!(people.ordered_ids(), vec![1, 2]);
//!
//! people
//!     .update_by_id(2, &RecordPatch::new().set("first_name", "Joey"))
//!     .expect("update");
//! let page = query::paginate(&people, 1, 5);
//! assert_eq!(page.meta.total_pages, 1);
//! ```
//!
//! Runtime usage with the CSV backend:
//! ```no_run
//! use castlist::{
//!     persist::csv_file::CsvStore,
//!     runtime::handle::{spawn_store, RuntimeConfig},
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let handle = spawn_store(Box::new(CsvStore::new("friends_data.csv")), RuntimeConfig::default());
//! let page = handle.list(1, 5).await.expect("list");
//! println!("{} records", page.meta.total_records);
//! handle.shutdown().await.expect("shutdown");
//! # }
//! ```
#![deny(missing_docs)]

/// HTTP adapter: router, handlers, DTOs, and error mapping.
pub mod api;
/// Server defaults and limits.
pub mod config;
/// In-memory collection, queries, and mutations.
pub mod core;
/// Backend abstraction and CSV implementation.
pub mod persist;
/// Schema, records, and patches.
pub mod record;
/// Single-writer runtime handle.
pub mod runtime;
/// Shared primitive types and cell values.
pub mod types;
