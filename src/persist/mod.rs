//! Persistence abstraction and the CSV file backend.

/// CSV file backend.
pub mod csv_file;

use std::path::PathBuf;

use thiserror::Error;

use crate::core::collection::{RecordCollection, StoreError};

/// The backing store exists but cannot be read as a record collection.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Opening or reading the file failed.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// Backing file.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },
    /// The file is not well-formed CSV.
    #[error("malformed csv in {}: {source}", path.display())]
    Csv {
        /// Backing file.
        path: PathBuf,
        /// Parser failure.
        #[source]
        source: ::csv::Error,
    },
    /// The rows parse but break a collection invariant.
    #[error("invalid store {}: {source}", path.display())]
    Invalid {
        /// Backing file.
        path: PathBuf,
        /// Violated invariant.
        #[source]
        source: StoreError,
    },
}

/// Persisting a collection failed; the previous file is left in place.
#[derive(Debug, Error)]
pub enum SaveError {
    /// Creating, writing, syncing, or renaming failed.
    #[error("failed to write {}: {source}", path.display())]
    Io {
        /// File being written.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },
    /// The CSV encoder rejected a row.
    #[error("failed to encode csv for {}: {source}", path.display())]
    Csv {
        /// File being written.
        path: PathBuf,
        /// Encoder failure.
        #[source]
        source: ::csv::Error,
    },
}

/// Durable home of a record collection.
pub trait RecordBackend: Send {
    /// Reads the full collection. A store that does not exist yet is empty.
    fn load(&self) -> Result<RecordCollection, LoadError>;
    /// Replaces the stored collection with `collection`.
    fn save(&mut self, collection: &RecordCollection) -> Result<(), SaveError>;
}
