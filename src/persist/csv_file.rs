//! CSV file backend with write-to-temp-then-rename saves.

use std::{
    fs::{self, File},
    io::{self, BufReader},
    path::{Path, PathBuf},
};

use csv::{ReaderBuilder, WriterBuilder};
use tracing::{debug, warn};

use crate::{core::collection::RecordCollection, types::FieldValue};

use super::{LoadError, RecordBackend, SaveError};

/// CSV implementation of [`crate::persist::RecordBackend`].
#[derive(Debug, Clone)]
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    /// Store backed by the CSV file at `path`. Nothing is touched until the
    /// first load or save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parses the backing file.
    ///
    /// A missing file is an empty collection. Ragged rows, a header without
    /// `id`, and duplicate ids are load errors. Rows whose id cannot be
    /// coerced are detached and logged.
    pub fn load(&self) -> Result<RecordCollection, LoadError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "store file absent, starting empty");
                return Ok(RecordCollection::empty());
            }
            Err(source) => {
                return Err(LoadError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_reader(BufReader::new(file));

        let header: Vec<String> = reader
            .headers()
            .map_err(|source| self.csv_load_error(source))?
            .iter()
            .map(str::to_owned)
            .collect();

        let mut rows = Vec::new();
        for row in reader.records() {
            let row = row.map_err(|source| self.csv_load_error(source))?;
            rows.push(row.iter().map(str::to_owned).collect::<Vec<_>>());
        }

        let collection =
            RecordCollection::from_rows(header, rows).map_err(|source| LoadError::Invalid {
                path: self.path.clone(),
                source,
            })?;

        let detached = collection.detached_rows().len();
        if detached > 0 {
            warn!(
                path = %self.path.display(),
                detached,
                "rows with a non-integer id are not addressable"
            );
        }
        Ok(collection)
    }

    /// Writes the header, the records in id order, then detached rows.
    ///
    /// Data goes to a sibling temp file that is synced and renamed over the
    /// target, so a failure leaves the previous file intact. A collection
    /// without a schema has never been written and leaves the disk untouched.
    pub fn save(&self, collection: &RecordCollection) -> Result<(), SaveError> {
        if collection.schema().is_empty() {
            debug!(path = %self.path.display(), "no schema to persist, skipping save");
            return Ok(());
        }

        let tmp = self.temp_path();
        let result = self
            .write_file(&tmp, collection)
            .and_then(|()| {
                fs::rename(&tmp, &self.path).map_err(|source| SaveError::Io {
                    path: self.path.clone(),
                    source,
                })
            });
        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result
    }

    fn write_file(&self, tmp: &Path, collection: &RecordCollection) -> Result<(), SaveError> {
        let io_err = |source| SaveError::Io {
            path: tmp.to_path_buf(),
            source,
        };
        let csv_err = |source| SaveError::Csv {
            path: tmp.to_path_buf(),
            source,
        };

        let file = File::create(tmp).map_err(io_err)?;
        let mut writer = WriterBuilder::new().from_writer(file);

        writer
            .write_record(collection.schema().columns())
            .map_err(csv_err)?;
        for record in collection.iter() {
            writer.write_record(cells(record.values())).map_err(csv_err)?;
        }
        for row in collection.detached_rows() {
            writer.write_record(cells(row)).map_err(csv_err)?;
        }

        let file = writer
            .into_inner()
            .map_err(|err| io_err(err.into_error()))?;
        file.sync_all().map_err(io_err)?;
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "store.csv".to_string());
        self.path.with_file_name(format!(".{name}.tmp"))
    }

    fn csv_load_error(&self, source: csv::Error) -> LoadError {
        LoadError::Csv {
            path: self.path.clone(),
            source,
        }
    }
}

fn cells(values: &[FieldValue]) -> impl Iterator<Item = String> + '_ {
    values.iter().map(|v| v.to_cell().into_owned())
}

impl RecordBackend for CsvStore {
    fn load(&self) -> Result<RecordCollection, LoadError> {
        CsvStore::load(self)
    }

    fn save(&mut self, collection: &RecordCollection) -> Result<(), SaveError> {
        CsvStore::save(self, collection)
    }
}
