use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{Mutex, mpsc, oneshot};
use tracing::{debug, info};

use crate::{
    config,
    core::{
        collection::StoreError,
        query::{self, PageResult, QueryError, SearchQuery},
    },
    persist::{LoadError, RecordBackend, SaveError},
    record::{PatchError, Record, RecordPatch, RecordSet},
    types::RecordId,
};

/// Failure of a store command.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Lookup or invariant failure in the collection.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Caller supplied an unusable query.
    #[error(transparent)]
    Query(#[from] QueryError),
    /// Caller supplied an unusable update body.
    #[error(transparent)]
    Patch(#[from] PatchError),
    /// The backing store could not be read.
    #[error(transparent)]
    Load(#[from] LoadError),
    /// The mutated collection could not be persisted.
    #[error(transparent)]
    Save(#[from] SaveError),
    /// The blocking I/O task panicked or was cancelled.
    #[error("store task failed: {0}")]
    Join(String),
    /// The runtime loop has stopped.
    #[error("store runtime is not running")]
    ChannelClosed,
}

/// Runtime tuning.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Capacity of the command channel.
    pub command_queue_bound: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            command_queue_bound: config::DEFAULT_QUEUE_BOUND,
        }
    }
}

/// Search hits plus the size of the collection they were drawn from, so a
/// caller can tell "no matches" from "no data".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    /// Records in the collection before filtering.
    pub total_records: usize,
    /// Matching records in id order.
    pub matches: RecordSet,
}

/// Cloneable handle to the store runtime.
#[derive(Clone)]
pub struct StoreHandle {
    cmd_tx: mpsc::Sender<Command>,
}

enum Command {
    List {
        page: usize,
        per_page: usize,
        resp: oneshot::Sender<Result<PageResult, RuntimeError>>,
    },
    Search {
        query: SearchQuery,
        resp: oneshot::Sender<Result<SearchOutcome, RuntimeError>>,
    },
    Update {
        id: RecordId,
        patch: Result<RecordPatch, PatchError>,
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
    Delete {
        id: RecordId,
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
    Shutdown {
        resp: oneshot::Sender<()>,
    },
}

type SharedBackend = Arc<Mutex<Box<dyn RecordBackend>>>;

/// Starts the store loop. Commands run one at a time, so every
/// load-mutate-save cycle is a single critical section over the backend.
pub fn spawn_store(backend: Box<dyn RecordBackend>, config: RuntimeConfig) -> StoreHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(config.command_queue_bound.max(1));
    let backend: SharedBackend = Arc::new(Mutex::new(backend));

    tokio::spawn(async move {
        while let Some(cmd) = cmd_rx.recv().await {
            if handle_command(cmd, &backend).await {
                break;
            }
        }
        debug!("store runtime stopped");
    });

    StoreHandle { cmd_tx }
}

impl StoreHandle {
    /// Loads the store and returns one page.
    pub async fn list(&self, page: usize, per_page: usize) -> Result<PageResult, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::List {
                page,
                per_page,
                resp: tx,
            })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Loads the store and filters it by name.
    pub async fn search(&self, query: SearchQuery) -> Result<SearchOutcome, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Search { query, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Applies `patch` to record `id` and persists the collection.
    pub async fn update(&self, id: RecordId, patch: RecordPatch) -> Result<(), RuntimeError> {
        self.update_parsed(id, Ok(patch)).await
    }

    /// Like [`StoreHandle::update`], but takes the outcome of parsing the
    /// request body. An unknown `id` is reported before a body error.
    pub async fn update_parsed(
        &self,
        id: RecordId,
        patch: Result<RecordPatch, PatchError>,
    ) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Update { id, patch, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Removes record `id` and persists the collection.
    pub async fn delete(&self, id: RecordId) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Delete { id, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Stops the loop after every queued command has been answered.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Shutdown { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }
}

async fn handle_command(cmd: Command, backend: &SharedBackend) -> bool {
    match cmd {
        Command::List {
            page,
            per_page,
            resp,
        } => {
            let res = run_blocking(backend, move |b| {
                let collection = b.load()?;
                Ok(query::paginate(&collection, page, per_page))
            })
            .await;
            if let Ok(result) = &res {
                info!(page, per_page, ids = ?result.data.ids(), "listed records");
            }
            let _ = resp.send(res);
        }
        Command::Search {
            query: filter,
            resp,
        } => {
            let res = run_blocking(backend, move |b| {
                let collection = b.load()?;
                let matches: Vec<Record> = query::search(&collection, &filter)?
                    .into_iter()
                    .cloned()
                    .collect();
                Ok(SearchOutcome {
                    total_records: collection.len(),
                    matches: RecordSet {
                        schema: collection.schema().clone(),
                        records: matches,
                    },
                })
            })
            .await;
            if let Ok(outcome) = &res {
                debug!(hits = outcome.matches.len(), "searched records");
            }
            let _ = resp.send(res);
        }
        Command::Update { id, patch, resp } => {
            let res = run_blocking(backend, move |b| {
                let mut collection = b.load()?;
                if !collection.contains(id) {
                    return Err(StoreError::NotFound(id).into());
                }
                let patch = patch?;
                let applied = patch.resolve(collection.schema()).len();
                collection.update_by_id(id, &patch)?;
                b.save(&collection)?;
                Ok(applied)
            })
            .await;
            if let Ok(applied) = &res {
                info!(id, fields = applied, "record updated");
            }
            let _ = resp.send(res.map(|_| ()));
        }
        Command::Delete { id, resp } => {
            let res = run_blocking(backend, move |b| {
                let mut collection = b.load()?;
                collection.delete_by_id(id)?;
                b.save(&collection)?;
                Ok(collection.len())
            })
            .await;
            if let Ok(remaining) = &res {
                info!(id, remaining, "record deleted");
            }
            let _ = resp.send(res.map(|_| ()));
        }
        Command::Shutdown { resp } => {
            let _ = resp.send(());
            return true;
        }
    }

    false
}

async fn run_blocking<T, F>(backend: &SharedBackend, f: F) -> Result<T, RuntimeError>
where
    T: Send + 'static,
    F: FnOnce(&mut Box<dyn RecordBackend>) -> Result<T, RuntimeError> + Send + 'static,
{
    let backend = Arc::clone(backend);
    tokio::task::spawn_blocking(move || {
        let mut guard = backend.blocking_lock();
        f(&mut guard)
    })
    .await
    .map_err(|e| RuntimeError::Join(e.to_string()))?
}
