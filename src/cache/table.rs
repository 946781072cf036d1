//! Table cache
//!
//! A `CachedTable` mirrors one server-side entity collection: an optional
//! full row cache (absent or fully populated, never partial) keyed by primary
//! key, lazily-built secondary indexes, and registered change listeners.
//!
//! ## Concurrency
//!
//! The row cache is an explicit three-state machine (`Empty` → `Building` →
//! `Ready`) behind one Mutex and a Condvar: concurrent readers of a
//! just-cleared table trigger exactly one population pass, with late arrivals
//! parked on the Condvar until the build publishes. A clear racing an
//! in-flight build bumps the epoch so the stale build is handed to its caller
//! but never published.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex, RwLock};

use crate::error::{HostlinkError, Result};
use crate::protocol::TableId;

use super::index::{IndexReset, UniqueIndex};

/// Change listener notified after a table's cache has been invalidated
pub trait TableListener: Send + Sync {
    fn table_updated(&self, table: TableId);
}

/// Client-side cache of one server-side entity collection
///
/// Implemented by every generated entity table; the invalidation broadcaster
/// drives `clear_cache` and `table_updated` in its strict two-phase order.
pub trait Table: Send + Sync {
    /// Stable integer ID, equal to this table's position in the registry
    fn table_id(&self) -> TableId;

    /// Drop the row cache and reset all secondary indexes to unbuilt
    fn clear_cache(&self);

    /// Fan out to registered listeners; performs no cache mutation itself
    fn table_updated(&self);
}

impl std::fmt::Debug for dyn Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("table_id", &self.table_id())
            .finish()
    }
}

/// One cached row; cloned out of the cache on lookup
pub trait Row: Clone + Send + Sync + 'static {
    type Key: Clone + Eq + Hash + Send + Sync + 'static;

    /// Primary key, unique within the table
    fn key(&self) -> Self::Key;
}

/// Fetches the full row snapshot for one table from the server
pub trait RowLoader<R: Row>: Send + Sync {
    fn load_all(&self) -> Result<Vec<R>>;
}

enum CacheState<R: Row> {
    Empty,
    Building,
    Ready {
        rows: Arc<Vec<R>>,
        by_key: Arc<HashMap<R::Key, R>>,
    },
}

struct CacheCell<R: Row> {
    state: CacheState<R>,

    /// Bumped by every clear; a build started under an older epoch is
    /// discarded instead of published
    epoch: u64,
}

/// Generic row cache implementing the [`Table`] contract
pub struct CachedTable<R: Row> {
    id: TableId,
    loader: Arc<dyn RowLoader<R>>,
    cell: Mutex<CacheCell<R>>,
    built: Condvar,
    indexes: Mutex<Vec<Arc<dyn IndexReset>>>,
    listeners: RwLock<Vec<Arc<dyn TableListener>>>,
}

impl<R: Row> CachedTable<R> {
    pub fn new(id: TableId, loader: Arc<dyn RowLoader<R>>) -> Self {
        Self {
            id,
            loader,
            cell: Mutex::new(CacheCell {
                state: CacheState::Empty,
                epoch: 0,
            }),
            built: Condvar::new(),
            indexes: Mutex::new(Vec::new()),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Look up one row by primary key, populating the cache first if empty
    ///
    /// Not-found is a normal outcome, not an error.
    pub fn get(&self, key: &R::Key) -> Result<Option<R>> {
        let (_, by_key) = self.populate()?;
        Ok(by_key.get(key).cloned())
    }

    /// Full snapshot, populating the cache first if empty
    pub fn rows(&self) -> Result<Arc<Vec<R>>> {
        let (rows, _) = self.populate()?;
        Ok(rows)
    }

    /// Create and register a lazily-built unique secondary index
    ///
    /// The index rebuilds on first keyed lookup after every cache clear.
    pub fn unique_index<K>(
        &self,
        name: impl Into<String>,
        extract: impl Fn(&R) -> K + Send + Sync + 'static,
    ) -> Arc<UniqueIndex<R, K>>
    where
        K: Clone + Eq + Hash + Send + Sync + 'static,
    {
        let index = Arc::new(UniqueIndex::new(name, extract));
        self.indexes.lock().push(index.clone() as Arc<dyn IndexReset>);
        index
    }

    pub fn add_listener(&self, listener: Arc<dyn TableListener>) {
        self.listeners.write().push(listener);
    }

    pub fn remove_listener(&self, listener: &Arc<dyn TableListener>) {
        // Compare data pointers only; vtable pointers are not stable
        let target = Arc::as_ptr(listener) as *const ();
        self.listeners
            .write()
            .retain(|l| Arc::as_ptr(l) as *const () != target);
    }

    /// Whether the row cache is currently populated
    pub fn is_loaded(&self) -> bool {
        matches!(self.cell.lock().state, CacheState::Ready { .. })
    }

    /// Return the current snapshot, building it if this caller wins the race
    #[allow(clippy::type_complexity)]
    fn populate(&self) -> Result<(Arc<Vec<R>>, Arc<HashMap<R::Key, R>>)> {
        let mut cell = self.cell.lock();
        loop {
            if let CacheState::Ready { rows, by_key } = &cell.state {
                return Ok((rows.clone(), by_key.clone()));
            }
            if matches!(cell.state, CacheState::Empty) {
                break;
            }
            // Another caller is building; park until it publishes or fails
            self.built.wait(&mut cell);
        }
        cell.state = CacheState::Building;
        let build_epoch = cell.epoch;
        drop(cell);

        let loaded = self.load_snapshot();

        let mut cell = self.cell.lock();
        match loaded {
            Ok((rows, by_key)) => {
                if cell.epoch == build_epoch {
                    cell.state = CacheState::Ready {
                        rows: rows.clone(),
                        by_key: by_key.clone(),
                    };
                    tracing::trace!("Populated table {} with {} rows", self.id, rows.len());
                }
                // On an epoch mismatch a clear raced the load: the caller
                // still gets its consistent snapshot, but nothing is cached
                self.built.notify_all();
                Ok((rows, by_key))
            }
            Err(e) => {
                if cell.epoch == build_epoch {
                    cell.state = CacheState::Empty;
                }
                self.built.notify_all();
                Err(e)
            }
        }
    }

    #[allow(clippy::type_complexity)]
    fn load_snapshot(&self) -> Result<(Arc<Vec<R>>, Arc<HashMap<R::Key, R>>)> {
        let rows = self.loader.load_all()?;
        let mut by_key = HashMap::with_capacity(rows.len());
        for row in &rows {
            if by_key.insert(row.key(), row.clone()).is_some() {
                return Err(HostlinkError::Consistency(format!(
                    "Duplicate primary key in table {}",
                    self.id
                )));
            }
        }
        Ok((Arc::new(rows), Arc::new(by_key)))
    }
}

impl<R: Row> Table for CachedTable<R> {
    fn table_id(&self) -> TableId {
        self.id
    }

    fn clear_cache(&self) {
        {
            let mut cell = self.cell.lock();
            cell.epoch += 1;
            cell.state = CacheState::Empty;
            // Wake parked readers; one of them becomes the next builder
            self.built.notify_all();
        }

        let indexes = self.indexes.lock().clone();
        for index in indexes {
            index.reset();
        }
        tracing::trace!("Cleared cache for table {}", self.id);
    }

    fn table_updated(&self) {
        let listeners = self.listeners.read().clone();
        for listener in listeners {
            listener.table_updated(self.id);
        }
    }
}
