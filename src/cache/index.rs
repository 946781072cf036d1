//! Secondary indexes
//!
//! A unique index maps a natural key (e.g. a name scoped to an owning
//! parent) to one row. Indexes are built lazily from the table's current
//! snapshot on the first keyed lookup after a clear, using the same explicit
//! three-state machine as the row cache. After a successful build, lookups
//! clone an `Arc` snapshot and never touch the build path.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::error::{HostlinkError, Result};

use super::table::{CachedTable, Row, Table};

/// Reset hook the owning table invokes from `clear_cache`
pub trait IndexReset: Send + Sync {
    /// Drop the built map so the index rebuilds lazily on next use
    fn reset(&self);
}

enum IndexState<K, R> {
    Empty,
    Building,
    Ready(Arc<HashMap<K, R>>),
}

struct IndexCell<K, R> {
    state: IndexState<K, R>,
    epoch: u64,
}

/// Lazily-built unique secondary index over one table
///
/// A duplicate natural key during a build is a local invariant violation and
/// fails with a consistency error rather than silently overwriting.
pub struct UniqueIndex<R: Row, K> {
    name: String,
    extract: Box<dyn Fn(&R) -> K + Send + Sync>,
    cell: Mutex<IndexCell<K, R>>,
    built: Condvar,
}

impl<R, K> UniqueIndex<R, K>
where
    R: Row,
    K: Clone + Eq + Hash + Send + Sync + 'static,
{
    pub(super) fn new(
        name: impl Into<String>,
        extract: impl Fn(&R) -> K + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            extract: Box::new(extract),
            cell: Mutex::new(IndexCell {
                state: IndexState::Empty,
                epoch: 0,
            }),
            built: Condvar::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up one row by natural key, building the index first if needed
    pub fn get(&self, table: &CachedTable<R>, key: &K) -> Result<Option<R>> {
        let map = self.snapshot(table)?;
        Ok(map.get(key).cloned())
    }

    /// Whether the index is currently built
    pub fn is_built(&self) -> bool {
        matches!(self.cell.lock().state, IndexState::Ready(_))
    }

    fn snapshot(&self, table: &CachedTable<R>) -> Result<Arc<HashMap<K, R>>> {
        let mut cell = self.cell.lock();
        loop {
            if let IndexState::Ready(map) = &cell.state {
                return Ok(map.clone());
            }
            if matches!(cell.state, IndexState::Empty) {
                break;
            }
            self.built.wait(&mut cell);
        }
        cell.state = IndexState::Building;
        let build_epoch = cell.epoch;
        drop(cell);

        let built = self.build(table);

        let mut cell = self.cell.lock();
        match built {
            Ok(map) => {
                if cell.epoch == build_epoch {
                    cell.state = IndexState::Ready(map.clone());
                }
                self.built.notify_all();
                Ok(map)
            }
            Err(e) => {
                if cell.epoch == build_epoch {
                    cell.state = IndexState::Empty;
                }
                self.built.notify_all();
                Err(e)
            }
        }
    }

    /// One pass over the full row snapshot
    fn build(&self, table: &CachedTable<R>) -> Result<Arc<HashMap<K, R>>> {
        let rows = table.rows()?;
        let mut map = HashMap::with_capacity(rows.len());
        for row in rows.iter() {
            let key = (self.extract)(row);
            if map.insert(key, row.clone()).is_some() {
                return Err(HostlinkError::Consistency(format!(
                    "Duplicate key in unique index '{}' on table {}",
                    self.name,
                    table.table_id()
                )));
            }
        }
        tracing::trace!(
            "Built index '{}' on table {} ({} keys)",
            self.name,
            table.table_id(),
            map.len()
        );
        Ok(Arc::new(map))
    }
}

impl<R, K> IndexReset for UniqueIndex<R, K>
where
    R: Row,
    K: Clone + Eq + Hash + Send + Sync + 'static,
{
    fn reset(&self) {
        let mut cell = self.cell.lock();
        cell.epoch += 1;
        cell.state = IndexState::Empty;
        self.built.notify_all();
    }
}
