//! Cache-Coherence Broadcaster
//!
//! Applies a server-issued invalidation list against the table registry in
//! strict two-phase order: every cache clear completes before any listener
//! notification begins. A listener triggered during phase 2 therefore never
//! observes a sibling table still holding stale rows.
//!
//! Ordering is guaranteed only within one `apply` call. Overlapping lists
//! from concurrent writers are applied without a cross-table lock.

use std::sync::Arc;

use crate::error::Result;
use crate::protocol::InvalidateList;

use super::registry::TableRegistry;

/// Consumer of decoded invalidation lists
///
/// The request executor hands every list it decodes here before running the
/// caller's post-release hook.
pub trait InvalidationSink: Send + Sync {
    fn apply(&self, list: &InvalidateList) -> Result<()>;
}

/// Two-phase (clear-then-notify) invalidation applier
pub struct InvalidationBroadcaster {
    registry: Arc<TableRegistry>,
}

impl InvalidationBroadcaster {
    pub fn new(registry: Arc<TableRegistry>) -> Self {
        Self { registry }
    }
}

impl InvalidationSink for InvalidationBroadcaster {
    fn apply(&self, list: &InvalidateList) -> Result<()> {
        if list.is_empty() {
            return Ok(());
        }

        // Resolve the whole list up front so a bad ID cannot leave the
        // registry half-cleared
        let mut tables = Vec::with_capacity(list.len());
        for id in list {
            tables.push(self.registry.by_id(*id)?);
        }

        tracing::debug!("Applying invalidation of {} table(s)", list.len());

        // Phase 1: clear every cache, in list order (duplicates as given)
        for table in &tables {
            table.clear_cache();
        }

        // Phase 2: notify listeners, in the same order
        for table in &tables {
            table.table_updated();
        }

        Ok(())
    }
}
