//! Table Registry
//!
//! Fixed, densely-numbered collection of table caches, looked up by ID.

use std::sync::Arc;

use crate::error::{HostlinkError, Result};
use crate::protocol::TableId;

use super::table::Table;

/// All table caches owned by one connector, indexed by table ID
///
/// Built once when the connector is constructed; tables live until the
/// connector is dropped.
#[derive(Debug)]
pub struct TableRegistry {
    tables: Vec<Arc<dyn Table>>,
}

impl TableRegistry {
    /// Build the registry, enforcing dense numbering
    ///
    /// Each table's ID must equal its position; anything else is a wiring
    /// defect in the generated entity layer.
    pub fn new(tables: Vec<Arc<dyn Table>>) -> Result<Self> {
        for (position, table) in tables.iter().enumerate() {
            if table.table_id().0 as usize != position {
                return Err(HostlinkError::InvalidArgument(format!(
                    "Table at position {} reports ID {}",
                    position,
                    table.table_id()
                )));
            }
        }
        Ok(Self { tables })
    }

    /// Bounds-checked lookup by table ID
    ///
    /// An out-of-range ID is a caller error, not a transport failure.
    pub fn by_id(&self, id: TableId) -> Result<&Arc<dyn Table>> {
        self.tables.get(id.0 as usize).ok_or_else(|| {
            HostlinkError::InvalidArgument(format!(
                "Table ID {} out of range (registry holds {})",
                id,
                self.tables.len()
            ))
        })
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arc<dyn Table>> {
        self.tables.iter()
    }
}
