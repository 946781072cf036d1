//! Response definitions
//!
//! Status bytes and the invalidation list appended by write commands.

use std::fmt;
use std::ops::Deref;

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    /// Success; the command-specific body follows
    Done = 0x00,

    /// Server-reported failure; the shared error payload follows
    Error = 0x01,
}

/// Identifier of one client-side table cache
///
/// Dense: a table's ID equals its position in the [`TableRegistry`].
///
/// [`TableRegistry`]: crate::cache::TableRegistry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(pub u16);

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered sequence of table IDs signaling caches to drop after a write
///
/// Order is significant (the server emits dependency order) and duplicates
/// are preserved: the broadcaster processes the list exactly as received.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InvalidateList(pub Vec<TableId>);

impl InvalidateList {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TableId> {
        self.0.iter()
    }
}

impl Deref for InvalidateList {
    type Target = [TableId];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<TableId>> for InvalidateList {
    fn from(ids: Vec<TableId>) -> Self {
        InvalidateList(ids)
    }
}

impl<'a> IntoIterator for &'a InvalidateList {
    type Item = &'a TableId;
    type IntoIter = std::slice::Iter<'a, TableId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
