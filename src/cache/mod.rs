//! Cache Module
//!
//! Client-side mirrors of server-side entity collections: the `Table`
//! contract, the generic row cache with lazy secondary indexes, the dense
//! table registry, and the two-phase invalidation broadcaster.

mod broadcast;
mod index;
mod registry;
mod table;

pub use broadcast::{InvalidationBroadcaster, InvalidationSink};
pub use index::{IndexReset, UniqueIndex};
pub use registry::TableRegistry;
pub use table::{CachedTable, Row, RowLoader, Table, TableListener};
