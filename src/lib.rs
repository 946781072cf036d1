//! # hostlink
//!
//! Client-side runtime of a remote hosting-management platform:
//! - Pooled TCP connections, one per logical exchange
//! - Custom binary RPC protocol with typed parameters
//! - Fixed-schedule retry/backoff with failure classification
//! - Client-side entity caches kept coherent by server-pushed invalidations
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Connector                             │
//! │           (identity, tables, request entry points)           │
//! └─────────┬──────────────────────────────────┬────────────────┘
//!           │                                  │
//! ┌─────────▼─────────┐              ┌─────────▼────────────────┐
//! │  RequestExecutor  │   on DONE    │  InvalidationBroadcaster │
//! │  (retry/backoff)  ├─────────────▶│  (clear-then-notify)     │
//! └─────────┬─────────┘              └─────────┬────────────────┘
//!           │                                  │
//! ┌─────────▼─────────┐              ┌─────────▼────────────────┐
//! │ ConnectionSource  │              │      TableRegistry       │
//! │   (TCP pool)      │              │   (CachedTable caches)   │
//! └───────────────────┘              └──────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod cache;
pub mod cancel;
pub mod connector;
pub mod executor;
pub mod network;
pub mod protocol;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use cache::{
    CachedTable, InvalidationBroadcaster, InvalidationSink, Row, RowLoader, Table, TableListener,
    TableRegistry, UniqueIndex,
};
pub use cancel::CancelToken;
pub use config::Config;
pub use connector::{Connector, ConnectorId};
pub use error::{HostlinkError, Result};
pub use executor::{RequestExecutor, RequestHandler, ScalarRequest, UpdateRequest};
pub use network::{Connection, ConnectionSource, TcpConnection, TcpConnectionSource};
pub use protocol::{CommandId, InvalidateList, Param, ProtocolVersion, Status, TableId};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of hostlink
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
