//! Connector
//!
//! Composition root of the client runtime: owns identity assignment, the
//! table registry, and exposes the request executor's operations to callers.
//!
//! ## Identity state machine
//!
//! ```text
//! UNASSIGNED (sentinel -1) ──handshake──▶ ASSIGNED (server-issued ID)
//! ```
//!
//! The transition happens at most once, guarded by a lock around the
//! check-and-set; racing callers serialize through the lock and all observe
//! the same final ID. Once assigned, the ID is read-only for the connector's
//! remaining lifetime.

use std::fmt;
use std::io::Read;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::cache::{InvalidationBroadcaster, InvalidationSink, Table, TableRegistry};
use crate::cancel::CancelToken;
use crate::config::Config;
use crate::error::{HostlinkError, Result};
use crate::executor::{RequestExecutor, RequestHandler, ScalarRequest, UpdateRequest};
use crate::network::{ConnectionSource, TcpConnectionSource};
use crate::protocol::{
    read_bool, read_compressed_int, read_float, read_long, read_short, read_string, CommandId,
    InvalidateList, Param, TableId,
};

/// Server-assigned numeric identity of one connector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectorId(pub i64);

impl ConnectorId {
    /// Sentinel carried until the first successful handshake
    pub const UNASSIGNED: ConnectorId = ConnectorId(-1);

    pub fn is_assigned(&self) -> bool {
        *self != ConnectorId::UNASSIGNED
    }
}

impl fmt::Display for ConnectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Client runtime for one server: pooled protocol exchanges plus the
/// coherent table caches they keep up to date
pub struct Connector {
    config: Config,
    executor: RequestExecutor,
    registry: Arc<TableRegistry>,
    broadcaster: Arc<InvalidationBroadcaster>,
    id: Mutex<ConnectorId>,
}

impl Connector {
    /// Build a connector over an explicit connection source
    ///
    /// `tables` must be densely numbered; it becomes the registry for this
    /// connector's entire lifetime.
    pub fn new(
        config: Config,
        source: Arc<dyn ConnectionSource>,
        tables: Vec<Arc<dyn Table>>,
    ) -> Result<Self> {
        Self::with_cancel(config, source, tables, CancelToken::new())
    }

    /// Build a connector with an injected cancellation token
    pub fn with_cancel(
        config: Config,
        source: Arc<dyn ConnectionSource>,
        tables: Vec<Arc<dyn Table>>,
        cancel: CancelToken,
    ) -> Result<Self> {
        let registry = Arc::new(TableRegistry::new(tables)?);
        let broadcaster = Arc::new(InvalidationBroadcaster::new(registry.clone()));
        let executor = RequestExecutor::new(source, broadcaster.clone(), cancel);
        Ok(Self {
            config,
            executor,
            registry,
            broadcaster,
            id: Mutex::new(ConnectorId::UNASSIGNED),
        })
    }

    /// Build a connector with a TCP pool per the config
    pub fn connect(config: Config, tables: Vec<Arc<dyn Table>>) -> Result<Self> {
        let source = Arc::new(TcpConnectionSource::new(config.clone()));
        Self::new(config, source, tables)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The cancellation token governing this connector's requests
    pub fn cancel_token(&self) -> &CancelToken {
        self.executor.cancel_token()
    }

    // =========================================================================
    // Identity
    // =========================================================================

    /// This connector's server-assigned ID, performing the handshake on
    /// first call
    ///
    /// The identity lock is held across the handshake round-trip so racing
    /// callers serialize and exactly one assignment wins.
    pub fn connector_id(&self) -> Result<ConnectorId> {
        let mut id = self.id.lock();
        if id.is_assigned() {
            return Ok(*id);
        }

        let username = Param::Str(self.config.connect_username.clone());
        let mut request = ScalarRequest::new(
            CommandId::GET_CONNECTOR_ID,
            std::slice::from_ref(&username),
            |input| read_long(input),
        );
        let assigned = self.executor.execute(&mut request, true)?;
        if assigned < 0 {
            return Err(HostlinkError::Protocol(format!(
                "Server assigned invalid connector ID: {}",
                assigned
            )));
        }

        *id = ConnectorId(assigned);
        tracing::debug!("Assigned connector ID {}", *id);
        Ok(*id)
    }

    // =========================================================================
    // Requests
    // =========================================================================

    /// Run a custom request through the retry loop
    pub fn execute<H: RequestHandler>(&self, handler: &mut H, allow_retry: bool) -> Result<H::Output> {
        self.executor.execute(handler, allow_retry)
    }

    /// Query returning a small integer
    pub fn query_int(&self, command: CommandId, params: &[Param], allow_retry: bool) -> Result<i32> {
        self.query(command, params, |input| read_compressed_int(input), allow_retry)
    }

    /// Query returning a long
    pub fn query_long(&self, command: CommandId, params: &[Param], allow_retry: bool) -> Result<i64> {
        self.query(command, params, |input| read_long(input), allow_retry)
    }

    /// Query returning a short
    pub fn query_short(&self, command: CommandId, params: &[Param], allow_retry: bool) -> Result<i16> {
        self.query(command, params, |input| read_short(input), allow_retry)
    }

    /// Query returning a boolean
    pub fn query_bool(&self, command: CommandId, params: &[Param], allow_retry: bool) -> Result<bool> {
        self.query(command, params, |input| read_bool(input), allow_retry)
    }

    /// Query returning a float
    pub fn query_float(&self, command: CommandId, params: &[Param], allow_retry: bool) -> Result<f32> {
        self.query(command, params, |input| read_float(input), allow_retry)
    }

    /// Query returning a bounded string
    pub fn query_string(
        &self,
        command: CommandId,
        params: &[Param],
        allow_retry: bool,
    ) -> Result<String> {
        self.query(command, params, |input| read_string(input), allow_retry)
    }

    /// Write command: no payload back; the trailing invalidation list is
    /// applied to the caches before this returns
    pub fn update(&self, command: CommandId, params: &[Param], allow_retry: bool) -> Result<()> {
        let mut request = UpdateRequest::new(command, params);
        self.executor.execute(&mut request, allow_retry)
    }

    /// Health check
    pub fn ping(&self) -> Result<()> {
        self.query(CommandId::PING, &[], decode_unit, true)
    }

    fn query<T>(
        &self,
        command: CommandId,
        params: &[Param],
        decode: fn(&mut dyn Read) -> Result<T>,
        allow_retry: bool,
    ) -> Result<T> {
        let mut request = ScalarRequest::new(command, params, decode);
        self.executor.execute(&mut request, allow_retry)
    }

    // =========================================================================
    // Tables & Invalidation
    // =========================================================================

    /// Look up one table cache by ID (bounds-checked)
    pub fn table(&self, id: TableId) -> Result<Arc<dyn Table>> {
        Ok(self.registry.by_id(id)?.clone())
    }

    pub fn registry(&self) -> &Arc<TableRegistry> {
        &self.registry
    }

    /// Administrative manual invalidation of one table, through the same
    /// two-phase clear-then-notify path server pushes take
    pub fn invalidate(&self, table: TableId, scope: Option<&str>) -> Result<()> {
        if let Some(scope) = scope {
            tracing::debug!("Manual invalidation of table {} (scope: {})", table, scope);
        } else {
            tracing::debug!("Manual invalidation of table {}", table);
        }
        self.broadcaster.apply(&InvalidateList(vec![table]))
    }

    /// Ask the server to broadcast an invalidation for one table; the
    /// response's invalidation list flows through the standard apply path
    pub fn invalidate_remote(&self, table: TableId, scope: Option<&str>) -> Result<()> {
        let params = [
            Param::Int(table.0 as i32),
            Param::Str(scope.unwrap_or("").to_string()),
        ];
        self.update(CommandId::INVALIDATE_TABLE, &params, true)
    }
}

fn decode_unit(_input: &mut dyn Read) -> Result<()> {
    Ok(())
}
