//! Command identifiers
//!
//! Every request opens with a command ID selecting the server operation.

use std::fmt;

/// Integer operation selector, first field of every request
///
/// The full command space is owned by the generated entity layer; only the
/// handful of IDs the core runtime itself issues are named here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandId(pub u16);

impl CommandId {
    /// Handshake: server assigns this connector its numeric identity
    pub const GET_CONNECTOR_ID: CommandId = CommandId(0x0001);

    /// Health check; response body is empty
    pub const PING: CommandId = CommandId(0x0002);

    /// Ask the server to broadcast an invalidation for one table
    pub const INVALIDATE_TABLE: CommandId = CommandId(0x0003);
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04x}", self.0)
    }
}
