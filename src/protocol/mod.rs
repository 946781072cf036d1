//! Protocol Module
//!
//! Defines the binary wire protocol spoken with the hosting-management server.
//!
//! ## Protocol Format (V1 - Stream Binary)
//!
//! ### Request Format
//! ```text
//! ┌──────────────────┬───────────────────────────────────────┐
//! │ CommandId (cint) │  Param 0 │ Param 1 │ ... │ Param N    │
//! └──────────────────┴───────────────────────────────────────┘
//! ```
//!
//! Parameters carry no on-wire type tag: every command has a fixed signature
//! known to both ends, so each parameter is written back-to-back in the
//! canonical encoding of its variant (see [`Param`]).
//!
//! ### Response Format
//! ```text
//! ┌───────────┬─────────────────────────┬─────────────────────┐
//! │ Status(1) │  command-specific body  │ InvalidateList (*)  │
//! └───────────┴─────────────────────────┴─────────────────────┘
//! ```
//!
//! (*) only present on commands that mutate server state: a sequence of
//! compressed-int table IDs terminated by `-1`.
//!
//! ### Status Codes
//! - 0x00: DONE  - body follows
//! - 0x01: ERROR - shared error payload follows (cint code + string message)
//!
//! Any other status byte is a protocol error (version mismatch or server
//! defect) and is never retried.
//!
//! ### Compressed Integers ("cint")
//! Variable-length signed 32-bit integers: ZigZag-mapped then LEB128 encoded,
//! so small magnitudes of either sign occupy one byte (`-1` encodes as 0x01).
//! Every command ID, length prefix, small integer, and table ID on the wire
//! uses this encoding.

mod codec;
mod command;
mod param;
mod response;

pub use codec::{
    encode_request, read_bool, read_bytes, read_compressed_int, read_done, read_float,
    read_invalidate_list, read_long, read_long_string, read_server_error, read_short,
    read_status, read_string, write_compressed_int, write_request, MAX_BLOCK_SIZE,
    MAX_STRING_LEN,
};
pub use command::CommandId;
pub use param::{Param, ProtocolVersion, WireSerialize};
pub use response::{InvalidateList, Status, TableId};
