//! Request parameters
//!
//! A closed tagged-variant type for the heterogeneous parameter list of a
//! command. Each variant owns its wire encoding, so encoding is exhaustively
//! checkable at compile time and no parameter can be absent.

use std::fmt;
use std::sync::Arc;

use bytes::BytesMut;

use crate::error::Result;

/// Protocol version tag handed to composite values when they serialize
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProtocolVersion(pub u16);

impl ProtocolVersion {
    /// Version spoken by this runtime
    pub const CURRENT: ProtocolVersion = ProtocolVersion(1);
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// A self-describing composite value that writes its own wire form
///
/// Implementations must produce a stable encoding for every protocol version
/// they claim to support.
pub trait WireSerialize: fmt::Debug + Send + Sync {
    fn write_wire(&self, version: ProtocolVersion, out: &mut BytesMut) -> Result<()>;
}

/// One typed request parameter
///
/// ## Wire encodings
/// - `Int`     - compressed-int
/// - `Long`    - 8 bytes, big-endian
/// - `Short`   - 2 bytes, big-endian
/// - `Bool`    - 1 byte, 0x00 or 0x01
/// - `Float`   - 4 bytes, big-endian IEEE-754 bits
/// - `Str`     - compressed-int byte length + UTF-8 (length < 64 KiB)
/// - `LongStr` - compressed-int byte length + UTF-8 (unbounded)
/// - `Bytes`   - compressed-int length + raw bytes
/// - `Composite` - recursive [`WireSerialize::write_wire`]
#[derive(Debug, Clone)]
pub enum Param {
    /// Small integer (compressed on the wire)
    Int(i32),

    /// 64-bit integer
    Long(i64),

    /// 16-bit integer
    Short(i16),

    /// Boolean
    Bool(bool),

    /// 32-bit float
    Float(f32),

    /// Bounded string (UTF-8 form must stay under 64 KiB)
    Str(String),

    /// Unbounded string
    LongStr(String),

    /// Raw byte block
    Bytes(Vec<u8>),

    /// Composite value serializing itself for a protocol version
    Composite(Arc<dyn WireSerialize>),
}

impl Param {
    /// Short name of the variant, for error messages and traces
    pub fn type_name(&self) -> &'static str {
        match self {
            Param::Int(_) => "int",
            Param::Long(_) => "long",
            Param::Short(_) => "short",
            Param::Bool(_) => "bool",
            Param::Float(_) => "float",
            Param::Str(_) => "string",
            Param::LongStr(_) => "long_string",
            Param::Bytes(_) => "bytes",
            Param::Composite(_) => "composite",
        }
    }
}

impl From<i32> for Param {
    fn from(v: i32) -> Self {
        Param::Int(v)
    }
}

impl From<i64> for Param {
    fn from(v: i64) -> Self {
        Param::Long(v)
    }
}

impl From<i16> for Param {
    fn from(v: i16) -> Self {
        Param::Short(v)
    }
}

impl From<bool> for Param {
    fn from(v: bool) -> Self {
        Param::Bool(v)
    }
}

impl From<f32> for Param {
    fn from(v: f32) -> Self {
        Param::Float(v)
    }
}

impl From<&str> for Param {
    fn from(v: &str) -> Self {
        Param::Str(v.to_string())
    }
}

impl From<String> for Param {
    fn from(v: String) -> Self {
        Param::Str(v)
    }
}

impl From<Vec<u8>> for Param {
    fn from(v: Vec<u8>) -> Self {
        Param::Bytes(v)
    }
}
