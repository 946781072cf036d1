//! Network Module
//!
//! Connection handling: the duplex-channel contract the request executor
//! consumes, a TCP implementation, and the pooling connection source.

mod connection;
mod pool;

pub use connection::{Connection, TcpConnection};
pub use pool::{ConnectionSource, TcpConnectionSource};
