//! Connection Pool
//!
//! Supplies one connection per logical exchange and reclaims it afterward.
//!
//! ## Concurrency
//! - `idle` + `outstanding`: one Mutex; held only to pop/push, never across
//!   a connect or an exchange
//! - `available`: Condvar gating acquirers once `outstanding` hits the
//!   configured maximum

use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::cancel::CancelToken;
use crate::config::Config;
use crate::error::Result;

use super::{Connection, TcpConnection};

/// How often a parked acquirer re-checks the cancellation token
const CANCEL_POLL: Duration = Duration::from_millis(50);

/// Supplies a short-lived duplex channel per logical exchange
///
/// `acquire` and `release` must pair one-to-one: the executor releases every
/// connection it acquires, on success and on failure alike.
pub trait ConnectionSource: Send + Sync {
    /// Block until a connection is available, then hand it out
    ///
    /// Waiting is interruptible: a cancelled token fails the acquire with
    /// `Cancelled` instead of leaving the caller parked on a full pool.
    fn acquire(&self, cancel: &CancelToken) -> Result<Box<dyn Connection>>;

    /// Return a connection; closed connections are discarded, open ones may
    /// be reused
    fn release(&self, conn: Box<dyn Connection>);
}

/// Pooling TCP connection source
///
/// Reuses idle connections in LIFO order and caps concurrent use at
/// `Config::max_connections`; acquirers beyond the cap block until a release.
pub struct TcpConnectionSource {
    config: Config,
    state: Mutex<PoolState>,
    available: Condvar,
}

struct PoolState {
    /// Idle connections, most recently released last
    idle: Vec<Box<dyn Connection>>,

    /// Connections currently handed out
    outstanding: usize,
}

impl TcpConnectionSource {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: Mutex::new(PoolState {
                idle: Vec::new(),
                outstanding: 0,
            }),
            available: Condvar::new(),
        }
    }

    /// Number of idle pooled connections
    pub fn idle_count(&self) -> usize {
        self.state.lock().idle.len()
    }

    /// Number of connections currently handed out
    pub fn outstanding_count(&self) -> usize {
        self.state.lock().outstanding
    }
}

impl ConnectionSource for TcpConnectionSource {
    fn acquire(&self, cancel: &CancelToken) -> Result<Box<dyn Connection>> {
        cancel.check()?;

        let mut state = self.state.lock();
        while state.idle.is_empty() && state.outstanding >= self.config.max_connections {
            cancel.check()?;
            // Bounded wait: cancel() has no handle on this Condvar, so wake
            // periodically to observe the token
            self.available.wait_for(&mut state, CANCEL_POLL);
        }

        if let Some(conn) = state.idle.pop() {
            state.outstanding += 1;
            tracing::trace!(
                "Reusing pooled connection ({} outstanding)",
                state.outstanding
            );
            return Ok(conn);
        }

        // Reserve the slot before connecting so concurrent acquirers respect
        // the cap while the handshake is in flight
        state.outstanding += 1;
        drop(state);

        match TcpConnection::connect(&self.config) {
            Ok(conn) => Ok(Box::new(conn)),
            Err(e) => {
                let mut state = self.state.lock();
                state.outstanding -= 1;
                self.available.notify_one();
                Err(e)
            }
        }
    }

    fn release(&self, conn: Box<dyn Connection>) {
        let mut state = self.state.lock();
        state.outstanding -= 1;
        if conn.is_closed() {
            tracing::debug!("Discarding closed connection ({} idle)", state.idle.len());
        } else {
            state.idle.push(conn);
        }
        self.available.notify_one();
    }
}
