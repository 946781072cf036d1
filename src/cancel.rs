//! Cooperative cancellation
//!
//! A request in flight blocks the calling thread while waiting on the pool,
//! on socket I/O, or in a backoff sleep. The token lets another thread abort
//! the pool wait and the backoff path: the executor checks it at the top of
//! every retry iteration, the pool re-checks it while parked for a free slot,
//! and backoff sleeps go through it so a cancel wakes the sleeper immediately.
//!
//! Once cancelled a token stays cancelled, so callers can observe the flag
//! after the `Cancelled` error surfaces.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::error::{HostlinkError, Result};

/// Shared cancellation flag with an interruptible sleep
///
/// Cloning is cheap; clones observe the same flag.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    cancelled: Mutex<bool>,
    wake: Condvar,
}

impl CancelToken {
    /// Create a fresh, un-cancelled token
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag and wake any thread sleeping on this token
    pub fn cancel(&self) {
        let mut cancelled = self.inner.cancelled.lock();
        *cancelled = true;
        self.inner.wake.notify_all();
    }

    /// Whether the token has been cancelled
    pub fn is_cancelled(&self) -> bool {
        *self.inner.cancelled.lock()
    }

    /// Fail with `Cancelled` if the token is set
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(HostlinkError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Sleep for `duration`, aborting with `Cancelled` if the token is set
    /// before or during the sleep
    pub fn sleep(&self, duration: Duration) -> Result<()> {
        let deadline = Instant::now() + duration;
        let mut cancelled = self.inner.cancelled.lock();
        loop {
            if *cancelled {
                return Err(HostlinkError::Cancelled);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(());
            }
            // Spurious wakeups loop back around until the deadline passes
            self.inner.wake.wait_for(&mut cancelled, remaining);
        }
    }
}
