//! Request Executor
//!
//! Runs one logical request through the retry/backoff state machine:
//!
//! ```text
//! ATTEMPT → SEND_RECEIVE → SUCCESS
//!                        → RETRYABLE_FAILURE → DELAY → ATTEMPT
//!                        → FATAL_FAILURE
//! ```
//!
//! ## Guarantees
//! - Exactly one connection acquired and one released per attempt, success
//!   or failure; failed exchanges close the connection before release
//! - On success the connection is released before any cache invalidation,
//!   and the handler's post-release hook runs only after the two-phase
//!   invalidation apply completes
//! - Only transport failures are retried, and never the immediate-fail
//!   classified ones; cancellation aborts at the top of any iteration, while
//!   parked waiting on the pool, or mid-sleep

use std::sync::Arc;
use std::time::Duration;

use crate::cache::InvalidationSink;
use crate::cancel::CancelToken;
use crate::error::Result;
use crate::network::ConnectionSource;
use crate::protocol::ProtocolVersion;

use super::request::RequestHandler;
use super::retry::{is_immediate_fail, MAX_ATTEMPTS, RETRY_DELAYS_MS};

/// Orchestrates request attempts over pooled connections
///
/// All collaborators are injected so tests can substitute deterministic
/// fakes for the pool, the invalidation sink, and the cancellation token.
pub struct RequestExecutor {
    source: Arc<dyn ConnectionSource>,
    sink: Arc<dyn InvalidationSink>,
    cancel: CancelToken,
    version: ProtocolVersion,
}

impl RequestExecutor {
    pub fn new(
        source: Arc<dyn ConnectionSource>,
        sink: Arc<dyn InvalidationSink>,
        cancel: CancelToken,
    ) -> Self {
        Self {
            source,
            sink,
            cancel,
            version: ProtocolVersion::CURRENT,
        }
    }

    /// The cancellation token governing this executor's requests
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Run a request to completion, retrying transient transport failures
    ///
    /// With `allow_retry` the budget is 25 attempts (24 scheduled delays plus
    /// a final attempt); without it, exactly one.
    pub fn execute<H: RequestHandler>(&self, handler: &mut H, allow_retry: bool) -> Result<H::Output> {
        let attempts_allowed = if allow_retry { MAX_ATTEMPTS } else { 1 };
        let mut attempt = 1;

        loop {
            self.cancel.check()?;

            match self.attempt_once(handler) {
                Ok(output) => {
                    // Invalidations apply strictly after release and strictly
                    // before the caller's post-release hook
                    if let Some(list) = handler.take_invalidate_list() {
                        self.sink.apply(&list)?;
                    }
                    handler.after_release()?;
                    return Ok(output);
                }
                Err(err) => {
                    if !err.is_retryable() || is_immediate_fail(&err) || attempt >= attempts_allowed
                    {
                        return Err(err);
                    }

                    let delay_ms = RETRY_DELAYS_MS[attempt - 1];
                    tracing::debug!(
                        "Attempt {}/{} failed ({}); retrying in {} ms",
                        attempt,
                        attempts_allowed,
                        err,
                        delay_ms
                    );
                    if delay_ms > 0 {
                        self.cancel.sleep(Duration::from_millis(delay_ms))?;
                    }
                    attempt += 1;
                }
            }
        }
    }

    /// One attempt: acquire → send → receive → release
    ///
    /// The connection is released on every path; a failed exchange closes it
    /// first so the pool drops the possibly-corrupt channel.
    fn attempt_once<H: RequestHandler>(&self, handler: &mut H) -> Result<H::Output> {
        let mut conn = self.source.acquire(&self.cancel)?;

        let result = handler
            .write_request(self.version, conn.writer())
            .and_then(|_| handler.read_response(conn.reader()));

        if result.is_err() {
            conn.close();
        }
        self.source.release(conn);

        result
    }
}
