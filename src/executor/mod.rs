//! Executor Module
//!
//! Orchestrates one logical request: acquire connection → encode/send →
//! decode/receive → release connection → optional post-release callback.
//! Owns the retry/backoff state machine and failure classification.

mod executor;
mod request;
mod retry;

pub use executor::RequestExecutor;
pub use request::{RequestHandler, ScalarRequest, UpdateRequest};
pub use retry::{is_immediate_fail, MAX_ATTEMPTS, RETRY_DELAYS_MS};
