//! Retry policy
//!
//! Fixed attempt budget, fixed backoff schedule, and the message patterns
//! that disqualify a transport failure from being retried at all.

use crate::error::HostlinkError;

/// Attempts allowed when the caller permits retry: 24 scheduled delays plus
/// one final attempt
pub const MAX_ATTEMPTS: usize = 25;

/// Backoff schedule in milliseconds; index = failed attempt number - 1
pub const RETRY_DELAYS_MS: [u64; 24] = [
    0, 1, 2, 3, 4, 6, 8, 12, 16, 23, 32, 48, 64, 96, 128, 192, 256, 384, 512, 768, 1024, 1536,
    2048, 3072,
];

/// Transport failures carrying one of these messages are authentication
/// problems the server will reject identically on every attempt; retrying
/// them only wastes the backoff budget.
const IMMEDIATE_FAIL_PATTERNS: [&str; 5] = [
    "Connection attempted with invalid password",
    "Connection attempted with empty password",
    "Connection attempted with empty connect username",
    "Unable to find Administrator",
    "Not allowed to switch users",
];

/// Whether a failure must surface immediately regardless of attempts left
///
/// Only transport errors are ever retried, so only they are classified here.
pub fn is_immediate_fail(err: &HostlinkError) -> bool {
    match err {
        HostlinkError::Transport(io) => {
            let message = io.to_string();
            IMMEDIATE_FAIL_PATTERNS
                .iter()
                .any(|pattern| message.contains(pattern))
        }
        _ => false,
    }
}
