//! Runtime limits shared by nodes and transports.

use std::time::Duration;

/// Largest transaction frame accepted by default (1 MiB).
pub const DEFAULT_MAX_TRANSACTION_LEN: usize = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Frames longer than this are refused before they are sent, and rejected
    /// as malformed if they arrive anyway.
    pub max_transaction_len: usize,
    /// How long a caller waits for a reply. `None` waits until the transport
    /// itself fails.
    pub call_timeout: Option<Duration>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            max_transaction_len: DEFAULT_MAX_TRANSACTION_LEN,
            call_timeout: None,
        }
    }

    pub fn with_max_transaction_len(mut self, len: usize) -> Self {
        self.max_transaction_len = len;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
