//! # Transport Abstraction
//!
//! A minimal, async interface for moving transaction frames to a remote node.
//!
//! ## Philosophy
//!
//! - **Byte-Oriented**: The Transport knows nothing about codes, values or
//!   descriptors. It moves an opaque frame to a target object and brings back
//!   an opaque reply frame.
//! - **Request-Response**: `transact` is the only call. Reference release is a
//!   notification, not a transaction, and never waits for an answer.
//! - **No Retries**: a failed transaction is reported once. Whether the call
//!   executed is for the layer above to judge.

use transact::ObjectId;

/// Failures of the communication path itself.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The target object no longer exists on the serving node.
    #[error("dead object {0}")]
    DeadObject(ObjectId),
    /// The serving side is unreachable or the connection was dropped.
    #[error("connection lost: {0}")]
    ConnectionLost(String),
    /// The frame exceeds the configured transaction limit.
    #[error("transaction of {len} bytes exceeds the {max} byte limit")]
    PayloadTooLarge { len: usize, max: usize },
    /// No reply arrived within the configured call timeout.
    #[error("transaction timed out")]
    Timeout,
}

pub type Result<T> = std::result::Result<T, TransportError>;

/// A path to the objects of one remote node.
///
/// This trait is designed to be object-safe (`Arc<dyn Transport>`).
#[async_trait::async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Delivers a transaction frame to `target` and waits for the reply frame.
    ///
    /// # Invariants
    /// - Returns the raw reply frame on success, whatever its status.
    /// - Returns `Err` only when the frame could not be delivered or answered.
    /// - Does not interpret the frame.
    async fn transact(&self, target: ObjectId, frame: Vec<u8>) -> Result<Vec<u8>>;

    /// Drops one reference to `target`. Fire-and-forget.
    fn release(&self, target: ObjectId);
}
