//! # Remote Exceptions
//!
//! A service-level failure that crossed the process boundary. On the wire it
//! is two parcel strings, `[kind][message]`, so the caller sees exactly the
//! kind and message the service raised.

use parcel::ParcelReader;
use parcel::ParcelWriter;

use crate::error::Result;

/// The caller lacks the permission the operation needs.
pub const SECURITY: &str = "SecurityException";
/// An argument was rejected by the service.
pub const ILLEGAL_ARGUMENT: &str = "IllegalArgumentException";
/// The target was not in a state that allows the operation.
pub const ILLEGAL_STATE: &str = "IllegalStateException";
/// Kind used for sanitized failures the method never declared.
pub const REMOTE: &str = "RemoteException";

/// Message carried by a sanitized failure.
pub const SANITIZED_MESSAGE: &str = "internal error";

/// A failure raised by a remote service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct RemoteException {
    pub kind: String,
    pub message: String,
}

impl RemoteException {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self { kind: kind.into(), message: message.into() }
    }

    pub fn security(message: impl Into<String>) -> Self {
        Self::new(SECURITY, message)
    }

    pub fn illegal_argument(message: impl Into<String>) -> Self {
        Self::new(ILLEGAL_ARGUMENT, message)
    }

    pub fn illegal_state(message: impl Into<String>) -> Self {
        Self::new(ILLEGAL_STATE, message)
    }

    /// The generic failure that replaces anything a method did not declare.
    pub fn sanitized() -> Self {
        Self::new(REMOTE, SANITIZED_MESSAGE)
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut w = ParcelWriter::new();
        w.str(&self.kind)?;
        w.str(&self.message)?;
        Ok(w.into_bytes()?)
    }

    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = ParcelReader::new(payload);
        let kind = r.str()?.to_string();
        let message = r.str()?.to_string();
        r.finish()?;
        Ok(Self { kind, message })
    }
}
