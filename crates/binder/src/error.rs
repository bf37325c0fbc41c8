//! # Error Definitions
//!
//! Everything a caller can observe when a remote call does not produce a
//! result. The variants keep apart the failures that provably reached the
//! service (`Remote`) from those that did not, so retry policy can differ.

use transact::RemoteException;

use crate::transport::TransportError;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A payload could not be decoded, on either side.
    MalformedPayload,
    /// The remote interface has no method with the requested code.
    UnknownTransaction,
    /// The service ran and rejected the request.
    RemoteException,
    /// The target is dead or unreachable.
    TransportFailure,
    /// The caller misused the API; nothing was sent.
    Usage,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// A frame or payload received from the remote side did not decode.
    #[error("malformed payload: {0}")]
    Malformed(#[from] transact::Error),
    /// The remote side could not decode what we sent.
    #[error("remote rejected payload: {0}")]
    RejectedPayload(String),
    #[error("{interface} has no transaction {code}")]
    UnknownTransaction { interface: &'static str, code: u32 },
    #[error("remote exception: {0}")]
    Remote(#[from] RemoteException),
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),
    /// Arguments did not match the method signature.
    #[error("bad arguments for {method}: {reason}")]
    Signature { method: &'static str, reason: String },
    #[error("{interface} has no method {method}")]
    UnknownMethod { interface: &'static str, method: String },
    #[error("interface {0} is not registered")]
    UnregisteredInterface(String),
    /// A result decoded but did not have the shape the typed API expects.
    #[error("unexpected result: {0}")]
    UnexpectedResult(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Malformed(_) | Self::RejectedPayload(_) | Self::UnexpectedResult(_) => {
                ErrorKind::MalformedPayload
            }
            Self::UnknownTransaction { .. } => ErrorKind::UnknownTransaction,
            Self::Remote(_) => ErrorKind::RemoteException,
            Self::Transport(_) => ErrorKind::TransportFailure,
            Self::Signature { .. } | Self::UnknownMethod { .. } | Self::UnregisteredInterface(_) => {
                ErrorKind::Usage
            }
        }
    }

    /// True only when the service provably executed the call.
    ///
    /// A transport failure after such an error must not trigger a retry.
    pub fn reached_service(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    /// The remote exception, if the service raised one.
    pub fn as_remote(&self) -> Option<&RemoteException> {
        match self {
            Self::Remote(ex) => Some(ex),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
