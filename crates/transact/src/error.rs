//! # Error Definitions
//!
//! Failures of the schema layer. Every variant means the bytes on the wire did
//! not match what the signature promised; at the RPC level they all surface as
//! a malformed payload.

/// Codec and framing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The underlying parcel could not be read or written.
    #[error("parcel error: {0}")]
    Parcel(#[from] parcel::Error),
    /// A value did not have the type the signature declared.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },
    /// A frame header or body was inconsistent with its length prefix.
    #[error("malformed frame: {0}")]
    Frame(String),
    /// A reply carried a status byte outside the protocol.
    #[error("unknown reply status {0:#04x}")]
    UnknownStatus(u8),
    /// The nested depth of a value exceeded the safety limit.
    #[error("recursion limit exceeded")]
    RecursionLimitExceeded,
    /// A descriptor table broke one of its invariants.
    #[error("invalid descriptor {interface}: {reason}")]
    InvalidDescriptor { interface: &'static str, reason: String },
}

/// A specialized Result type for schema operations.
pub type Result<T> = std::result::Result<T, Error>;
