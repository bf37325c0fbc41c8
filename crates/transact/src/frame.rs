//! # Protocol Frames
//!
//! The envelope around a payload: a transaction carries a method code, a reply
//! carries a status byte.
//!
//! ## Format
//! - **Transaction**: `[Code: u32][Len: u32][Payload: Len]`
//! - **Reply**: `[Status: u8][Len: u32][Payload: Len]`
//!
//! All integers are Little-Endian.
//!
//! ## Invariants
//! - **Exact Length**: the declared length must match the bytes that follow.
//!   A frame with missing or surplus bytes is rejected whole.

use crate::error::Error;
use crate::error::Result;

/// Reply status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Status {
    /// The payload is the encoded result.
    Ok = 0,
    /// The payload is an encoded `RemoteException`.
    RemoteException = 1,
    /// The target object is gone or unreachable.
    TransportFailure = 2,
    /// The code is not in the target's method table.
    UnknownTransaction = 3,
    /// The frame or its arguments could not be decoded.
    MalformedPayload = 4,
}

impl Status {
    pub fn from_u8(b: u8) -> Result<Self> {
        match b {
            0 => Ok(Self::Ok),
            1 => Ok(Self::RemoteException),
            2 => Ok(Self::TransportFailure),
            3 => Ok(Self::UnknownTransaction),
            4 => Ok(Self::MalformedPayload),
            _ => Err(Error::UnknownStatus(b)),
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Status::Ok => "OK",
            Status::RemoteException => "REMOTE_EXCEPTION",
            Status::TransportFailure => "TRANSPORT_FAILURE",
            Status::UnknownTransaction => "UNKNOWN_TRANSACTION",
            Status::MalformedPayload => "MALFORMED_PAYLOAD",
        };
        f.write_str(s)
    }
}

/// An outbound request: method code plus encoded arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub code: u32,
    pub payload: Vec<u8>,
}

impl Transaction {
    pub fn new(code: u32, payload: Vec<u8>) -> Self {
        Self { code, payload }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let len = payload_len(&self.payload)?;
        let mut buf = Vec::with_capacity(8 + self.payload.len());
        buf.extend_from_slice(&self.code.to_le_bytes());
        buf.extend_from_slice(&len.to_le_bytes());
        buf.extend_from_slice(&self.payload);
        Ok(buf)
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        let code = read_u32(buf, 0, "transaction code")?;
        let payload = read_body(buf, 4)?;
        Ok(Self { code, payload: payload.to_vec() })
    }
}

/// An inbound answer: status plus payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: Status,
    pub payload: Vec<u8>,
}

impl Reply {
    pub fn new(status: Status, payload: Vec<u8>) -> Self {
        Self { status, payload }
    }

    /// A reply that carries no payload.
    pub fn bare(status: Status) -> Self {
        Self { status, payload: Vec::new() }
    }

    /// Encodes a reply with an empty payload. Cannot fail.
    pub fn encode_bare(status: Status) -> Vec<u8> {
        let mut buf = Vec::with_capacity(5);
        buf.push(status as u8);
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let len = payload_len(&self.payload)?;
        let mut buf = Vec::with_capacity(5 + self.payload.len());
        buf.push(self.status as u8);
        buf.extend_from_slice(&len.to_le_bytes());
        buf.extend_from_slice(&self.payload);
        Ok(buf)
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        let status = match buf.first() {
            Some(b) => Status::from_u8(*b)?,
            None => return Err(Error::Frame("missing reply status".into())),
        };
        let payload = read_body(buf, 1)?;
        Ok(Self { status, payload: payload.to_vec() })
    }
}

fn payload_len(payload: &[u8]) -> Result<u32> {
    u32::try_from(payload.len())
        .map_err(|_| Error::Frame(format!("payload of {} bytes exceeds u32 length", payload.len())))
}

fn read_u32(buf: &[u8], at: usize, what: &str) -> Result<u32> {
    buf.get(at..at + 4)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or_else(|| Error::Frame(format!("truncated {}", what)))
}

fn read_body(buf: &[u8], at: usize) -> Result<&[u8]> {
    let len = read_u32(buf, at, "payload length")? as usize;
    let body = &buf[at + 4..];
    if body.len() != len {
        return Err(Error::Frame(format!(
            "declared payload length {} but {} bytes follow",
            len,
            body.len()
        )));
    }
    Ok(body)
}
