//! The write half of the codec.

use crate::types::Error;
use crate::types::Result;
use crate::types::Tag;

/// An append-only parcel encoder.
///
/// Struct scopes are tracked on a stack and their length headers are
/// back-patched when the scope closes. Lists carry an element count instead
/// of a byte length; the caller writes exactly that many elements after
/// `list_header`.
pub struct ParcelWriter {
    buf: Vec<u8>,
    /// Body start offsets of the open struct scopes.
    scopes: Vec<usize>,
}

impl ParcelWriter {
    /// Creates a new writer with a small default capacity.
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(256),
            scopes: Vec::new(),
        }
    }

    /// Consumes the writer and returns the encoded bytes.
    ///
    /// # Errors
    /// Returns `Error::ScopeStillOpen` if a struct was begun but not ended.
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        if !self.scopes.is_empty() {
            return Err(Error::ScopeStillOpen);
        }
        Ok(self.buf)
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    fn tag(&mut self, tag: Tag) {
        self.buf.push(tag as u8);
    }

    fn len_prefix(&mut self, len: usize) -> Result<()> {
        let len = u32::try_from(len).map_err(|_| Error::BlobTooLarge(len))?;
        self.buf.extend_from_slice(&len.to_le_bytes());
        Ok(())
    }

    /// Encodes the empty value of a `void` method.
    pub fn void(&mut self) {
        self.tag(Tag::Void);
    }

    /// Encodes a boolean.
    pub fn bool(&mut self, v: bool) {
        self.tag(if v { Tag::BoolTrue } else { Tag::BoolFalse });
    }

    /// Encodes a signed 32-bit integer (LE).
    pub fn i32(&mut self, v: i32) {
        self.tag(Tag::I32);
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Encodes a signed 64-bit integer (LE).
    pub fn i64(&mut self, v: i64) {
        self.tag(Tag::I64);
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Encodes a length-prefixed UTF-8 string.
    pub fn str(&mut self, v: &str) -> Result<()> {
        self.tag(Tag::String);
        self.len_prefix(v.len())?;
        self.buf.extend_from_slice(v.as_bytes());
        Ok(())
    }

    /// Encodes a length-prefixed byte blob.
    pub fn bytes(&mut self, v: &[u8]) -> Result<()> {
        self.tag(Tag::Bytes);
        self.len_prefix(v.len())?;
        self.buf.extend_from_slice(v);
        Ok(())
    }

    /// Encodes a reference to a remote object.
    pub fn binder(&mut self, id: u64) {
        self.tag(Tag::Binder);
        self.buf.extend_from_slice(&id.to_le_bytes());
    }

    /// Writes a list header. Exactly `count` elements must follow.
    pub fn list_header(&mut self, count: usize) -> Result<()> {
        self.tag(Tag::List);
        self.len_prefix(count)
    }

    /// Begins a struct. Must be closed via `struct_end()`.
    pub fn struct_begin(&mut self) {
        self.tag(Tag::Struct);
        self.buf.extend_from_slice(&[0, 0, 0, 0]); // Length placeholder
        self.scopes.push(self.buf.len());
    }

    /// Ends the innermost struct and patches its length header.
    pub fn struct_end(&mut self) -> Result<()> {
        let start = self.scopes.pop().ok_or(Error::ScopeUnderflow)?;
        let body_len = self.buf.len() - start;
        let len = u32::try_from(body_len).map_err(|_| Error::BlobTooLarge(body_len))?;
        self.buf[start - 4..start].copy_from_slice(&len.to_le_bytes());
        Ok(())
    }
}

impl Default for ParcelWriter {
    fn default() -> Self {
        Self::new()
    }
}
