//! The read half of the codec.

use crate::types::Error;
use crate::types::Result;
use crate::types::Tag;

/// Lists nested deeper than this are rejected by `skip`.
const MAX_SKIP_DEPTH: usize = 64;

/// A zero-copy, bounds-checked cursor over a byte slice.
///
/// Reading advances the cursor. Struct reads return a new `ParcelReader`
/// restricted to the struct body.
///
/// # Errors
/// Every read returns `Error::UnexpectedEnd` rather than reading past the end,
/// and `Error::TagMismatch` when the next value is not of the requested type.
#[derive(Debug, Clone)]
pub struct ParcelReader<'a> {
    buf: &'a [u8],
}

impl<'a> ParcelReader<'a> {
    /// Creates a reader over the slice.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Returns the number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    /// Fails with `Error::TrailingBytes` unless every byte has been consumed.
    pub fn finish(&self) -> Result<()> {
        match self.buf.len() {
            0 => Ok(()),
            n => Err(Error::TrailingBytes(n)),
        }
    }

    /// Peeks the next Tag without advancing.
    pub fn peek_tag(&self) -> Result<Tag> {
        let b = *self.buf.first().ok_or(Error::UnexpectedEnd)?;
        Tag::from_u8(b).ok_or(Error::InvalidTag(b))
    }

    fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.buf.len() {
            return Err(Error::UnexpectedEnd);
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Reads a u32 length prefix and checks it against the bytes that remain.
    fn read_len(&mut self) -> Result<usize> {
        let declared = u32::from_le_bytes(self.read_array()?) as usize;
        if declared > self.buf.len() {
            return Err(Error::LengthOverrun { declared, remaining: self.buf.len() });
        }
        Ok(declared)
    }

    fn expect_tag(&mut self, expected: Tag) -> Result<()> {
        let found = self.peek_tag()?;
        if found != expected {
            return Err(Error::TagMismatch { expected, found });
        }
        self.buf = &self.buf[1..];
        Ok(())
    }

    /// Skips the next value and anything nested inside it.
    pub fn skip(&mut self) -> Result<()> {
        self.skip_nested(0)
    }

    fn skip_nested(&mut self, depth: usize) -> Result<()> {
        if depth > MAX_SKIP_DEPTH {
            return Err(Error::NestingTooDeep);
        }
        match self.peek_tag()? {
            Tag::Void => self.void(),
            Tag::BoolTrue | Tag::BoolFalse => self.bool().map(|_| ()),
            Tag::I32 => self.i32().map(|_| ()),
            Tag::I64 => self.i64().map(|_| ()),
            Tag::String | Tag::Bytes | Tag::Struct => {
                self.buf = &self.buf[1..];
                let len = self.read_len()?;
                self.read_bytes(len).map(|_| ())
            }
            Tag::Binder => self.binder().map(|_| ()),
            Tag::List => {
                let count = self.list_header()?;
                for _ in 0..count {
                    self.skip_nested(depth + 1)?;
                }
                Ok(())
            }
        }
    }

    /// Decodes the empty value of a `void` method.
    pub fn void(&mut self) -> Result<()> {
        self.expect_tag(Tag::Void)
    }

    /// Decodes a bool.
    pub fn bool(&mut self) -> Result<bool> {
        match self.peek_tag()? {
            Tag::BoolTrue => { self.buf = &self.buf[1..]; Ok(true) }
            Tag::BoolFalse => { self.buf = &self.buf[1..]; Ok(false) }
            found => Err(Error::TagMismatch { expected: Tag::BoolTrue, found }),
        }
    }

    /// Decodes i32 (LE).
    pub fn i32(&mut self) -> Result<i32> {
        self.expect_tag(Tag::I32)?;
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    /// Decodes i64 (LE).
    pub fn i64(&mut self) -> Result<i64> {
        self.expect_tag(Tag::I64)?;
        Ok(i64::from_le_bytes(self.read_array()?))
    }

    /// Decodes a string slice (UTF-8).
    pub fn str(&mut self) -> Result<&'a str> {
        self.expect_tag(Tag::String)?;
        let len = self.read_len()?;
        let bytes = self.read_bytes(len)?;
        std::str::from_utf8(bytes).map_err(|_| Error::InvalidUtf8)
    }

    /// Decodes a byte slice.
    pub fn bytes(&mut self) -> Result<&'a [u8]> {
        self.expect_tag(Tag::Bytes)?;
        let len = self.read_len()?;
        self.read_bytes(len)
    }

    /// Decodes a remote object id.
    pub fn binder(&mut self) -> Result<u64> {
        self.expect_tag(Tag::Binder)?;
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    /// Decodes a list header and returns the element count.
    ///
    /// Every element occupies at least its tag byte, so a count larger than the
    /// remaining bytes is rejected before the caller allocates for it.
    pub fn list_header(&mut self) -> Result<usize> {
        self.expect_tag(Tag::List)?;
        self.read_len()
    }

    /// Decodes a struct and returns a reader bounded to its body.
    pub fn struct_body(&mut self) -> Result<ParcelReader<'a>> {
        self.expect_tag(Tag::Struct)?;
        let len = self.read_len()?;
        Ok(ParcelReader::new(self.read_bytes(len)?))
    }
}
