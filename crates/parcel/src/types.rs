//! Tags and errors shared by the writer and the reader.

/// Parcel serialization and deserialization errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Buffer exhausted while reading.
    UnexpectedEnd,
    /// Byte does not correspond to a valid `Tag`.
    InvalidTag(u8),
    /// A valid tag was found where a different one was expected.
    TagMismatch { expected: Tag, found: Tag },
    /// String data is not valid UTF-8.
    InvalidUtf8,
    /// A length or count prefix claims more data than the buffer holds.
    LengthOverrun { declared: usize, remaining: usize },
    /// Blob, list or struct length exceeds `u32::MAX`.
    BlobTooLarge(usize),
    /// Bytes were left over after the expected values were read.
    TrailingBytes(usize),
    /// Nested lists exceeded the skip depth limit.
    NestingTooDeep,
    /// Attempted to finalize the buffer with an open struct.
    ScopeStillOpen,
    /// Attempted to close a struct when none is open.
    ScopeUnderflow,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::UnexpectedEnd => write!(f, "unexpected end of parcel"),
            Error::InvalidTag(b) => write!(f, "invalid tag byte: {:#04x}", b),
            Error::TagMismatch { expected, found } => {
                write!(f, "tag mismatch: expected {:?}, found {:?}", expected, found)
            }
            Error::InvalidUtf8 => write!(f, "string is not valid utf-8"),
            Error::LengthOverrun { declared, remaining } => {
                write!(f, "length prefix {} exceeds remaining {} bytes", declared, remaining)
            }
            Error::BlobTooLarge(len) => write!(f, "length {} does not fit in u32", len),
            Error::TrailingBytes(n) => write!(f, "{} trailing bytes after payload", n),
            Error::NestingTooDeep => write!(f, "nesting too deep"),
            Error::ScopeStillOpen => write!(f, "struct scope still open"),
            Error::ScopeUnderflow => write!(f, "no struct scope to close"),
        }
    }
}

impl std::error::Error for Error {}

/// Specialized `Result` for parcel operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Identifies the type of the encoded value.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// The empty result of a `void` method.
    Void = 0x00,

    // Fixed-width scalars
    BoolTrue = 0x01,
    BoolFalse = 0x02,
    I32 = 0x03,
    I64 = 0x04,

    // Blobs (Tag + u32 Len + Bytes)
    String = 0x10,
    Bytes = 0x11,

    // Containers
    List = 0x20,
    Struct = 0x21,

    // Remote object reference (Tag + u64 id)
    Binder = 0x30,
}

impl Tag {
    /// Returns the Tag variant for a given byte, or `None` if invalid.
    pub fn from_u8(b: u8) -> Option<Self> {
        match b {
            0x00 => Some(Tag::Void),
            0x01 => Some(Tag::BoolTrue),
            0x02 => Some(Tag::BoolFalse),
            0x03 => Some(Tag::I32),
            0x04 => Some(Tag::I64),
            0x10 => Some(Tag::String),
            0x11 => Some(Tag::Bytes),
            0x20 => Some(Tag::List),
            0x21 => Some(Tag::Struct),
            0x30 => Some(Tag::Binder),
            _ => None,
        }
    }
}
