//! # Parcel
//!
//! A bounded, self-describing serialization format for binder transactions.
//!
//! ## Philosophy
//!
//! - **TLV Architecture**: every value starts with a `Tag`, so a decoder can reject
//!   a payload that does not match the shape it expects instead of misreading it.
//! - **Bounded**: readers are zero-copy, bounds-checked views. Length prefixes are
//!   checked against the bytes actually present before anything is allocated.
//!
//! ## Format
//!
//! - **Scalars**: `[Tag: 1b][Data: N]`
//! - **Blobs**: `[Tag: 1b][Len: 4b][Data: Len]`
//! - **Lists**: `[Tag: 1b][Count: 4b][Element]*Count`
//! - **Structs**: `[Tag: 1b][Len: 4b][Body: Len]`
//! - **Binders**: `[Tag: 1b][Object id: 8b]`
//!
//! All integers are Little-Endian.

mod reader;
mod types;
mod writer;

#[cfg(test)]
mod tests;

pub use reader::ParcelReader;
pub use types::Error;
pub use types::Result;
pub use types::Tag;
pub use writer::ParcelWriter;
