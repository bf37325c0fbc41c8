//! # Transact
//!
//! The schema layer of the binder protocol, built on `parcel`.
//!
//! ## Architecture
//!
//! - **Descriptors**: every interface is a static table of methods, each with a
//!   stable transaction code and a typed signature.
//! - **Values**: `Value` is checked against `Type` on both ends of a call, so a
//!   payload that does not match the signature is rejected instead of misread.
//! - **Frames**: a transaction is `[code][len][payload]` and a reply is
//!   `[status][len][payload]`; nothing else crosses the transport.

pub mod codec;
pub mod descriptor;
pub mod error;
pub mod exception;
pub mod frame;
pub mod types;

#[cfg(test)]
mod tests;

pub use codec::check;
pub use codec::decode_args;
pub use codec::decode_result;
pub use codec::decode_value;
pub use codec::encode_args;
pub use codec::encode_result;
pub use codec::encode_value;
pub use descriptor::Descriptor;
pub use descriptor::FIRST_CALL_TRANSACTION;
pub use descriptor::INTERFACE_TRANSACTION;
pub use descriptor::Method;
pub use descriptor::Param;
pub use error::Error;
pub use error::Result;
pub use exception::RemoteException;
pub use frame::Reply;
pub use frame::Status;
pub use frame::Transaction;
pub use types::Field;
pub use types::ObjectId;
pub use types::StructSchema;
pub use types::Type;
pub use types::Value;
