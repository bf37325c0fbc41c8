//! # Codec
//!
//! The translation layer between `Value` and the parcel wire format.
//!
//! ## Invariants
//! - **Recursion Safety**: All recursive operations are bounded by `MAX_RECURSION_DEPTH`.
//! - **Type Strictness**: Decoding verifies wire tags against the expected `Type`.
//! - **Whole Payloads**: Argument and result payloads must be consumed exactly;
//!   trailing bytes are a malformed payload.

use parcel::ParcelReader;
use parcel::ParcelWriter;

use crate::descriptor::Param;
use crate::error::Error;
use crate::error::Result;
use crate::types::ObjectId;
use crate::types::Type;
use crate::types::Value;

/// The maximum nesting depth for values.
const MAX_RECURSION_DEPTH: usize = 64;

/// Fails with `Error::TypeMismatch` unless `value` conforms to `ty`.
pub fn check(value: &Value, ty: &Type) -> Result<()> {
    if value.conforms(ty) {
        Ok(())
    } else {
        Err(Error::TypeMismatch { expected: ty.to_string(), found: value.desc().to_string() })
    }
}

/// Encodes a `Value` into the writer.
///
/// # Errors
/// Returns `Error::RecursionLimitExceeded` if the value is too deeply nested.
pub fn encode_value(w: &mut ParcelWriter, value: &Value) -> Result<()> {
    encode_value_impl(w, value, 0)
}

fn encode_value_impl(w: &mut ParcelWriter, value: &Value, depth: usize) -> Result<()> {
    if depth > MAX_RECURSION_DEPTH {
        return Err(Error::RecursionLimitExceeded);
    }

    match value {
        Value::Void => w.void(),
        Value::Bool(v) => w.bool(*v),
        Value::Int(v) => w.i32(*v),
        Value::Long(v) => w.i64(*v),
        Value::String(v) => w.str(v)?,
        Value::Bytes(v) => w.bytes(v)?,
        Value::List(items) => {
            w.list_header(items.len())?;
            for item in items {
                encode_value_impl(w, item, depth + 1)?;
            }
        }
        Value::Struct(fields) => {
            w.struct_begin();
            for field in fields {
                encode_value_impl(w, field, depth + 1)?;
            }
            w.struct_end()?;
        }
        Value::Binder(id) => w.binder(id.0),
    }
    Ok(())
}

/// Decodes a single value of the expected type.
pub fn decode_value(r: &mut ParcelReader<'_>, ty: &Type) -> Result<Value> {
    decode_value_impl(r, ty, 0)
}

fn decode_value_impl(r: &mut ParcelReader<'_>, ty: &Type, depth: usize) -> Result<Value> {
    if depth > MAX_RECURSION_DEPTH {
        return Err(Error::RecursionLimitExceeded);
    }

    match ty {
        Type::Void => { r.void()?; Ok(Value::Void) }
        Type::Bool => Ok(Value::Bool(r.bool()?)),
        Type::Int => Ok(Value::Int(r.i32()?)),
        Type::Long => Ok(Value::Long(r.i64()?)),
        Type::String => Ok(Value::String(r.str()?.to_string())),
        Type::Bytes => Ok(Value::Bytes(r.bytes()?.to_vec())),

        Type::List(elem) => {
            // The count is already bounded by the remaining bytes.
            let count = r.list_header()?;
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                items.push(decode_value_impl(r, elem, depth + 1)?);
            }
            Ok(Value::List(items))
        }

        Type::Struct(schema) => {
            let mut body = r.struct_body()?;
            let mut fields = Vec::with_capacity(schema.fields.len());
            for field in schema.fields {
                fields.push(decode_value_impl(&mut body, &field.ty, depth + 1)?);
            }
            // Fields appended by a newer peer are skipped.
            while body.remaining() > 0 {
                body.skip()?;
            }
            Ok(Value::Struct(fields))
        }

        Type::Interface(_) => Ok(Value::Binder(ObjectId(r.binder()?))),
    }
}

/// Encodes an argument list into a standalone payload.
pub fn encode_args(args: &[Value]) -> Result<Vec<u8>> {
    let mut w = ParcelWriter::new();
    for arg in args {
        encode_value(&mut w, arg)?;
    }
    Ok(w.into_bytes()?)
}

/// Decodes an argument payload against a parameter list.
pub fn decode_args(payload: &[u8], params: &[Param]) -> Result<Vec<Value>> {
    let mut r = ParcelReader::new(payload);
    let mut args = Vec::with_capacity(params.len());
    for param in params {
        args.push(decode_value(&mut r, &param.ty)?);
    }
    r.finish()?;
    Ok(args)
}

/// Encodes a single result value into a standalone payload.
pub fn encode_result(value: &Value) -> Result<Vec<u8>> {
    let mut w = ParcelWriter::new();
    encode_value(&mut w, value)?;
    Ok(w.into_bytes()?)
}

/// Decodes a result payload against the declared result type.
pub fn decode_result(payload: &[u8], ty: &Type) -> Result<Value> {
    let mut r = ParcelReader::new(payload);
    let value = decode_value(&mut r, ty)?;
    r.finish()?;
    Ok(value)
}
