//! # Remote Procedure Call Proxy
//!
//! The caller's side of an interface: turns a method call into exactly one
//! transaction on a handle and the reply back into a value, a new proxy or a
//! typed error.
//!
//! The proxy holds no mutable state besides the handle it wraps.
//!
//! ## Invariants
//!
//! - Arguments are checked against the signature before anything is sent.
//! - Results match the signature or an error is returned.
//! - A returned interface becomes a new `Handle` on the same transport, which
//!   owns the reference the serving node took when it published the object.
//! - Returned interfaces are bound through the registry this proxy was bound
//!   through.

use tracing::trace;

use transact::Descriptor;
use transact::Method;
use transact::RemoteException;
use transact::Reply;
use transact::Status;
use transact::Type;
use transact::Value;
use transact::decode_result;
use transact::encode_args;

use crate::error::Error;
use crate::error::Result;
use crate::handle::Handle;
use crate::registry::Registry;
use crate::transport::TransportError;

/// The result of a remote call.
#[derive(Debug)]
pub enum Outcome {
    Value(Value),
    /// The method returned a remote object.
    Interface(Proxy),
}

impl Outcome {
    pub fn into_value(self) -> Result<Value> {
        match self {
            Self::Value(value) => Ok(value),
            Self::Interface(proxy) => Err(Error::UnexpectedResult(format!(
                "expected a value, got interface {}",
                proxy.descriptor().name
            ))),
        }
    }

    pub fn into_proxy(self) -> Result<Proxy> {
        match self {
            Self::Interface(proxy) => Ok(proxy),
            Self::Value(value) => Err(Error::UnexpectedResult(format!(
                "expected an interface, got {}",
                value.desc()
            ))),
        }
    }

    pub fn into_void(self) -> Result<()> {
        match self.into_value()? {
            Value::Void => Ok(()),
            other => Err(unexpected("void", &other)),
        }
    }

    pub fn into_bool(self) -> Result<bool> {
        match self.into_value()? {
            Value::Bool(v) => Ok(v),
            other => Err(unexpected("boolean", &other)),
        }
    }

    pub fn into_int(self) -> Result<i32> {
        match self.into_value()? {
            Value::Int(v) => Ok(v),
            other => Err(unexpected("int", &other)),
        }
    }

    pub fn into_strings(self) -> Result<Vec<String>> {
        match self.into_value()? {
            Value::List(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s),
                    other => Err(unexpected("String", &other)),
                })
                .collect(),
            other => Err(unexpected("List<String>", &other)),
        }
    }
}

fn unexpected(expected: &str, found: &Value) -> Error {
    Error::UnexpectedResult(format!("expected {}, got {}", expected, found.desc()))
}

/// A handle bound to the descriptor of the interface it implements.
#[derive(Clone, Debug)]
pub struct Proxy {
    handle: Handle,
    descriptor: &'static Descriptor,
    registry: &'static Registry,
}

impl Proxy {
    /// Binds without asking the remote side. Use
    /// [`Registry::as_interface`] unless the descriptor is already known.
    pub(crate) fn new(handle: Handle, descriptor: &'static Descriptor, registry: &'static Registry) -> Self {
        Self { handle, descriptor, registry }
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub fn descriptor(&self) -> &'static Descriptor {
        self.descriptor
    }

    /// The registry returned interfaces are looked up in.
    pub fn registry(&self) -> &'static Registry {
        self.registry
    }

    /// Calls the method with transaction code `code`.
    pub async fn call(&self, code: u32, args: &[Value]) -> Result<Outcome> {
        let method = self.descriptor.method(code).ok_or_else(|| Error::UnknownMethod {
            interface: self.descriptor.name,
            method: format!("#{}", code),
        })?;
        self.invoke(method, args).await
    }

    /// Calls a method by name.
    pub async fn call_named(&self, name: &str, args: &[Value]) -> Result<Outcome> {
        let method = self.descriptor.method_named(name).ok_or_else(|| Error::UnknownMethod {
            interface: self.descriptor.name,
            method: name.to_string(),
        })?;
        self.invoke(method, args).await
    }

    /// Execute a typed remote call.
    ///
    /// Returns `Signature` without sending anything if `args` do not match,
    /// `Remote` if the service raised an exception, `Transport` if the target
    /// is gone, and `Malformed`/`RejectedPayload` if either side could not
    /// decode the other.
    pub async fn invoke(&self, method: &'static Method, args: &[Value]) -> Result<Outcome> {
        if self.descriptor.method(method.code) != Some(method) {
            return Err(Error::UnknownMethod {
                interface: self.descriptor.name,
                method: method.name.to_string(),
            });
        }
        check_args(method, args)?;

        let payload = encode_args(args)?;
        trace!(interface = self.descriptor.name, method = method.name, object = %self.handle.id(), "transact");
        let reply = self.handle.transact(method.code, payload).await?;

        if reply.status != Status::Ok {
            return Err(reply_error(&self.handle, self.descriptor.name, method.code, reply));
        }

        let value = decode_result(&reply.payload, &method.result)?;
        match (value, &method.result) {
            (Value::Binder(id), Type::Interface(name)) => {
                // Take ownership of the reference first so it is released on error.
                let handle = Handle::new(id, self.handle.transport().clone());
                let descriptor = self
                    .registry
                    .lookup(name)
                    .ok_or_else(|| Error::UnregisteredInterface(name.to_string()))?;
                Ok(Outcome::Interface(Proxy::new(handle, descriptor, self.registry)))
            }
            (value, _) => Ok(Outcome::Value(value)),
        }
    }
}

fn check_args(method: &'static Method, args: &[Value]) -> Result<()> {
    if args.len() != method.params.len() {
        return Err(Error::Signature {
            method: method.name,
            reason: format!("expected {} arguments, got {}", method.params.len(), args.len()),
        });
    }

    for (param, arg) in method.params.iter().zip(args) {
        if !arg.conforms(&param.ty) {
            return Err(Error::Signature {
                method: method.name,
                reason: format!("{} must be {}, got {}", param.name, param.ty, arg.desc()),
            });
        }
    }

    Ok(())
}

/// Converts a non-OK reply into the matching error.
pub(crate) fn reply_error(handle: &Handle, interface: &'static str, code: u32, reply: Reply) -> Error {
    match reply.status {
        Status::RemoteException => match RemoteException::decode(&reply.payload) {
            Ok(ex) => Error::Remote(ex),
            Err(e) => Error::Malformed(e),
        },
        Status::TransportFailure => Error::Transport(TransportError::DeadObject(handle.id())),
        Status::UnknownTransaction => Error::UnknownTransaction { interface, code },
        Status::MalformedPayload => {
            let reason = decode_result(&reply.payload, &Type::String)
                .ok()
                .and_then(|value| match value {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .unwrap_or_default();
            Error::RejectedPayload(reason)
        }
        Status::Ok => Error::UnexpectedResult("OK reply treated as a failure".into()),
    }
}
