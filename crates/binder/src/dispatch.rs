//! # Stub Dispatch
//!
//! The serving side of a call: turns `(code, payload)` into one invocation of
//! a `Service` and the outcome back into a reply.
//!
//! ## Invariants
//! - **Never Crashes**: decode failures, undeclared exceptions, internal errors
//!   and panics all become replies. Nothing propagates into the transport.
//! - **No Leaks**: only exceptions a method declares cross the boundary with
//!   their message. Everything else is replaced by a generic exception and the
//!   details are logged locally.
//! - **Exactly Once**: a decoded transaction invokes the implementation once.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::debug;
use tracing::error;
use tracing::warn;

use transact::Descriptor;
use transact::INTERFACE_TRANSACTION;
use transact::Method;
use transact::ObjectId;
use transact::RemoteException;
use transact::Reply;
use transact::Status;
use transact::Type;
use transact::Value;
use transact::decode_args;
use transact::encode_result;

use crate::node::Node;

/// An object that can be exposed through a node.
///
/// Implementations are usually the generated-style `…Stub<T>` types in
/// [`crate::interfaces`], which unpack arguments and call a typed trait.
#[async_trait::async_trait]
pub trait Service: Send + Sync + 'static {
    fn descriptor(&self) -> &'static Descriptor;

    /// Runs one method. `args` already match `method.params`.
    async fn on_call(&self, method: &'static Method, args: Vec<Value>) -> Result<Returned, Fault>;

    /// A service that returns false is evicted from its node; later
    /// transactions on it fail as if it had been released.
    fn is_alive(&self) -> bool {
        true
    }
}

/// A successful method result.
pub enum Returned {
    Value(Value),
    /// A local object to expose to the caller as a new remote handle.
    Object(Arc<dyn Service>),
}

impl From<Value> for Returned {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// A failed method invocation.
#[derive(Debug)]
pub enum Fault {
    /// A service-level rejection meant for the caller.
    Exception(RemoteException),
    /// Anything else. Never shown to the caller.
    Internal(anyhow::Error),
}

impl From<RemoteException> for Fault {
    fn from(ex: RemoteException) -> Self {
        Self::Exception(ex)
    }
}

impl From<anyhow::Error> for Fault {
    fn from(e: anyhow::Error) -> Self {
        Self::Internal(e)
    }
}

/// Pulls typed arguments off a decoded argument list, in order.
pub struct Args {
    method: &'static str,
    values: std::vec::IntoIter<Value>,
}

impl Args {
    pub fn new(method: &'static Method, values: Vec<Value>) -> Self {
        Self { method: method.name, values: values.into_iter() }
    }

    fn next(&mut self, expected: &str) -> Result<Value, Fault> {
        self.values
            .next()
            .ok_or_else(|| Fault::Internal(anyhow::anyhow!("{}: missing {} argument", self.method, expected)))
    }

    fn mismatch(&self, expected: &str, found: &Value) -> Fault {
        Fault::Internal(anyhow::anyhow!("{}: expected {}, found {}", self.method, expected, found.desc()))
    }

    pub fn int(&mut self) -> Result<i32, Fault> {
        match self.next("int")? {
            Value::Int(v) => Ok(v),
            other => Err(self.mismatch("int", &other)),
        }
    }

    pub fn string(&mut self) -> Result<String, Fault> {
        match self.next("String")? {
            Value::String(v) => Ok(v),
            other => Err(self.mismatch("String", &other)),
        }
    }

    pub fn bytes(&mut self) -> Result<Vec<u8>, Fault> {
        match self.next("byte[]")? {
            Value::Bytes(v) => Ok(v),
            other => Err(self.mismatch("byte[]", &other)),
        }
    }
}

/// Routes transactions for the objects of one node.
pub struct Dispatcher<'a> {
    node: &'a Node,
}

impl<'a> Dispatcher<'a> {
    pub fn new(node: &'a Node) -> Self {
        Self { node }
    }

    /// Handles one transaction addressed to `service`.
    pub async fn on_transaction(&self, service: &Arc<dyn Service>, code: u32, payload: &[u8]) -> Reply {
        self.dispatch(service, code, payload).await.0
    }

    /// Like [`Dispatcher::on_transaction`], also reporting the object the
    /// reply hands out a reference to, if any.
    pub(crate) async fn dispatch(
        &self,
        service: &Arc<dyn Service>,
        code: u32,
        payload: &[u8],
    ) -> (Reply, Option<ObjectId>) {
        let descriptor = service.descriptor();

        if code == INTERFACE_TRANSACTION {
            return (ok_reply(&Value::String(descriptor.name.to_string())), None);
        }

        let Some(method) = descriptor.method(code) else {
            debug!(interface = descriptor.name, code, "unknown transaction");
            return (Reply::bare(Status::UnknownTransaction), None);
        };

        let args = match decode_args(payload, method.params) {
            Ok(args) => args,
            Err(e) => {
                debug!(interface = descriptor.name, method = method.name, error = %e, "undecodable arguments");
                return (malformed_reply(&format!("{}: {}", method.name, e)), None);
            }
        };

        let outcome = AssertUnwindSafe(service.on_call(method, args)).catch_unwind().await;

        let reply = match outcome {
            Ok(Ok(returned)) => return self.success(method, returned),
            Ok(Err(Fault::Exception(ex))) if method.declares(&ex.kind) => {
                debug!(method = method.name, exception = %ex, "declared exception");
                exception_reply(&ex)
            }
            Ok(Err(Fault::Exception(ex))) => {
                warn!(method = method.name, exception = %ex, "undeclared exception sanitized");
                sanitized_reply()
            }
            Ok(Err(Fault::Internal(e))) => {
                error!(method = method.name, error = %format!("{:#}", e), "internal error sanitized");
                sanitized_reply()
            }
            Err(panic) => {
                error!(method = method.name, panic = panic_message(&*panic), "service panicked");
                sanitized_reply()
            }
        };
        (reply, None)
    }

    fn success(&self, method: &'static Method, returned: Returned) -> (Reply, Option<ObjectId>) {
        let (value, published) = match (returned, &method.result) {
            (Returned::Object(object), Type::Interface(name)) if object.descriptor().name == *name => {
                let id = self.node.publish(object);
                (Value::Binder(id), Some(id))
            }
            (Returned::Value(value), ty) if !matches!(ty, Type::Interface(_)) && value.conforms(ty) => (value, None),
            (returned, ty) => {
                error!(
                    method = method.name,
                    expected = %ty,
                    found = %describe(&returned),
                    "result does not match signature"
                );
                return (sanitized_reply(), None);
            }
        };

        match encode_result(&value) {
            Ok(payload) => (Reply::new(Status::Ok, payload), published),
            Err(e) => {
                if let Some(id) = published {
                    self.node.release(id);
                }
                error!(method = method.name, error = %e, "result could not be encoded");
                (sanitized_reply(), None)
            }
        }
    }
}

fn describe(returned: &Returned) -> String {
    match returned {
        Returned::Value(v) => v.desc().to_string(),
        Returned::Object(o) => o.descriptor().name.to_string(),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

fn ok_reply(value: &Value) -> Reply {
    match encode_result(value) {
        Ok(payload) => Reply::new(Status::Ok, payload),
        Err(e) => {
            error!(error = %e, "reply could not be encoded");
            sanitized_reply()
        }
    }
}

fn exception_reply(ex: &RemoteException) -> Reply {
    match ex.encode() {
        Ok(payload) => Reply::new(Status::RemoteException, payload),
        Err(e) => {
            error!(error = %e, "exception could not be encoded");
            Reply::bare(Status::RemoteException)
        }
    }
}

fn sanitized_reply() -> Reply {
    exception_reply(&RemoteException::sanitized())
}

/// A `MALFORMED_PAYLOAD` reply carrying a diagnostic string.
pub(crate) fn malformed_reply(reason: &str) -> Reply {
    match encode_result(&Value::String(reason.to_string())) {
        Ok(payload) => Reply::new(Status::MalformedPayload, payload),
        Err(_) => Reply::bare(Status::MalformedPayload),
    }
}

/// Identity of a service object, used to give one object one id.
pub(crate) fn service_addr(service: &Arc<dyn Service>) -> usize {
    Arc::as_ptr(service) as *const () as usize
}
