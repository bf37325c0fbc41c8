//! # Handles
//!
//! A `Handle` is the caller's side of a remote object: an `ObjectId` plus the
//! transport that reaches the node owning it. It holds no pointer into the
//! remote process.
//!
//! ## Invariants
//! - Every `Handle` built with [`Handle::new`] owns one reference on the
//!   serving node. The reference is released when the last clone is dropped.
//! - Two handles are equal iff they name the same id on the same transport.

use std::sync::Arc;

use transact::ObjectId;
use transact::Reply;
use transact::Transaction;

use crate::error::Result;
use crate::transport::Transport;

struct Inner {
    id: ObjectId,
    transport: Arc<dyn Transport>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.transport.release(self.id);
    }
}

/// A counted reference to a remote object.
#[derive(Clone)]
pub struct Handle {
    inner: Arc<Inner>,
}

impl Handle {
    /// Wraps one already-acquired reference to `id`.
    pub fn new(id: ObjectId, transport: Arc<dyn Transport>) -> Self {
        Self { inner: Arc::new(Inner { id, transport }) }
    }

    pub fn id(&self) -> ObjectId {
        self.inner.id
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.inner.transport
    }

    /// Sends one transaction to the object and decodes the reply frame.
    pub async fn transact(&self, code: u32, payload: Vec<u8>) -> Result<Reply> {
        let frame = Transaction::new(code, payload).encode()?;
        let reply = self.inner.transport.transact(self.inner.id, frame).await?;
        Ok(Reply::decode(&reply)?)
    }

    fn transport_addr(&self) -> *const () {
        Arc::as_ptr(&self.inner.transport) as *const ()
    }
}

impl PartialEq for Handle {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id && self.transport_addr() == other.transport_addr()
    }
}

impl Eq for Handle {}

impl std::hash::Hash for Handle {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
        self.transport_addr().hash(state);
    }
}

impl std::fmt::Debug for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Handle({})", self.inner.id)
    }
}
