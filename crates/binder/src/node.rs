//! # Node
//!
//! The serving-side object table of one process. Remote callers never see a
//! pointer, only an `ObjectId` that indexes this table.
//!
//! Uses DashMap for concurrent access without a global lock, so unrelated
//! objects dispatch in parallel.
//!
//! ## Invariants
//! - Ids are never reused within a node.
//! - Publishing the same object twice yields the same id and two references.
//! - Root services are pinned: releases never destroy them.
//! - A service whose `is_alive()` turned false is evicted on next lookup.
//! - Lock order is `by_addr` before `objects`. No code path holds an
//!   `objects` guard while touching `by_addr`.

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use transact::ObjectId;
use transact::Reply;
use transact::Status;
use transact::Transaction;

use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::dispatch::Service;
use crate::dispatch::malformed_reply;
use crate::dispatch::service_addr;

struct Object {
    service: Arc<dyn Service>,
    refs: usize,
    pinned: bool,
}

pub struct Node {
    objects: DashMap<ObjectId, Object>,
    by_addr: DashMap<usize, ObjectId>,
    names: DashMap<String, ObjectId>,
    next_id: AtomicU64,
    config: Config,
}

impl Node {
    pub fn new(config: Config) -> Self {
        Self {
            objects: DashMap::new(),
            by_addr: DashMap::new(),
            names: DashMap::new(),
            next_id: AtomicU64::new(1),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Registers a pinned root service under `name`.
    ///
    /// Re-registering a name replaces the mapping; the old object stays
    /// reachable through handles that already name it.
    pub fn add_service(&self, name: &str, service: Arc<dyn Service>) -> ObjectId {
        let addr = service_addr(&service);
        let interface = service.descriptor().name;

        let id = match self.by_addr.entry(addr) {
            Entry::Occupied(mut e) => {
                let id = *e.get();
                if let Some(mut object) = self.objects.get_mut(&id) {
                    object.pinned = true;
                    id
                } else {
                    let id = self.insert(service, 0, true);
                    e.insert(id);
                    id
                }
            }
            Entry::Vacant(e) => {
                let id = self.insert(service, 0, true);
                e.insert(id);
                id
            }
        };

        self.names.insert(name.to_string(), id);
        debug!(name, interface, %id, "registered service");
        id
    }

    /// The id of the root service registered under `name`.
    pub fn lookup(&self, name: &str) -> Option<ObjectId> {
        self.names.get(name).map(|id| *id)
    }

    /// Exposes `service` and takes one reference on it for the caller.
    pub fn publish(&self, service: Arc<dyn Service>) -> ObjectId {
        let addr = service_addr(&service);

        match self.by_addr.entry(addr) {
            Entry::Occupied(mut e) => {
                let id = *e.get();
                if let Some(mut object) = self.objects.get_mut(&id) {
                    object.refs += 1;
                    trace!(%id, refs = object.refs, "republished");
                    return id;
                }
                // Released concurrently; the old id is gone for good.
                let id = self.insert(service, 1, false);
                e.insert(id);
                id
            }
            Entry::Vacant(e) => {
                let id = self.insert(service, 1, false);
                e.insert(id);
                id
            }
        }
    }

    fn insert(&self, service: Arc<dyn Service>, refs: usize, pinned: bool) -> ObjectId {
        let id = ObjectId(self.next_id.fetch_add(1, Ordering::Relaxed));
        trace!(%id, interface = service.descriptor().name, "published");
        self.objects.insert(id, Object { service, refs, pinned });
        id
    }

    /// Drops one reference. Unpinned objects are destroyed at zero.
    pub fn release(&self, id: ObjectId) {
        let removed = match self.objects.entry(id) {
            Entry::Occupied(mut e) => {
                let object = e.get_mut();
                if object.pinned {
                    return;
                }
                object.refs = object.refs.saturating_sub(1);
                if object.refs == 0 { Some(e.remove()) } else { None }
            }
            Entry::Vacant(_) => None,
        };

        if let Some(object) = removed {
            self.forget_addr(&object.service, id);
            debug!(%id, "destroyed");
        }
    }

    /// Resolves a live object, evicting it if it has died.
    pub fn resolve(&self, id: ObjectId) -> Option<Arc<dyn Service>> {
        let service = self.objects.get(&id).map(|object| object.service.clone())?;
        if service.is_alive() {
            return Some(service);
        }

        if let Some((_, object)) = self.objects.remove(&id) {
            self.forget_addr(&object.service, id);
            debug!(%id, "evicted dead object");
        }
        None
    }

    fn forget_addr(&self, service: &Arc<dyn Service>, id: ObjectId) {
        self.by_addr.remove_if(&service_addr(service), |_, mapped| *mapped == id);
    }

    /// Whether `id` names a live object.
    pub fn contains(&self, id: ObjectId) -> bool {
        self.resolve(id).is_some()
    }

    /// Number of objects in the table, dead or alive.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Serves one transaction frame and returns the reply frame.
    ///
    /// Never fails: every problem is turned into a reply status.
    pub async fn transact(&self, target: ObjectId, frame: &[u8]) -> Vec<u8> {
        self.transact_tracked(target, frame).await.0
    }

    /// Like [`Node::transact`], also reporting the object whose reference
    /// the reply carries, so a connection can account for it.
    pub(crate) async fn transact_tracked(&self, target: ObjectId, frame: &[u8]) -> (Vec<u8>, Option<ObjectId>) {
        let (reply, published) = self.serve(target, frame).await;

        match reply.encode() {
            Ok(bytes) => (bytes, published),
            Err(e) => {
                warn!(object = %target, error = %e, "reply could not be framed");
                if let Some(id) = published {
                    self.release(id);
                }
                (Reply::encode_bare(Status::MalformedPayload), None)
            }
        }
    }

    async fn serve(&self, target: ObjectId, frame: &[u8]) -> (Reply, Option<ObjectId>) {
        if frame.len() > self.config.max_transaction_len {
            warn!(object = %target, len = frame.len(), max = self.config.max_transaction_len, "oversized transaction");
            return (malformed_reply("transaction exceeds the size limit"), None);
        }

        let transaction = match Transaction::decode(frame) {
            Ok(t) => t,
            Err(e) => {
                debug!(object = %target, error = %e, "undecodable transaction frame");
                return (malformed_reply(&e.to_string()), None);
            }
        };

        let Some(service) = self.resolve(target) else {
            debug!(object = %target, code = transaction.code, "transaction on dead object");
            return (Reply::bare(Status::TransportFailure), None);
        };

        trace!(object = %target, code = transaction.code, len = transaction.payload.len(), "dispatching");
        Dispatcher::new(self).dispatch(&service, transaction.code, &transaction.payload).await
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
