//! # Interface Registry
//!
//! Process-wide table of known interface descriptors, plus the two queries
//! that bind a raw handle to one of them.
//!
//! ## Invariants
//! - Every registered descriptor passed `Descriptor::validate`.
//! - Names are unique.
//! - The builtin registry is built once and read-only afterwards, so the call
//!   path never takes a lock.

use std::collections::HashMap;
use std::sync::LazyLock;

use tracing::debug;

use transact::Descriptor;
use transact::INTERFACE_TRANSACTION;
use transact::Status;
use transact::Type;
use transact::Value;
use transact::decode_result;

use crate::error::Error;
use crate::error::Result;
use crate::handle::Handle;
use crate::interfaces;
use crate::proxy::Proxy;
use crate::proxy::reply_error;

static BUILTIN: LazyLock<Registry> = LazyLock::new(|| {
    Registry::new(interfaces::ALL).expect("builtin interface descriptors are valid")
});

/// Name reported in errors from the descriptor query, which has no interface.
const BINDER: &str = "IBinder";

#[derive(Debug)]
pub struct Registry {
    descriptors: HashMap<&'static str, &'static Descriptor>,
}

impl Registry {
    /// Builds a registry, validating every table.
    pub fn new(descriptors: &[&'static Descriptor]) -> transact::Result<Self> {
        let mut map = HashMap::with_capacity(descriptors.len());
        for descriptor in descriptors {
            descriptor.validate()?;
            if map.insert(descriptor.name, *descriptor).is_some() {
                return Err(transact::Error::InvalidDescriptor {
                    interface: descriptor.name,
                    reason: "registered twice".into(),
                });
            }
        }
        Ok(Self { descriptors: map })
    }

    /// The registry of the interfaces in [`crate::interfaces`].
    pub fn builtin() -> &'static Registry {
        &BUILTIN
    }

    pub fn lookup(&self, name: &str) -> Option<&'static Descriptor> {
        self.descriptors.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Asks the remote object which interface it implements.
    ///
    /// Side-effect free and answerable by any live object.
    pub async fn descriptor_of(&self, handle: &Handle) -> Result<String> {
        let reply = handle.transact(INTERFACE_TRANSACTION, Vec::new()).await?;
        if reply.status != Status::Ok {
            return Err(reply_error(handle, BINDER, INTERFACE_TRANSACTION, reply));
        }

        match decode_result(&reply.payload, &Type::String)? {
            Value::String(name) => Ok(name),
            other => Err(Error::UnexpectedResult(format!("descriptor query returned {}", other.desc()))),
        }
    }

    /// Binds `handle` to `descriptor` if the remote object implements it.
    ///
    /// A different interface yields `Ok(None)`, the cast-style answer. Only a
    /// failed query is an error. Interfaces returned by calls on the proxy are
    /// resolved in this registry, so custom registries live in a `static`.
    pub async fn as_interface(&'static self, handle: &Handle, descriptor: &'static Descriptor) -> Result<Option<Proxy>> {
        let name = self.descriptor_of(handle).await?;
        if name != descriptor.name {
            debug!(object = %handle.id(), expected = descriptor.name, found = %name, "interface mismatch");
            return Ok(None);
        }
        Ok(Some(Proxy::new(handle.clone(), descriptor, self)))
    }

    /// Like [`Registry::as_interface`], resolving the descriptor by name.
    pub async fn as_interface_named(&'static self, handle: &Handle, name: &str) -> Result<Option<Proxy>> {
        let descriptor = self.lookup(name).ok_or_else(|| Error::UnregisteredInterface(name.to_string()))?;
        self.as_interface(handle, descriptor).await
    }
}
