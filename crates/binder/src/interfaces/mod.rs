//! # Service Interfaces
//!
//! One module per interface. Each exports:
//! - a static `DESCRIPTOR` and its transaction code constants,
//! - a server-side async trait,
//! - a `…Stub<T>` that adapts the trait to [`crate::dispatch::Service`],
//! - a typed client `…Proxy`.

use transact::Descriptor;
use transact::exception;

pub mod installer_session;
pub mod package_installer;
pub mod package_manager;
pub mod permission_manager;

/// Every descriptor known to [`crate::registry::Registry::builtin`].
pub static ALL: &[&Descriptor] = &[
    &package_manager::DESCRIPTOR,
    &package_installer::DESCRIPTOR,
    &installer_session::DESCRIPTOR,
    &permission_manager::DESCRIPTOR,
];

/// Exception kinds every method of these interfaces may raise.
pub(crate) const THROWS: &[&str] = &[exception::SECURITY, exception::ILLEGAL_ARGUMENT, exception::ILLEGAL_STATE];

pub(crate) fn unknown_method(method: &transact::Method) -> crate::dispatch::Fault {
    crate::dispatch::Fault::Internal(anyhow::anyhow!("no handler for {} (code {})", method.name, method.code))
}
