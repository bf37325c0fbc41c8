//! # Interface Descriptors
//!
//! The static identity of an interface: a stable name plus an ordered method
//! table. Both ends of a connection must agree on these tables; the codes are
//! the only thing that travels on the wire.
//!
//! ## Invariants
//! - Code `INTERFACE_TRANSACTION` is reserved for the descriptor query.
//! - Codes and method names are unique within one interface.

use crate::error::Error;
use crate::error::Result;
use crate::types::Type;

/// Reserved code asking a remote object for its descriptor name.
pub const INTERFACE_TRANSACTION: u32 = 0;

/// The first code available to interface methods.
pub const FIRST_CALL_TRANSACTION: u32 = 1;

/// A named parameter of a method signature.
#[derive(Debug, PartialEq, Eq)]
pub struct Param {
    pub name: &'static str,
    pub ty: Type,
}

/// One entry of an interface's method table.
#[derive(Debug, PartialEq, Eq)]
pub struct Method {
    pub name: &'static str,
    pub code: u32,
    pub params: &'static [Param],
    pub result: Type,
    /// Exception kinds the method may raise across the boundary.
    pub throws: &'static [&'static str],
}

impl Method {
    /// Whether `kind` is part of this method's declared failure channel.
    pub fn declares(&self, kind: &str) -> bool {
        self.throws.iter().any(|k| *k == kind)
    }
}

/// The identity and method table of an interface.
#[derive(Debug, PartialEq, Eq)]
pub struct Descriptor {
    pub name: &'static str,
    pub methods: &'static [Method],
}

impl Descriptor {
    /// Looks up a method by transaction code.
    pub fn method(&self, code: u32) -> Option<&'static Method> {
        let methods: &'static [Method] = self.methods;
        methods.iter().find(|m| m.code == code)
    }

    /// Looks up a method by name.
    pub fn method_named(&self, name: &str) -> Option<&'static Method> {
        let methods: &'static [Method] = self.methods;
        methods.iter().find(|m| m.name == name)
    }

    /// Checks the table invariants.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Error::InvalidDescriptor { interface: self.name, reason };

        if self.name.is_empty() {
            return Err(invalid("empty interface name".into()));
        }

        for (i, method) in self.methods.iter().enumerate() {
            if method.code < FIRST_CALL_TRANSACTION {
                return Err(invalid(format!("method '{}' uses reserved code {}", method.name, method.code)));
            }
            for other in &self.methods[i + 1..] {
                if other.code == method.code {
                    return Err(invalid(format!(
                        "methods '{}' and '{}' share code {}",
                        method.name, other.name, method.code
                    )));
                }
                if other.name == method.name {
                    return Err(invalid(format!("method '{}' is declared twice", method.name)));
                }
            }
            if method.params.iter().any(|p| p.ty == Type::Void) {
                return Err(invalid(format!("method '{}' has a void parameter", method.name)));
            }
        }

        Ok(())
    }
}
