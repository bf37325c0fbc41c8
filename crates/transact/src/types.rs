//! # Value Model
//!
//! `Type` describes what a parameter or result looks like; `Value` is the
//! runtime data. Types are built from `&'static` parts so descriptor tables can
//! be plain statics with no initialisation at runtime.

/// Strong type for a remote object reference.
///
/// The token is an index into the serving side's object table. It carries no
/// data of its own and is meaningless outside the transport it came from.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "obj-{}", self.0)
    }
}

/// The declared type of a parameter, result or struct field.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Type {
    Void,
    Bool,
    /// 32-bit signed integer.
    Int,
    /// 64-bit signed integer.
    Long,
    String,
    Bytes,
    /// Ordered sequence of a single element type.
    List(&'static Type),
    /// A parcelable record with ordered, named fields.
    Struct(&'static StructSchema),
    /// A remote object implementing the named interface.
    Interface(&'static str),
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Bool => write!(f, "boolean"),
            Type::Int => write!(f, "int"),
            Type::Long => write!(f, "long"),
            Type::String => write!(f, "String"),
            Type::Bytes => write!(f, "byte[]"),
            Type::List(elem) => write!(f, "List<{}>", elem),
            Type::Struct(schema) => write!(f, "{}", schema.name),
            Type::Interface(name) => write!(f, "{}", name),
        }
    }
}

/// The layout of a parcelable record.
#[derive(Debug, PartialEq, Eq)]
pub struct StructSchema {
    pub name: &'static str,
    pub fields: &'static [Field],
}

/// A single named field of a `StructSchema`.
#[derive(Debug, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub ty: Type,
}

/// A runtime value crossing the process boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Void,
    Bool(bool),
    Int(i32),
    Long(i64),
    String(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    /// Field values in schema order.
    Struct(Vec<Value>),
    /// A reference to a remote object.
    Binder(ObjectId),
}

impl Value {
    /// Short description of the value's shape, used in error messages.
    pub fn desc(&self) -> &'static str {
        match self {
            Value::Void => "void",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::String(_) => "String",
            Value::Bytes(_) => "byte[]",
            Value::List(_) => "List",
            Value::Struct(_) => "struct",
            Value::Binder(_) => "binder",
        }
    }

    /// Checks structurally that this value can be encoded as `ty`.
    pub fn conforms(&self, ty: &Type) -> bool {
        match (self, ty) {
            (Value::Void, Type::Void)
            | (Value::Bool(_), Type::Bool)
            | (Value::Int(_), Type::Int)
            | (Value::Long(_), Type::Long)
            | (Value::String(_), Type::String)
            | (Value::Bytes(_), Type::Bytes)
            | (Value::Binder(_), Type::Interface(_)) => true,
            (Value::List(items), Type::List(elem)) => items.iter().all(|v| v.conforms(elem)),
            (Value::Struct(values), Type::Struct(schema)) => {
                values.len() == schema.fields.len()
                    && values.iter().zip(schema.fields).all(|(v, f)| v.conforms(&f.ty))
            }
            _ => false,
        }
    }
}
