//! Type references as recorded in the structural snapshot.
//!
//! Descriptors never hold full class data for referenced types, only an
//! opaque `TypeRef`. Consumers resolve a `TypeRef` back to a class on
//! demand, which keeps classification non-recursive even when nested
//! element types reference each other.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Java primitive type names.
const PRIMITIVES: &[&str] = &[
    "boolean", "byte", "short", "int", "long", "char", "float", "double",
];

/// A reference to a Java type, keyed by name.
///
/// The snapshot writes types as plain strings (`"void"`, `"int"`,
/// `"java.lang.String"`, `"int[]"`); the conversion is infallible, so any
/// unrecognized string is treated as a declared type name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TypeRef {
    Void,
    Primitive(String),
    Array(Box<TypeRef>),
    Declared(String),
}

impl TypeRef {
    pub fn parse(s: &str) -> TypeRef {
        let s = s.trim();
        if let Some(inner) = s.strip_suffix("[]") {
            return TypeRef::Array(Box::new(TypeRef::parse(inner)));
        }
        if s == "void" {
            return TypeRef::Void;
        }
        if PRIMITIVES.contains(&s) {
            return TypeRef::Primitive(s.to_string());
        }
        TypeRef::Declared(s.to_string())
    }

    pub(crate) fn void_default() -> TypeRef {
        TypeRef::Void
    }

    pub fn is_void(&self) -> bool {
        matches!(self, TypeRef::Void)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, TypeRef::Array(_))
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeRef::Primitive(_))
    }

    /// Check whether this is the declared type with the given qualified name.
    pub fn is_declared(&self, qualified_name: &str) -> bool {
        matches!(self, TypeRef::Declared(n) if n == qualified_name)
    }

    /// The qualified name, for declared types only.
    pub fn declared_name(&self) -> Option<&str> {
        match self {
            TypeRef::Declared(n) => Some(n),
            _ => None,
        }
    }

    /// A short display name: the last segment of a qualified name, with
    /// nested-class separators normalized to dots.
    pub fn simple_name(&self) -> String {
        match self {
            TypeRef::Void => "void".to_string(),
            TypeRef::Primitive(n) => n.clone(),
            TypeRef::Array(inner) => format!("{}[]", inner.simple_name()),
            TypeRef::Declared(n) => {
                let last = n.rsplit('.').next().unwrap_or(n);
                last.replace('$', ".")
            }
        }
    }
}

impl From<String> for TypeRef {
    fn from(s: String) -> Self {
        TypeRef::parse(&s)
    }
}

impl From<TypeRef> for String {
    fn from(t: TypeRef) -> Self {
        t.to_string()
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Void => write!(f, "void"),
            TypeRef::Primitive(n) => write!(f, "{}", n),
            TypeRef::Array(inner) => write!(f, "{}[]", inner),
            TypeRef::Declared(n) => write!(f, "{}", n),
        }
    }
}
