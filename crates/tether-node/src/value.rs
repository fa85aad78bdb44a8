//! Typed values produced by conversion.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::ConfigNode;

/// The result of converting a [`ConfigNode`] to a [`TypeDescriptor`](crate::TypeDescriptor).
///
/// Each scalar variant matches one [`BaseType`](crate::BaseType) exactly,
/// so a field of type `u16` only ever receives `Value::U16`.
///
/// `Set` holds its elements already deduplicated (first occurrence wins).
/// It is a `Vec` rather than a hash set so that floats can live in it.
///
/// `Opaque` carries consumer-defined types produced by custom strategies.
/// Two opaque values are equal only if they are the same allocation.
#[derive(Clone)]
pub enum Value {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    List(Vec<Value>),
    Set(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Node(ConfigNode),
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl Value {
    /// Wraps a consumer-defined value.
    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        Self::Opaque(Arc::new(value))
    }

    /// Borrows the inner value of an `Opaque` if it has type `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Opaque(inner) => inner.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Bool(a), Bool(b)) => a == b,
            (I8(a), I8(b)) => a == b,
            (I16(a), I16(b)) => a == b,
            (I32(a), I32(b)) => a == b,
            (I64(a), I64(b)) => a == b,
            (U8(a), U8(b)) => a == b,
            (U16(a), U16(b)) => a == b,
            (U32(a), U32(b)) => a == b,
            (U64(a), U64(b)) => a == b,
            (F32(a), F32(b)) => a == b,
            (F64(a), F64(b)) => a == b,
            (String(a), String(b)) => a == b,
            (List(a), List(b)) | (Set(a), Set(b)) => a == b,
            (Map(a), Map(b)) => a == b,
            (Node(a), Node(b)) => a == b,
            (Opaque(a), Opaque(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Self::I8(v) => f.debug_tuple("I8").field(v).finish(),
            Self::I16(v) => f.debug_tuple("I16").field(v).finish(),
            Self::I32(v) => f.debug_tuple("I32").field(v).finish(),
            Self::I64(v) => f.debug_tuple("I64").field(v).finish(),
            Self::U8(v) => f.debug_tuple("U8").field(v).finish(),
            Self::U16(v) => f.debug_tuple("U16").field(v).finish(),
            Self::U32(v) => f.debug_tuple("U32").field(v).finish(),
            Self::U64(v) => f.debug_tuple("U64").field(v).finish(),
            Self::F32(v) => f.debug_tuple("F32").field(v).finish(),
            Self::F64(v) => f.debug_tuple("F64").field(v).finish(),
            Self::String(v) => f.debug_tuple("String").field(v).finish(),
            Self::List(v) => f.debug_tuple("List").field(v).finish(),
            Self::Set(v) => f.debug_tuple("Set").field(v).finish(),
            Self::Map(v) => f.debug_tuple("Map").field(v).finish(),
            Self::Node(v) => f.debug_tuple("Node").field(v).finish(),
            Self::Opaque(_) => f.write_str("Opaque(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Anchor(i32);

    #[test]
    fn test_eq_different_widths_are_not_equal() {
        assert_ne!(Value::I32(1), Value::I64(1));
        assert_eq!(Value::U8(7), Value::U8(7));
    }

    #[test]
    fn test_opaque_downcast_matches_type() {
        let v = Value::opaque(Anchor(3));
        assert_eq!(v.downcast_ref::<Anchor>(), Some(&Anchor(3)));
        assert!(v.downcast_ref::<String>().is_none());
        assert!(Value::I8(1).downcast_ref::<i8>().is_none());
    }

    #[test]
    fn test_opaque_eq_is_identity() {
        let a = Value::opaque(Anchor(1));
        let b = Value::opaque(Anchor(1));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }
}
