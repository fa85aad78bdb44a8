//! Mapping Rust field types to descriptors and back.
//!
//! [`FromValue`] is the static half of binding: a field's Rust type says
//! which [`TypeDescriptor`] to ask the registry for, and how to unpack
//! the resulting [`Value`].

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::Hash;

use chrono::{DateTime, Utc};
use tether_node::{BaseType, ConfigNode, TypeDescriptor, Value};

/// A Rust type that can be the target of a binding.
///
/// Implementations exist for the primitive scalars, `String`, the std
/// collections, `Option<T>`, raw [`ConfigNode`] subtrees, and
/// `DateTime<Utc>` (stored as epoch milliseconds).
///
/// Consumer types produced by a custom strategy implement it by returning
/// a [`TypeDescriptor::named`] descriptor and downcasting
/// [`Value::Opaque`].
pub trait FromValue: Sized {
    /// The descriptor the registry should cast to.
    fn descriptor() -> TypeDescriptor;

    /// Unpacks a converted value. `None` if it has the wrong shape.
    fn from_value(value: Value) -> Option<Self>;
}

macro_rules! scalar_from_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl FromValue for $ty {
                fn descriptor() -> TypeDescriptor {
                    TypeDescriptor::scalar(BaseType::$variant)
                }

                fn from_value(value: Value) -> Option<Self> {
                    match value {
                        Value::$variant(v) => Some(v),
                        _ => None,
                    }
                }
            }
        )*
    };
}

scalar_from_value! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    String => String,
}

impl FromValue for ConfigNode {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::scalar(BaseType::Node)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Node(node) => Some(node),
            _ => None,
        }
    }
}

/// A present path overwrites `None` with `Some`. An absent path leaves the
/// field alone, so a pre-set `Some` default survives.
impl<T: FromValue> FromValue for Option<T> {
    fn descriptor() -> TypeDescriptor {
        T::descriptor()
    }

    fn from_value(value: Value) -> Option<Self> {
        T::from_value(value).map(Some)
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::list(T::descriptor())
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            _ => None,
        }
    }
}

impl<T: FromValue + Eq + Hash> FromValue for HashSet<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::set(T::descriptor())
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Set(items) => items.into_iter().map(T::from_value).collect(),
            _ => None,
        }
    }
}

impl<T: FromValue + Ord> FromValue for BTreeSet<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::set(T::descriptor())
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Set(items) => items.into_iter().map(T::from_value).collect(),
            _ => None,
        }
    }
}

impl<K: FromValue + Eq + Hash, V: FromValue> FromValue for HashMap<K, V> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::map(K::descriptor(), V::descriptor())
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Map(entries) => entries
                .into_iter()
                .map(|(k, v)| Some((K::from_value(k)?, V::from_value(v)?)))
                .collect(),
            _ => None,
        }
    }
}

impl<K: FromValue + Ord, V: FromValue> FromValue for BTreeMap<K, V> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::map(K::descriptor(), V::descriptor())
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Map(entries) => entries
                .into_iter()
                .map(|(k, v)| Some((K::from_value(k)?, V::from_value(v)?)))
                .collect(),
            _ => None,
        }
    }
}

/// Timestamps are persisted as milliseconds since the Unix epoch.
impl FromValue for DateTime<Utc> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::scalar(BaseType::I64)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::I64(millis) => DateTime::from_timestamp_millis(millis),
            _ => None,
        }
    }
}
