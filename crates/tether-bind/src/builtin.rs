//! The built-in conversion strategies.

use tether_node::{BaseType, ConfigNode, Scalar, TypeDescriptor, Value};
use tracing::debug;

use crate::{CastContext, ConversionStrategy};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Passes a raw value through when its runtime type already is the target.
///
/// `int` satisfies `i64`, `float` satisfies `f64`, and anything satisfies
/// `Node`. Narrower widths go through [`NumberStrategy`].
///
/// Its priority sorts it ahead of every other arity-0 strategy, so a
/// value that needs no conversion never gets one.
pub struct IdentityStrategy;

impl ConversionStrategy for IdentityStrategy {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn arity(&self) -> usize {
        0
    }

    fn priority(&self) -> i32 {
        -100
    }

    fn applicable(&self, target: &TypeDescriptor, raw: &ConfigNode) -> bool {
        match (&target.base, raw) {
            (BaseType::Node, _) => true,
            (BaseType::Bool, ConfigNode::Scalar(Scalar::Bool(_)))
            | (BaseType::I64, ConfigNode::Scalar(Scalar::Int(_)))
            | (BaseType::F64, ConfigNode::Scalar(Scalar::Float(_)))
            | (BaseType::String, ConfigNode::Scalar(Scalar::Str(_))) => true,
            _ => false,
        }
    }

    fn convert(
        &self,
        target: &TypeDescriptor,
        raw: &ConfigNode,
        _cx: &mut CastContext<'_>,
    ) -> Option<Value> {
        if target.base == BaseType::Node {
            return Some(Value::Node(raw.clone()));
        }
        Some(match raw.as_scalar()? {
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Int(i) => Value::I64(*i),
            Scalar::UInt(u) => Value::U64(*u),
            Scalar::Float(x) => Value::F64(*x),
            Scalar::Str(s) => Value::String(s.clone()),
        })
    }
}

// ---------------------------------------------------------------------------
// Boolean
// ---------------------------------------------------------------------------

/// Reads booleans, or the strings `"true"` / `"false"` in any case.
///
/// Anything else is not a boolean: `"yes"` does not silently become
/// `false`.
pub struct BooleanStrategy;

impl ConversionStrategy for BooleanStrategy {
    fn name(&self) -> &'static str {
        "boolean"
    }

    fn arity(&self) -> usize {
        0
    }

    fn applicable(&self, target: &TypeDescriptor, _raw: &ConfigNode) -> bool {
        target.base == BaseType::Bool
    }

    fn convert(
        &self,
        _target: &TypeDescriptor,
        raw: &ConfigNode,
        _cx: &mut CastContext<'_>,
    ) -> Option<Value> {
        match raw.as_scalar()? {
            Scalar::Bool(b) => Some(Value::Bool(*b)),
            Scalar::Str(s) => {
                let s = s.trim();
                if s.eq_ignore_ascii_case("true") {
                    Some(Value::Bool(true))
                } else if s.eq_ignore_ascii_case("false") {
                    Some(Value::Bool(false))
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Number
// ---------------------------------------------------------------------------

/// Narrows a number to the exact target width.
///
/// Narrowing truncates like an `as` cast: `300` into an `i8` is `44`,
/// `-1` into a `u8` is `255`, and a float loses its fraction before being
/// narrowed. There is no overflow check.
///
/// Mapping keys always arrive as strings, so numeric strings are parsed
/// first. That's what lets `Map<u32, _>` bind at all.
pub struct NumberStrategy;

#[derive(Clone, Copy)]
enum Number {
    Int(i64),
    UInt(u64),
    Float(f64),
}

impl Number {
    fn from_scalar(scalar: &Scalar) -> Option<Self> {
        match scalar {
            Scalar::Int(i) => Some(Self::Int(*i)),
            Scalar::UInt(u) => Some(Self::UInt(*u)),
            Scalar::Float(x) => Some(Self::Float(*x)),
            Scalar::Str(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .map(Self::Int)
                    .or_else(|_| s.parse::<u64>().map(Self::UInt))
                    .or_else(|_| s.parse::<f64>().map(Self::Float))
                    .ok()
            }
            Scalar::Bool(_) => None,
        }
    }

    fn as_i64(self) -> i64 {
        match self {
            Self::Int(i) => i,
            Self::UInt(u) => u as i64,
            Self::Float(x) => x as i64,
        }
    }

    fn as_u64(self) -> u64 {
        match self {
            Self::Int(i) => i as u64,
            Self::UInt(u) => u,
            Self::Float(x) => x as u64,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::UInt(u) => u as f64,
            Self::Float(x) => x,
        }
    }
}

impl ConversionStrategy for NumberStrategy {
    fn name(&self) -> &'static str {
        "number"
    }

    fn arity(&self) -> usize {
        0
    }

    fn applicable(&self, target: &TypeDescriptor, _raw: &ConfigNode) -> bool {
        target.base.is_numeric()
    }

    fn convert(
        &self,
        target: &TypeDescriptor,
        raw: &ConfigNode,
        _cx: &mut CastContext<'_>,
    ) -> Option<Value> {
        let n = Number::from_scalar(raw.as_scalar()?)?;
        let int = n.as_i64();
        Some(match target.base {
            BaseType::I8 => Value::I8(int as i8),
            BaseType::I16 => Value::I16(int as i16),
            BaseType::I32 => Value::I32(int as i32),
            BaseType::I64 => Value::I64(int),
            BaseType::U8 => Value::U8(int as u8),
            BaseType::U16 => Value::U16(int as u16),
            BaseType::U32 => Value::U32(int as u32),
            BaseType::U64 => Value::U64(n.as_u64()),
            BaseType::F32 => Value::F32(n.as_f64() as f32),
            BaseType::F64 => Value::F64(n.as_f64()),
            _ => return None,
        })
    }
}

// ---------------------------------------------------------------------------
// String
// ---------------------------------------------------------------------------

/// Stringifies any raw value. Sequences and mappings use the tree's
/// `Display` form.
pub struct StringStrategy;

impl ConversionStrategy for StringStrategy {
    fn name(&self) -> &'static str {
        "string"
    }

    fn arity(&self) -> usize {
        0
    }

    fn applicable(&self, target: &TypeDescriptor, _raw: &ConfigNode) -> bool {
        target.base == BaseType::String
    }

    fn convert(
        &self,
        _target: &TypeDescriptor,
        raw: &ConfigNode,
        _cx: &mut CastContext<'_>,
    ) -> Option<Value> {
        Some(Value::String(raw.to_string()))
    }
}

// ---------------------------------------------------------------------------
// List / Set
// ---------------------------------------------------------------------------

/// Coerces every element of a sequence, keeping order.
///
/// If any element fails, the whole list fails, so a bound list always
/// has exactly as many elements as the source sequence.
pub struct ListStrategy;

impl ConversionStrategy for ListStrategy {
    fn name(&self) -> &'static str {
        "list"
    }

    fn arity(&self) -> usize {
        1
    }

    fn applicable(&self, target: &TypeDescriptor, raw: &ConfigNode) -> bool {
        target.base == BaseType::List && raw.as_sequence().is_some()
    }

    fn convert(
        &self,
        target: &TypeDescriptor,
        raw: &ConfigNode,
        cx: &mut CastContext<'_>,
    ) -> Option<Value> {
        let [element] = target.args.as_slice() else {
            return None;
        };
        cast_elements(element, raw.as_sequence()?, cx).map(Value::List)
    }
}

/// Coerces every element of a sequence and collapses duplicates.
///
/// Equality is checked on the converted values, so `[1, "1"]` into a
/// `Set<i32>` yields one element. First occurrence wins.
pub struct SetStrategy;

impl ConversionStrategy for SetStrategy {
    fn name(&self) -> &'static str {
        "set"
    }

    fn arity(&self) -> usize {
        1
    }

    fn applicable(&self, target: &TypeDescriptor, raw: &ConfigNode) -> bool {
        target.base == BaseType::Set && raw.as_sequence().is_some()
    }

    fn convert(
        &self,
        target: &TypeDescriptor,
        raw: &ConfigNode,
        cx: &mut CastContext<'_>,
    ) -> Option<Value> {
        let [element] = target.args.as_slice() else {
            return None;
        };
        let values = cast_elements(element, raw.as_sequence()?, cx)?;

        let mut unique: Vec<Value> = Vec::with_capacity(values.len());
        for value in values {
            if !unique.contains(&value) {
                unique.push(value);
            }
        }
        Some(Value::Set(unique))
    }
}

fn cast_elements(
    element: &TypeDescriptor,
    items: &[ConfigNode],
    cx: &mut CastContext<'_>,
) -> Option<Vec<Value>> {
    items.iter().map(|item| cx.cast(element, item)).collect()
}

// ---------------------------------------------------------------------------
// Map
// ---------------------------------------------------------------------------

/// Coerces every key and value of a mapping.
///
/// Keys are offered to the registry as string scalars. An entry whose key
/// or value fails is dropped and counted in the [`CastContext`]; the rest
/// of the map still binds.
pub struct MapStrategy;

impl ConversionStrategy for MapStrategy {
    fn name(&self) -> &'static str {
        "map"
    }

    fn arity(&self) -> usize {
        2
    }

    fn applicable(&self, target: &TypeDescriptor, raw: &ConfigNode) -> bool {
        target.base == BaseType::Map && raw.as_mapping().is_some()
    }

    fn convert(
        &self,
        target: &TypeDescriptor,
        raw: &ConfigNode,
        cx: &mut CastContext<'_>,
    ) -> Option<Value> {
        let [key_ty, value_ty] = target.args.as_slice() else {
            return None;
        };
        let mapping = raw.as_mapping()?;

        let mut entries = Vec::with_capacity(mapping.len());
        for (key, node) in mapping.iter() {
            let key_node = ConfigNode::from(key);
            match (cx.cast(key_ty, &key_node), cx.cast(value_ty, node)) {
                (Some(k), Some(v)) => entries.push((k, v)),
                _ => {
                    debug!(key, %target, "map entry dropped: key or value did not convert");
                    cx.drop_entry();
                }
            }
        }
        Some(Value::Map(entries))
    }
}
