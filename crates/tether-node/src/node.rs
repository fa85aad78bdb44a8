//! The untyped configuration tree.
//!
//! A [`ConfigNode`] is what a document parser (YAML, TOML, JSON, ...)
//! leaves behind once syntax is gone: scalars, ordered sequences, and
//! ordered string-keyed mappings. The tree is immutable once built and
//! can be shared freely between concurrent readers.

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

// ---------------------------------------------------------------------------
// Scalar
// ---------------------------------------------------------------------------

/// A leaf value in the tree.
///
/// Integers and floats stay separate: `3` and `3.0` are different tokens
/// in every format a parser hands us. Integers that fit an `i64` are
/// `Int`; only larger unsigned ones use `UInt`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
}

impl Scalar {
    /// Short name of the scalar's runtime type, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) | Self::UInt(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::UInt(u) => write!(f, "{u}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

// ---------------------------------------------------------------------------
// Mapping
// ---------------------------------------------------------------------------

/// An insertion-ordered map from string keys to nodes.
///
/// Config documents are small and humans care about key order, so this
/// is a plain vector of pairs. Lookups are linear.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mapping {
    entries: Vec<(String, ConfigNode)>,
}

impl Mapping {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a key. An existing key keeps its position and gets the new
    /// value; the old value is returned.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<ConfigNode>,
    ) -> Option<ConfigNode> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(
        mut self,
        key: impl Into<String>,
        value: impl Into<ConfigNode>,
    ) -> Self {
        self.insert(key, value);
        self
    }

    /// Looks up a direct child by key.
    pub fn get(&self, key: &str) -> Option<&ConfigNode> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigNode)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<ConfigNode>> FromIterator<(K, V)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mapping = Mapping::new();
        for (k, v) in iter {
            mapping.insert(k, v);
        }
        mapping
    }
}

impl Serialize for Mapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// ConfigNode
// ---------------------------------------------------------------------------

/// One node of the configuration tree.
///
/// ```rust
/// use tether_node::{ConfigNode, Mapping};
///
/// let root = ConfigNode::from(
///     Mapping::new().with("a", Mapping::new().with("b", true)),
/// );
///
/// assert_eq!(root.lookup("a.b"), Some(&ConfigNode::from(true)));
/// assert_eq!(root.lookup("a.c"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConfigNode {
    Scalar(Scalar),
    Sequence(Vec<ConfigNode>),
    Mapping(Mapping),
}

impl ConfigNode {
    /// Resolves a dotted path (`"a.b.c"`) by descending through mappings.
    ///
    /// Returns `None` if any segment is missing, or if an intermediate
    /// node is not a mapping.
    pub fn lookup(&self, path: &str) -> Option<&ConfigNode> {
        path.split('.')
            .try_fold(self, |node, key| node.as_mapping()?.get(key))
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[ConfigNode]> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Self::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Short name of the node's runtime type, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Scalar(s) => s.kind(),
            Self::Sequence(_) => "sequence",
            Self::Mapping(_) => "mapping",
        }
    }
}

impl fmt::Display for ConfigNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(s) => write!(f, "{s}"),
            Self::Sequence(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Mapping(m) => {
                f.write_str("{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<Scalar> for ConfigNode {
    fn from(s: Scalar) -> Self {
        Self::Scalar(s)
    }
}

impl From<bool> for ConfigNode {
    fn from(b: bool) -> Self {
        Self::Scalar(Scalar::Bool(b))
    }
}

impl From<i64> for ConfigNode {
    fn from(i: i64) -> Self {
        Self::Scalar(Scalar::Int(i))
    }
}

impl From<i32> for ConfigNode {
    fn from(i: i32) -> Self {
        Self::Scalar(Scalar::Int(i64::from(i)))
    }
}

impl From<u64> for ConfigNode {
    fn from(u: u64) -> Self {
        match i64::try_from(u) {
            Ok(i) => Self::Scalar(Scalar::Int(i)),
            Err(_) => Self::Scalar(Scalar::UInt(u)),
        }
    }
}

impl From<f64> for ConfigNode {
    fn from(x: f64) -> Self {
        Self::Scalar(Scalar::Float(x))
    }
}

impl From<&str> for ConfigNode {
    fn from(s: &str) -> Self {
        Self::Scalar(Scalar::Str(s.to_owned()))
    }
}

impl From<String> for ConfigNode {
    fn from(s: String) -> Self {
        Self::Scalar(Scalar::Str(s))
    }
}

impl From<Mapping> for ConfigNode {
    fn from(m: Mapping) -> Self {
        Self::Mapping(m)
    }
}

impl<T: Into<ConfigNode>> From<Vec<T>> for ConfigNode {
    fn from(items: Vec<T>) -> Self {
        Self::Sequence(items.into_iter().map(Into::into).collect())
    }
}
