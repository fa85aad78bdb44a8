//! Type descriptors: what a raw node should be turned into.

use std::borrow::Cow;
use std::fmt;

use crate::NodeError;

// ---------------------------------------------------------------------------
// BaseType
// ---------------------------------------------------------------------------

/// The outer type of a conversion target, without its generic arguments.
///
/// `Named` is the escape hatch for consumer-defined targets (a position,
/// a duration string, ...). Only a strategy registered for that name can
/// produce it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BaseType {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    String,
    List,
    Set,
    Map,
    /// The raw [`ConfigNode`](crate::ConfigNode) itself, unconverted.
    Node,
    Named(Cow<'static, str>),
}

impl BaseType {
    /// Number of generic arguments this type requires.
    ///
    /// Returns `None` for `Named` types, whose arity is whatever their
    /// strategy declares.
    pub fn arity(&self) -> Option<usize> {
        match self {
            Self::List | Self::Set => Some(1),
            Self::Map => Some(2),
            Self::Named(_) => None,
            _ => Some(0),
        }
    }

    /// `true` for every integer and floating-point width.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::I8
                | Self::I16
                | Self::I32
                | Self::I64
                | Self::U8
                | Self::U16
                | Self::U32
                | Self::U64
                | Self::F32
                | Self::F64
        )
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::String => "String",
            Self::List => "List",
            Self::Set => "Set",
            Self::Map => "Map",
            Self::Node => "Node",
            Self::Named(name) => name,
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// TypeDescriptor
// ---------------------------------------------------------------------------

/// A conversion target: a [`BaseType`] plus its resolved generic arguments.
///
/// `List<Map<String, i32>>` is
/// `list(map(scalar(String), scalar(I32)))`. The shorthand constructors
/// always satisfy the arity invariant; [`TypeDescriptor::new`] checks it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    pub base: BaseType,
    pub args: Vec<TypeDescriptor>,
}

impl TypeDescriptor {
    /// Builds a descriptor, checking that `args` matches the arity of `base`.
    ///
    /// # Errors
    /// Returns [`NodeError::ArityMismatch`] when the counts disagree.
    pub fn new(
        base: BaseType,
        args: Vec<TypeDescriptor>,
    ) -> Result<Self, NodeError> {
        if let Some(expected) = base.arity() {
            if expected != args.len() {
                return Err(NodeError::ArityMismatch {
                    base,
                    expected,
                    actual: args.len(),
                });
            }
        }
        Ok(Self { base, args })
    }

    /// A descriptor with no generic arguments.
    pub fn scalar(base: BaseType) -> Self {
        Self {
            base,
            args: Vec::new(),
        }
    }

    pub fn list(element: TypeDescriptor) -> Self {
        Self {
            base: BaseType::List,
            args: vec![element],
        }
    }

    pub fn set(element: TypeDescriptor) -> Self {
        Self {
            base: BaseType::Set,
            args: vec![element],
        }
    }

    pub fn map(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        Self {
            base: BaseType::Map,
            args: vec![key, value],
        }
    }

    /// A consumer-defined target with no generic arguments.
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self::scalar(BaseType::Named(name.into()))
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        if !self.args.is_empty() {
            f.write_str("<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{arg}")?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}
