//! The strategy trait and the per-cast context.
//!
//! A strategy is one casting rule. The registry doesn't care HOW a
//! strategy converts; it only asks two questions: how many generic
//! arguments do you need, and can you handle this pair? Everything else
//! is up to the implementation, which keeps each rule testable on its own.

use tether_node::{ConfigNode, TypeDescriptor, Value};

use crate::ConversionRegistry;

/// One pluggable casting rule.
///
/// # Ordering
///
/// The registry sorts strategies by `(arity, priority)`, both ascending.
/// Strategies needing fewer generic arguments are tried first, and among
/// equal arity a lower `priority` wins. Registration order only breaks
/// ties that remain after that.
///
/// # Example
///
/// ```rust
/// use tether_bind::{CastContext, ConversionRegistry, ConversionStrategy};
/// use tether_node::{BaseType, ConfigNode, Scalar, TypeDescriptor, Value};
///
/// /// Reads "on"/"off" switches as booleans.
/// struct SwitchStrategy;
///
/// impl ConversionStrategy for SwitchStrategy {
///     fn name(&self) -> &'static str { "switch" }
///     fn arity(&self) -> usize { 0 }
///     fn priority(&self) -> i32 { -10 }
///
///     fn applicable(&self, target: &TypeDescriptor, raw: &ConfigNode) -> bool {
///         target.base == BaseType::Bool
///             && matches!(raw, ConfigNode::Scalar(Scalar::Str(s)) if s == "on" || s == "off")
///     }
///
///     fn convert(
///         &self,
///         _target: &TypeDescriptor,
///         raw: &ConfigNode,
///         _cx: &mut CastContext<'_>,
///     ) -> Option<Value> {
///         Some(Value::Bool(raw.as_scalar()?.to_string() == "on"))
///     }
/// }
///
/// let mut registry = ConversionRegistry::with_defaults();
/// registry.register(Box::new(SwitchStrategy));
///
/// let bool_ty = TypeDescriptor::scalar(BaseType::Bool);
/// assert_eq!(registry.cast(&bool_ty, &ConfigNode::from("on")), Some(Value::Bool(true)));
/// ```
pub trait ConversionStrategy: Send + Sync + 'static {
    /// Short name used in logs and [`ConversionRegistry::strategy_names`].
    fn name(&self) -> &'static str;

    /// Number of generic arguments this strategy consumes.
    fn arity(&self) -> usize;

    /// Tie-break among strategies of equal arity. Lower runs first.
    fn priority(&self) -> i32 {
        0
    }

    /// Whether this strategy handles `raw` for `target`.
    fn applicable(&self, target: &TypeDescriptor, raw: &ConfigNode) -> bool;

    /// Performs the conversion.
    ///
    /// Container strategies recurse through [`CastContext::cast`] so that
    /// nested elements go through the same registry.
    fn convert(
        &self,
        target: &TypeDescriptor,
        raw: &ConfigNode,
        cx: &mut CastContext<'_>,
    ) -> Option<Value>;
}

/// State shared by one top-level cast and all its nested casts.
pub struct CastContext<'r> {
    registry: &'r ConversionRegistry,
    dropped_entries: usize,
}

impl<'r> CastContext<'r> {
    pub fn new(registry: &'r ConversionRegistry) -> Self {
        Self {
            registry,
            dropped_entries: 0,
        }
    }

    /// Casts a nested value through the same registry.
    pub fn cast(
        &mut self,
        target: &TypeDescriptor,
        raw: &ConfigNode,
    ) -> Option<Value> {
        let registry = self.registry;
        registry.cast_with(target, raw, self)
    }

    /// Records that a map entry was discarded.
    pub fn drop_entry(&mut self) {
        self.dropped_entries += 1;
    }

    /// How many map entries were discarded so far.
    pub fn dropped_entries(&self) -> usize {
        self.dropped_entries
    }
}
