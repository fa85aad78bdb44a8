//! The conversion registry: ordering and dispatch.

use tether_node::{ConfigNode, TypeDescriptor, Value};
use tracing::trace;

use crate::builtin::{
    BooleanStrategy, IdentityStrategy, ListStrategy, MapStrategy,
    NumberStrategy, SetStrategy, StringStrategy,
};
use crate::{CastContext, ConversionStrategy};

/// An ordered set of [`ConversionStrategy`]s.
///
/// The registry is a plain owned value. Extensions register strategies
/// on the instance they were handed; there is no process-wide registry.
///
/// ## Dispatch
///
/// Strategies are kept sorted by `(arity, priority)`. For a cast, the
/// first strategy whose arity equals the target's generic-argument count
/// AND which reports itself applicable gets to convert. Its answer is
/// final: if it returns `None`, later strategies are not consulted.
/// When nothing matches, the result is `None`.
pub struct ConversionRegistry {
    strategies: Vec<Box<dyn ConversionStrategy>>,
}

impl ConversionRegistry {
    /// A registry with no strategies at all.
    pub fn empty() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// A registry with the seven built-in strategies.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(IdentityStrategy));
        registry.register(Box::new(BooleanStrategy));
        registry.register(Box::new(NumberStrategy));
        registry.register(Box::new(StringStrategy));
        registry.register(Box::new(ListStrategy));
        registry.register(Box::new(SetStrategy));
        registry.register(Box::new(MapStrategy));
        registry
    }

    /// Adds a strategy and re-sorts.
    ///
    /// `sort_by_key` is stable, so equal keys keep registration order.
    pub fn register(&mut self, strategy: Box<dyn ConversionStrategy>) {
        trace!(
            strategy = strategy.name(),
            arity = strategy.arity(),
            priority = strategy.priority(),
            "registering conversion strategy"
        );
        self.strategies.push(strategy);
        self.strategies.sort_by_key(|s| (s.arity(), s.priority()));
    }

    /// Converts `raw` to `target`, or `None` if no strategy can.
    pub fn cast(&self, target: &TypeDescriptor, raw: &ConfigNode) -> Option<Value> {
        let mut cx = CastContext::new(self);
        self.cast_with(target, raw, &mut cx)
    }

    /// Like [`cast`](Self::cast), but accumulates diagnostics in `cx`.
    pub fn cast_with(
        &self,
        target: &TypeDescriptor,
        raw: &ConfigNode,
        cx: &mut CastContext<'_>,
    ) -> Option<Value> {
        let arity = target.args.len();
        let Some(strategy) = self
            .strategies
            .iter()
            .find(|s| s.arity() == arity && s.applicable(target, raw))
        else {
            trace!(%target, raw = raw.kind(), "no applicable strategy");
            return None;
        };

        trace!(%target, raw = raw.kind(), strategy = strategy.name(), "casting");
        strategy.convert(target, raw, cx)
    }

    /// Strategy names in dispatch order.
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl Default for ConversionRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
