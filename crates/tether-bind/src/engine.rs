//! The binding engine: dotted paths in, typed fields out.

use std::borrow::Cow;

use tether_node::{ConfigNode, TypeDescriptor, Value};
use tracing::debug;

use crate::{CastContext, ConversionRegistry, FromValue};

// ---------------------------------------------------------------------------
// FieldBinding
// ---------------------------------------------------------------------------

type Assign<T> = Box<dyn Fn(&mut T, Value) -> bool + Send + Sync>;

/// Associates one field of `T` with a dotted path and a target type.
///
/// The target descriptor comes from the field's Rust type via
/// [`FromValue::descriptor`]. It can be replaced with
/// [`with_target`](Self::with_target) when a custom strategy should
/// handle the field instead.
pub struct FieldBinding<T> {
    path: Cow<'static, str>,
    target: TypeDescriptor,
    assign: Assign<T>,
}

impl<T: 'static> FieldBinding<T> {
    /// Binds the field returned by `access` to `path`.
    pub fn new<F, A>(path: impl Into<Cow<'static, str>>, access: A) -> Self
    where
        F: FromValue + 'static,
        A: for<'a> Fn(&'a mut T) -> &'a mut F + Send + Sync + 'static,
    {
        Self {
            path: path.into(),
            target: F::descriptor(),
            assign: Box::new(move |owner: &mut T, value: Value| match F::from_value(value) {
                Some(v) => {
                    *access(owner) = v;
                    true
                }
                None => false,
            }),
        }
    }

    /// Overrides the descriptor sent to the registry.
    pub fn with_target(mut self, target: TypeDescriptor) -> Self {
        self.target = target;
        self
    }
}

impl<T> FieldBinding<T> {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn target(&self) -> &TypeDescriptor {
        &self.target
    }

    /// Moves `value` into the field. `false` if it has the wrong shape.
    pub fn assign(&self, owner: &mut T, value: Value) -> bool {
        (self.assign)(owner, value)
    }
}

impl<T> std::fmt::Debug for FieldBinding<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldBinding")
            .field("path", &self.path)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// A type whose fields can be loaded from a configuration tree.
///
/// Fields start at whatever value the caller constructed the object
/// with; bindings only overwrite the ones the tree provides.
pub trait Bindable: Sized + 'static {
    fn bindings() -> Vec<FieldBinding<Self>>;
}

// ---------------------------------------------------------------------------
// LoadReport
// ---------------------------------------------------------------------------

/// What happened to each binding during a [`BindingEngine::load`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Fields that received a value.
    pub bound: usize,
    /// Paths that did not resolve in the tree (field kept its default).
    pub unresolved: Vec<String>,
    /// Paths that resolved but could not be converted (field kept its
    /// default).
    pub unconverted: Vec<String>,
    /// Map entries dropped inside otherwise successful conversions.
    pub dropped_entries: usize,
}

impl LoadReport {
    /// `true` when every binding produced a value with nothing dropped.
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
            && self.unconverted.is_empty()
            && self.dropped_entries == 0
    }
}

// ---------------------------------------------------------------------------
// BindingEngine
// ---------------------------------------------------------------------------

/// Loads [`Bindable`] objects from [`ConfigNode`] trees.
///
/// `load` is synchronous and never fails. It is a best-effort merge:
///
/// - a path that does not resolve leaves the field untouched;
/// - a value no strategy can convert leaves the field untouched.
///
/// Loading the same tree twice gives the same result as loading it once.
pub struct BindingEngine {
    registry: ConversionRegistry,
}

impl BindingEngine {
    pub fn new(registry: ConversionRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ConversionRegistry {
        &self.registry
    }

    /// Mutable access for registering extra strategies after construction.
    pub fn registry_mut(&mut self) -> &mut ConversionRegistry {
        &mut self.registry
    }

    /// Loads every binding `T` declares.
    pub fn load<T: Bindable>(&self, target: &mut T, root: &ConfigNode) -> LoadReport {
        self.load_with(target, &T::bindings(), root)
    }

    /// Loads an explicit list of bindings.
    pub fn load_with<T>(
        &self,
        target: &mut T,
        bindings: &[FieldBinding<T>],
        root: &ConfigNode,
    ) -> LoadReport {
        let mut report = LoadReport::default();

        for binding in bindings {
            let path = binding.path();

            let Some(node) = root.lookup(path) else {
                debug!(path, "path not found, keeping default");
                report.unresolved.push(path.to_owned());
                continue;
            };

            let mut cx = CastContext::new(&self.registry);
            let value = self.registry.cast_with(binding.target(), node, &mut cx);
            report.dropped_entries += cx.dropped_entries();

            let assigned = match value {
                Some(value) => binding.assign(target, value),
                None => false,
            };
            if assigned {
                report.bound += 1;
            } else {
                debug!(
                    path,
                    target = %binding.target(),
                    raw = node.kind(),
                    "value did not convert, keeping default"
                );
                report.unconverted.push(path.to_owned());
            }
        }

        report
    }
}

impl Default for BindingEngine {
    fn default() -> Self {
        Self::new(ConversionRegistry::with_defaults())
    }
}

#[cfg(test)]
mod tests {
    use tether_node::{BaseType, Mapping};

    use super::*;

    #[derive(Debug, Default)]
    struct Flags {
        enabled: bool,
        label: String,
    }

    impl Bindable for Flags {
        fn bindings() -> Vec<FieldBinding<Self>> {
            vec![
                FieldBinding::new("a.b", |f: &mut Self| &mut f.enabled),
                FieldBinding::new("label", |f: &mut Self| &mut f.label),
            ]
        }
    }

    #[test]
    fn test_load_nested_path_sets_field() {
        let root = ConfigNode::from(Mapping::new().with("a", Mapping::new().with("b", true)));
        let mut flags = Flags::default();

        let report = BindingEngine::default().load(&mut flags, &root);

        assert!(flags.enabled);
        assert_eq!(report.bound, 1);
        assert_eq!(report.unresolved, vec!["label".to_string()]);
    }

    #[test]
    fn test_load_unconvertible_value_keeps_default() {
        let root = ConfigNode::from(Mapping::new().with("a", Mapping::new().with("b", "nah")));
        let mut flags = Flags {
            enabled: true,
            label: "keep".into(),
        };

        let report = BindingEngine::default().load(&mut flags, &root);

        assert!(flags.enabled);
        assert_eq!(flags.label, "keep");
        assert_eq!(report.unconverted, vec!["a.b".to_string()]);
        assert!(!report.is_complete());
    }

    #[test]
    fn test_load_with_mismatched_target_reports_unconverted() {
        let root = ConfigNode::from(Mapping::new().with("a", Mapping::new().with("b", 1)));
        let bindings = vec![FieldBinding::new("a.b", |f: &mut Flags| &mut f.enabled)
            .with_target(TypeDescriptor::scalar(BaseType::I32))];
        let mut flags = Flags::default();

        let report = BindingEngine::default().load_with(&mut flags, &bindings, &root);

        assert!(!flags.enabled);
        assert_eq!(report.bound, 0);
        assert_eq!(report.unconverted, vec!["a.b".to_string()]);
    }

    #[test]
    fn test_load_non_mapping_root_resolves_nothing() {
        let mut flags = Flags::default();
        let report = BindingEngine::default().load(&mut flags, &ConfigNode::from(5));

        assert_eq!(report.bound, 0);
        assert_eq!(report.unresolved.len(), 2);
    }

    #[test]
    fn test_with_target_overrides_descriptor() {
        let binding = FieldBinding::new("label", |f: &mut Flags| &mut f.label)
            .with_target(TypeDescriptor::named("label"));
        assert_eq!(binding.target(), &TypeDescriptor::named("label"));
        assert_eq!(binding.path(), "label");
    }

    #[test]
    fn test_assign_wrong_shape_returns_false() {
        let binding = FieldBinding::new("a.b", |f: &mut Flags| &mut f.enabled);
        let mut flags = Flags::default();
        assert!(!binding.assign(&mut flags, Value::I32(1)));
        assert!(binding.assign(&mut flags, Value::Bool(true)));
        assert!(flags.enabled);
    }
}
