//! Value coercion and object binding for Tether.
//!
//! Turning an untyped [`ConfigNode`](tether_node::ConfigNode) tree into
//! typed struct fields happens in three steps:
//!
//! 1. **Strategies** ([`ConversionStrategy`]): one rule each for
//!    identity, booleans, numbers, strings, lists, sets, and maps.
//! 2. **Registry** ([`ConversionRegistry`]): orders the strategies and
//!    dispatches a `(target, raw)` pair to the first one that fits.
//! 3. **Engine** ([`BindingEngine`]): walks a type's declared
//!    [`FieldBinding`]s, resolves each dotted path, casts, and assigns.
//!
//! Loading is best-effort: a missing path or a value that won't convert
//! leaves the field at its default. Nothing in this crate returns an
//! error; outcomes are recorded in a [`LoadReport`] instead.
//!
//! # Example
//!
//! ```rust
//! use tether_bind::{Bindable, BindingEngine, FieldBinding};
//! use tether_node::{ConfigNode, Mapping};
//!
//! #[derive(Default)]
//! struct Limits {
//!     max_players: u8,
//!     motd: String,
//! }
//!
//! impl Bindable for Limits {
//!     fn bindings() -> Vec<FieldBinding<Self>> {
//!         vec![
//!             FieldBinding::new("limits.max-players", |l: &mut Self| &mut l.max_players),
//!             FieldBinding::new("motd", |l: &mut Self| &mut l.motd),
//!         ]
//!     }
//! }
//!
//! let root = ConfigNode::from(
//!     Mapping::new()
//!         .with("limits", Mapping::new().with("max-players", 20))
//!         .with("motd", "welcome"),
//! );
//!
//! let mut limits = Limits::default();
//! let report = BindingEngine::default().load(&mut limits, &root);
//!
//! assert_eq!(limits.max_players, 20);
//! assert_eq!(limits.motd, "welcome");
//! assert_eq!(report.bound, 2);
//! ```

mod builtin;
mod engine;
mod from_value;
mod registry;
mod strategy;

pub use builtin::{
    BooleanStrategy, IdentityStrategy, ListStrategy, MapStrategy,
    NumberStrategy, SetStrategy, StringStrategy,
};
pub use engine::{Bindable, BindingEngine, FieldBinding, LoadReport};
pub use from_value::FromValue;
pub use registry::ConversionRegistry;
pub use strategy::{CastContext, ConversionStrategy};
