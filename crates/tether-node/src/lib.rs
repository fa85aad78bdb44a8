//! Data model for Tether.
//!
//! This crate defines the three shapes that every other layer talks in:
//!
//! - **Tree** ([`ConfigNode`], [`Scalar`], [`Mapping`]): the untyped,
//!   hierarchical value tree a document parser hands us.
//! - **Descriptors** ([`TypeDescriptor`], [`BaseType`]): what a field
//!   wants to become, including its generic arguments.
//! - **Values** ([`Value`]): the typed result of a conversion, ready to
//!   be moved into a Rust field.
//!
//! # Architecture
//!
//! The node layer knows nothing about strategies or sessions. It only
//! describes data:
//!
//! ```text
//! Parser (bytes) → Node (ConfigNode) → Bind (Value → fields) → Session
//! ```

mod descriptor;
mod error;
#[cfg(feature = "json")]
mod json;
mod node;
mod value;

pub use descriptor::{BaseType, TypeDescriptor};
pub use error::NodeError;
pub use node::{ConfigNode, Mapping, Scalar};
pub use value::Value;
