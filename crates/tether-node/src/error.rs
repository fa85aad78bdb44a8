//! Error types for the node layer.
//!
//! Reading the tree never fails (a missing key is just `None`), so the
//! only errors here come from building descriptors that break their
//! arity invariant.

use crate::BaseType;

/// Errors that can occur while building node-layer types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NodeError {
    /// A descriptor was given the wrong number of generic arguments.
    ///
    /// `List` and `Set` take exactly one, `Map` takes two, scalars take
    /// none.
    #[error("{base} expects {expected} generic argument(s), got {actual}")]
    ArityMismatch {
        base: BaseType,
        expected: usize,
        actual: usize,
    },
}
