//! Unified error type for Tether.

use tether_node::NodeError;
use tether_session::SessionError;

/// Top-level error that wraps every crate-specific error.
///
/// `?` converts sub-crate errors automatically, so applications built on
/// the meta crate only handle this one type.
#[derive(Debug, thiserror::Error)]
pub enum TetherError {
    /// A malformed type descriptor.
    #[error(transparent)]
    Node(#[from] NodeError),

    /// A session lifecycle error (missing identity, unknown record,
    /// unregistered kind).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The reconciliation task stopped abnormally.
    #[error("reconcile loop failed: {0}")]
    ReconcileLoop(String),
}
