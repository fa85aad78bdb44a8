//! Error types for the session layer.

use crate::Identity;

/// Errors that can occur during session management.
///
/// Only [`IdentityRequired`](Self::IdentityRequired) is a caller bug.
/// The others describe conditions the store itself absorbs or that a
/// caller may reasonably ignore.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A connect was attempted by an actor with neither a unique id nor a
    /// usable name. A session can't be bound without an identity.
    #[error("cannot bind a session without an identity")]
    IdentityRequired,

    /// No record exists for this identity.
    /// Disconnecting someone who never had a session lands here.
    #[error("no session for {0}")]
    NotFound(Identity),

    /// A factory could not build a record.
    ///
    /// The store logs this and treats the identity as sessionless for
    /// that access; it never reaches callers of
    /// [`SessionStore::get_session`](crate::SessionStore::get_session).
    #[error("could not construct {kind}: {reason}")]
    Construction { kind: &'static str, reason: String },

    /// The registry has no store for the requested record kind.
    #[error("no session store registered for {0}")]
    NotRegistered(&'static str),
}
