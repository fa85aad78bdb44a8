//! Who a session belongs to, and how to find them while they're online.
//!
//! Tether doesn't model players, consoles, or bots. It only needs three
//! questions answered about a connected actor, captured by the [`Actor`]
//! trait. Records never hold an actor; they hold its [`Identity`] and ask
//! an [`ActorDirectory`] for a live handle when they need one.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The stable key a session is stored under.
///
/// Actors with a unique id always use it. Console-like actors without one
/// fall back to their display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Identity {
    Unique(Uuid),
    Named(String),
}

impl Identity {
    /// Derives the identity of an actor.
    ///
    /// Returns `None` when the actor has no unique id and a blank name.
    pub fn of<A: Actor + ?Sized>(actor: &A) -> Option<Self> {
        if let Some(id) = actor.unique_id() {
            return Some(Self::Unique(id));
        }
        let name = actor.name().trim();
        (!name.is_empty()).then(|| Self::Named(name.to_owned()))
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unique(id) => write!(f, "{id}"),
            Self::Named(name) => write!(f, "@{name}"),
        }
    }
}

impl From<Uuid> for Identity {
    fn from(id: Uuid) -> Self {
        Self::Unique(id)
    }
}

/// A live, connected participant.
pub trait Actor {
    /// Stable unique id, if this kind of actor has one.
    fn unique_id(&self) -> Option<Uuid>;

    /// Display name. Used as the identity when there is no unique id.
    fn name(&self) -> &str;

    /// Whether the actor is still connected right now.
    fn is_online(&self) -> bool;
}

/// Looks up live actors by identity.
///
/// Implemented by whatever owns connections (a server, a test harness).
/// A returned handle must still be checked with [`Actor::is_online`]
/// before acting on it.
pub trait ActorDirectory: Send + Sync {
    type Actor: Actor;

    fn find(&self, identity: &Identity) -> Option<Self::Actor>;
}
