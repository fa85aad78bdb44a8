//! Session types: the lifecycle every record shares.
//!
//! A session record is a consumer type (a freeze, a combat tag, a vanish
//! toggle, ...) that embeds a [`SessionCore`]. The core tracks:
//! - WHO the record belongs to (its [`Identity`], fixed at creation)
//! - WHETHER that actor is currently bound to it
//! - WHEN it was last touched (persisted as `last-update`)
//! - HOW LONG it stays valid once the actor leaves ([`MaxAge`])

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tether_bind::{Bindable, FieldBinding};

use crate::{Actor, ActorDirectory, Identity};

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for session stores.
///
/// Loadable from a tree at `sessions.max-age-minutes`, or through serde.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// How long (in minutes) a detached record stays valid.
    ///
    /// Default: 30. A negative value means records never expire.
    pub max_age_minutes: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_age_minutes: 30,
        }
    }
}

impl SessionConfig {
    pub fn max_age(&self) -> MaxAge {
        if self.max_age_minutes < 0 {
            MaxAge::Never
        } else {
            MaxAge::After(TimeDelta::minutes(self.max_age_minutes))
        }
    }
}

impl Bindable for SessionConfig {
    fn bindings() -> Vec<FieldBinding<Self>> {
        vec![FieldBinding::new("sessions.max-age-minutes", |c: &mut Self| {
            &mut c.max_age_minutes
        })]
    }
}

// ---------------------------------------------------------------------------
// MaxAge
// ---------------------------------------------------------------------------

/// How long a record stays valid after its last update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxAge {
    Never,
    After(TimeDelta),
}

impl MaxAge {
    /// `true` if a record last updated `elapsed` ago is still valid.
    pub fn covers(&self, elapsed: TimeDelta) -> bool {
        match self {
            Self::Never => true,
            Self::After(limit) => elapsed < *limit,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// The lifecycle state of a record at a given instant.
///
/// ```text
///   Unbound ──(reconnect)──→ Bound ──(disconnect)──→ Detached
///                              ↑                        │
///                              └──(reconnect, recent)───┤
///                                                       ▼ (max age elapsed)
///                                                    Expired
/// ```
///
/// `Expired` is never stored. It is what `Unbound` or `Detached` turn
/// into once `now - last_update` reaches the max age.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unbound,
    Bound,
    Detached,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Unbound,
    Bound,
    Detached,
}

// ---------------------------------------------------------------------------
// SessionCore
// ---------------------------------------------------------------------------

/// Lifecycle state embedded in every session record.
#[derive(Debug, Clone)]
pub struct SessionCore {
    max_age: MaxAge,
    last_update: DateTime<Utc>,
    phase: Phase,
    identity: Option<Identity>,
}

impl SessionCore {
    /// A fresh, unbound core. The store stamps identity and time when it
    /// adopts the record.
    pub fn new(max_age: MaxAge) -> Self {
        Self {
            max_age,
            last_update: DateTime::UNIX_EPOCH,
            phase: Phase::Unbound,
            identity: None,
        }
    }

    /// Bindings for the persisted part of the core.
    ///
    /// Records include these in their own [`Bindable::bindings`].
    pub fn bindings<S: Session>() -> Vec<FieldBinding<S>> {
        vec![FieldBinding::new("last-update", |s: &mut S| {
            &mut s.core_mut().last_update
        })]
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn max_age(&self) -> MaxAge {
        self.max_age
    }

    pub fn set_max_age(&mut self, max_age: MaxAge) {
        self.max_age = max_age;
    }

    pub fn last_update(&self) -> DateTime<Utc> {
        self.last_update
    }

    pub fn is_bound(&self) -> bool {
        self.phase == Phase::Bound
    }

    /// Whether the record can still be trusted at `now`.
    ///
    /// A bound record is always recent. Otherwise the time since the
    /// last update must be under the max age.
    pub fn is_recent(&self, now: DateTime<Utc>) -> bool {
        self.is_bound() || self.max_age.covers(now - self.last_update)
    }

    pub fn state(&self, now: DateTime<Utc>) -> SessionState {
        match self.phase {
            Phase::Bound => SessionState::Bound,
            _ if !self.is_recent(now) => SessionState::Expired,
            Phase::Unbound => SessionState::Unbound,
            Phase::Detached => SessionState::Detached,
        }
    }

    /// Resolves the live owner, if the record is bound and the owner is
    /// still online.
    pub fn owner<D: ActorDirectory>(&self, directory: &D) -> Option<D::Actor> {
        if !self.is_bound() {
            return None;
        }
        directory
            .find(self.identity.as_ref()?)
            .filter(|actor| actor.is_online())
    }

    /// Sets the identity (first call only) and the creation time.
    pub(crate) fn adopt(&mut self, identity: &Identity, now: DateTime<Utc>) {
        if self.identity.is_none() {
            self.identity = Some(identity.clone());
        }
        self.last_update = now;
    }

    pub(crate) fn bind(&mut self, now: DateTime<Utc>) {
        self.phase = Phase::Bound;
        self.last_update = now;
    }

    pub(crate) fn detach(&mut self, now: DateTime<Utc>) {
        self.phase = Phase::Detached;
        self.last_update = now;
    }
}

impl Default for SessionCore {
    /// Never expires.
    fn default() -> Self {
        Self::new(MaxAge::Never)
    }
}

/// A session record kind.
///
/// Implementors embed a [`SessionCore`] and expose it. Being
/// [`Bindable`] lets a store hydrate persisted fields with
/// [`SessionStore::restore`](crate::SessionStore::restore).
pub trait Session: Bindable + Send + 'static {
    fn core(&self) -> &SessionCore;
    fn core_mut(&mut self) -> &mut SessionCore;
}
