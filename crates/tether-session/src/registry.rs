//! All session stores of a running application, keyed by record kind.
//!
//! Connect and disconnect events are global: when an actor joins, every
//! kind of record it owns must be bound. The registry fans those events
//! out to each registered [`SessionStore`] so consumers don't have to.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::{Actor, Identity, Session, SessionError, SessionStore};

/// The object-safe part of a store the registry needs for fan-out.
trait ErasedStore: Send + Sync {
    fn kind(&self) -> &'static str;
    fn connect(&self, actor: &dyn Actor) -> Result<bool, SessionError>;
    fn disconnect(&self, identity: &Identity) -> Result<bool, SessionError>;
}

impl<S: Session> ErasedStore for SessionStore<S> {
    fn kind(&self) -> &'static str {
        type_name::<S>()
    }

    fn connect(&self, actor: &dyn Actor) -> Result<bool, SessionError> {
        Ok(self.handle_reconnect(actor)?.is_some())
    }

    fn disconnect(&self, identity: &Identity) -> Result<bool, SessionError> {
        self.handle_disconnect(identity)
    }
}

struct Entry {
    any: Arc<dyn Any + Send + Sync>,
    erased: Arc<dyn ErasedStore>,
}

/// A set of stores, at most one per record kind.
#[derive(Default)]
pub struct SessionRegistry {
    stores: HashMap<TypeId, Entry>,
    /// Registration order, so fan-out is deterministic.
    order: Vec<TypeId>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a store and returns a shared handle to it.
    ///
    /// Registering a second store for the same kind replaces the first.
    pub fn register<S: Session>(&mut self, store: SessionStore<S>) -> Arc<SessionStore<S>> {
        let store = Arc::new(store);
        let key = TypeId::of::<S>();
        let entry = Entry {
            any: store.clone(),
            erased: store.clone(),
        };
        if self.stores.insert(key, entry).is_some() {
            tracing::warn!(kind = type_name::<S>(), "session store replaced");
        } else {
            self.order.push(key);
        }
        store
    }

    /// The store for kind `S`, if registered.
    pub fn store<S: Session>(&self) -> Option<Arc<SessionStore<S>>> {
        let entry = self.stores.get(&TypeId::of::<S>())?;
        Arc::clone(&entry.any).downcast::<SessionStore<S>>().ok()
    }

    /// Like [`store`](Self::store), but as an error for `?` chains.
    pub fn require<S: Session>(&self) -> Result<Arc<SessionStore<S>>, SessionError> {
        self.store::<S>()
            .ok_or(SessionError::NotRegistered(type_name::<S>()))
    }

    /// Binds the actor's record in every store.
    ///
    /// Returns how many stores ended up with a bound record. Stores whose
    /// factory failed are skipped.
    ///
    /// # Errors
    /// Returns [`SessionError::IdentityRequired`] if the actor has no
    /// identity. No store is touched in that case.
    pub fn handle_connect(&self, actor: &dyn Actor) -> Result<usize, SessionError> {
        if Identity::of(actor).is_none() {
            return Err(SessionError::IdentityRequired);
        }

        let mut bound = 0;
        for entry in self.entries() {
            if entry.erased.connect(actor)? {
                bound += 1;
            }
        }
        Ok(bound)
    }

    /// Detaches `identity` in every store that holds a bound record for it.
    ///
    /// Returns how many records were detached. Unbound or already
    /// detached records are not counted.
    pub fn handle_disconnect(&self, identity: &Identity) -> usize {
        let mut detached = 0;
        for entry in self.entries() {
            match entry.erased.disconnect(identity) {
                Ok(true) => detached += 1,
                Ok(false) | Err(SessionError::NotFound(_)) => {}
                Err(error) => {
                    tracing::warn!(
                        %identity,
                        kind = entry.erased.kind(),
                        %error,
                        "disconnect failed"
                    );
                }
            }
        }
        detached
    }

    /// Names of the registered record kinds, in registration order.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.entries().map(|e| e.erased.kind()).collect()
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.order.iter().filter_map(|key| self.stores.get(key))
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
