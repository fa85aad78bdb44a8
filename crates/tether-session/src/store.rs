//! The session store: owns every record of one kind.
//!
//! This is the central piece of the session layer. It's responsible for:
//! - Creating records on first lookup (through a [`SessionFactory`])
//! - Binding and detaching records as actors connect and disconnect
//! - Replacing expired records when their actor comes back
//! - Handing out snapshots for reconciliation sweeps
//!
//! # Concurrency note
//!
//! The map sits behind an `RwLock` and every record behind its own
//! `Mutex`. Sweeps take a snapshot of handles and lock one record at a
//! time, so they never block connects for other identities. Connects
//! hold the map write lock across check-and-replace; disconnects only
//! need the record mutex.
//!
//! Lock order is always map → record. No code path holds a record lock
//! while taking the map lock.

use std::any::type_name;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use tether_bind::{BindingEngine, LoadReport};
use tether_node::ConfigNode;

use crate::{
    Actor, Clock, Identity, MaxAge, Session, SessionConfig, SessionError,
    SessionFactory, SystemClock,
};

/// Shared handle to one record. Lock it with [`lock_session`].
pub type SessionHandle<S> = Arc<Mutex<S>>;

/// Locks a record, recovering the data if a previous holder panicked.
pub fn lock_session<S>(handle: &SessionHandle<S>) -> MutexGuard<'_, S> {
    handle.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns all records of kind `S`, keyed by [`Identity`].
///
/// ## Lifecycle
///
/// ```text
/// get_session() ──→ handle_reconnect() ──→ handle_disconnect() ──→ handle_reconnect()
///      │                   │                       │                       │
///      ▼                   ▼                       ▼                       ▼
///  [Unbound]            [Bound]               [Detached]        recent? [Bound]
///                                                  │            else: fresh record, [Bound]
///                                                  ▼ (max age elapsed)
///                                              [Expired] ──→ purge_expired() (optional)
/// ```
pub struct SessionStore<S: Session> {
    sessions: RwLock<HashMap<Identity, SessionHandle<S>>>,
    factory: Box<dyn SessionFactory<S>>,
    clock: Arc<dyn Clock>,
    /// Applied to every new record when set; otherwise the factory's
    /// choice stands.
    max_age: Option<MaxAge>,
}

impl<S: Session> SessionStore<S> {
    /// Creates an empty store.
    pub fn new(factory: impl SessionFactory<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            factory: Box::new(factory),
            clock,
            max_age: None,
        }
    }

    /// Creates an empty store on the system clock.
    pub fn with_system_clock(factory: impl SessionFactory<S>) -> Self {
        Self::new(factory, Arc::new(SystemClock))
    }

    /// Applies the config's max age to every record this store creates.
    pub fn with_config(mut self, config: &SessionConfig) -> Self {
        self.max_age = Some(config.max_age());
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Returns the record for `identity`, creating it on first access.
    ///
    /// Returns `None` only when the factory fails; the failure is logged
    /// and the identity is treated as sessionless for this call.
    ///
    /// The returned record may be expired. Check
    /// [`SessionCore::is_recent`](crate::SessionCore::is_recent) before
    /// trusting it.
    pub fn get_session(&self, identity: &Identity) -> Option<SessionHandle<S>> {
        if let Some(handle) = self.read().get(identity) {
            return Some(Arc::clone(handle));
        }

        let mut sessions = self.write();
        // Someone may have created it between the two locks.
        if let Some(handle) = sessions.get(identity) {
            return Some(Arc::clone(handle));
        }
        let handle = Arc::new(Mutex::new(self.create(identity)?));
        sessions.insert(identity.clone(), Arc::clone(&handle));
        Some(handle)
    }

    /// Returns the record for `identity` without creating one.
    pub fn get(&self, identity: &Identity) -> Option<SessionHandle<S>> {
        self.read().get(identity).cloned()
    }

    /// A snapshot of every record.
    ///
    /// Records added or removed after the call are not reflected.
    /// Iterating the snapshot never blocks other store operations.
    pub fn get_all_sessions(&self) -> HashMap<Identity, SessionHandle<S>> {
        self.read().clone()
    }

    /// Marks the actor behind `identity` as gone.
    ///
    /// A bound record is detached, stamped with the current time, and
    /// stays valid for its max age. A record that is not bound keeps its
    /// phase and timestamp. Returns whether a record was detached.
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if no record exists.
    pub fn handle_disconnect(&self, identity: &Identity) -> Result<bool, SessionError> {
        let handle = self
            .get(identity)
            .ok_or_else(|| SessionError::NotFound(identity.clone()))?;

        let mut record = lock_session(&handle);
        if !record.core().is_bound() {
            tracing::debug!(
                %identity,
                kind = type_name::<S>(),
                "disconnect on unbound session ignored"
            );
            return Ok(false);
        }
        record.core_mut().detach(self.now());

        tracing::info!(%identity, kind = type_name::<S>(), "session detached");
        Ok(true)
    }

    /// Binds the actor's record, creating or replacing it as needed.
    ///
    /// - no record → one is created and bound
    /// - recent record → it is bound again, keeping its state
    /// - expired record → it is replaced by a fresh one, which is bound
    ///
    /// The map write lock is held from the recency check to the
    /// replacement.
    ///
    /// Returns `Ok(None)` if the factory failed (sessionless).
    ///
    /// # Errors
    /// Returns [`SessionError::IdentityRequired`] if the actor has no
    /// identity.
    pub fn handle_reconnect<A: Actor + ?Sized>(
        &self,
        actor: &A,
    ) -> Result<Option<SessionHandle<S>>, SessionError> {
        let identity = Identity::of(actor).ok_or(SessionError::IdentityRequired)?;
        let now = self.now();
        let mut sessions = self.write();

        let expired = match sessions.get(&identity).map(Arc::clone) {
            Some(handle) => {
                if bind_if_recent(&handle, now) {
                    tracing::info!(%identity, kind = type_name::<S>(), "session bound");
                    return Ok(Some(handle));
                }
                true
            }
            None => false,
        };

        let Some(mut record) = self.create(&identity) else {
            sessions.remove(&identity);
            return Ok(None);
        };
        record.core_mut().bind(now);
        let handle = Arc::new(Mutex::new(record));
        sessions.insert(identity.clone(), Arc::clone(&handle));

        if expired {
            tracing::info!(
                %identity,
                kind = type_name::<S>(),
                "expired session replaced on reconnect"
            );
        } else {
            tracing::info!(%identity, kind = type_name::<S>(), "session bound");
        }
        Ok(Some(handle))
    }

    /// Hydrates the persisted fields of `identity`'s record from a tree.
    ///
    /// Creates the record first if needed. Returns `None` when the
    /// factory fails.
    pub fn restore(
        &self,
        identity: &Identity,
        node: &ConfigNode,
        engine: &BindingEngine,
    ) -> Option<LoadReport> {
        let handle = self.get_session(identity)?;
        let report = engine.load(&mut *lock_session(&handle), node);
        tracing::debug!(
            %identity,
            bound = report.bound,
            unresolved = report.unresolved.len(),
            "session restored from tree"
        );
        Some(report)
    }

    /// Removes every expired record and returns their identities.
    ///
    /// The store never does this on its own; call it when memory matters.
    pub fn purge_expired(&self) -> Vec<Identity> {
        let now = self.now();
        let mut purged = Vec::new();

        self.write().retain(|identity, handle| {
            let keep = lock_session(handle).core().is_recent(now);
            if !keep {
                purged.push(identity.clone());
            }
            keep
        });

        if !purged.is_empty() {
            tracing::info!(
                count = purged.len(),
                kind = type_name::<S>(),
                "purged expired sessions"
            );
        }
        purged
    }

    /// Number of records (any state).
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn create(&self, identity: &Identity) -> Option<S> {
        match self.factory.create(identity) {
            Ok(mut record) => {
                let core = record.core_mut();
                if let Some(max_age) = self.max_age {
                    core.set_max_age(max_age);
                }
                core.adopt(identity, self.now());
                tracing::info!(%identity, kind = type_name::<S>(), "session created");
                Some(record)
            }
            Err(error) => {
                tracing::warn!(
                    %identity,
                    kind = type_name::<S>(),
                    %error,
                    "session factory failed, identity is sessionless"
                );
                None
            }
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<Identity, SessionHandle<S>>> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Identity, SessionHandle<S>>> {
        self.sessions.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Re-binds the record if it is still recent at `now`.
fn bind_if_recent<S: Session>(handle: &SessionHandle<S>, now: DateTime<Utc>) -> bool {
    let mut record = lock_session(handle);
    let recent = record.core().is_recent(now);
    if recent {
        record.core_mut().bind(now);
    }
    recent
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for `SessionStore`.
    //!
    //! Time is driven by a `ManualClock`, so expiry is tested by moving
    //! the clock instead of sleeping.

    use chrono::TimeDelta;
    use tether_bind::{Bindable, FieldBinding};
    use uuid::Uuid;

    use super::*;
    use crate::{ConstructorFactory, FnFactory, ManualClock, SessionCore, SessionState};

    // -- Fixtures ---------------------------------------------------------

    #[derive(Debug)]
    struct Tag {
        core: SessionCore,
        hits: u32,
    }

    impl Default for Tag {
        fn default() -> Self {
            Self {
                core: SessionCore::new(MaxAge::After(TimeDelta::minutes(30))),
                hits: 0,
            }
        }
    }

    impl Bindable for Tag {
        fn bindings() -> Vec<FieldBinding<Self>> {
            let mut bindings = SessionCore::bindings::<Self>();
            bindings.push(FieldBinding::new("hits", |t: &mut Self| &mut t.hits));
            bindings
        }
    }

    impl Session for Tag {
        fn core(&self) -> &SessionCore {
            &self.core
        }
        fn core_mut(&mut self) -> &mut SessionCore {
            &mut self.core
        }
    }

    struct Player {
        id: Option<Uuid>,
        name: &'static str,
    }

    impl Actor for Player {
        fn unique_id(&self) -> Option<Uuid> {
            self.id
        }
        fn name(&self) -> &str {
            self.name
        }
        fn is_online(&self) -> bool {
            true
        }
    }

    fn player(n: u128) -> Player {
        Player {
            id: Some(Uuid::from_u128(n)),
            name: "player",
        }
    }

    fn ident(n: u128) -> Identity {
        Identity::Unique(Uuid::from_u128(n))
    }

    fn store() -> (SessionStore<Tag>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let store = SessionStore::new(ConstructorFactory::of_default(), clock.clone());
        (store, clock)
    }

    fn state(store: &SessionStore<Tag>, id: &Identity) -> SessionState {
        let handle = store.get(id).expect("record exists");
        let record = lock_session(&handle);
        record.core().state(store.now())
    }

    // =====================================================================
    // get_session()
    // =====================================================================

    #[test]
    fn test_get_session_first_access_creates_unbound_record() {
        let (store, _) = store();

        let handle = store.get_session(&ident(1)).expect("factory succeeds");
        let record = lock_session(&handle);

        assert_eq!(record.core().identity(), Some(&ident(1)));
        assert_eq!(record.core().state(store.now()), SessionState::Unbound);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_session_second_access_returns_same_record() {
        let (store, _) = store();
        let a = store.get_session(&ident(1)).unwrap();
        lock_session(&a).hits = 7;

        let b = store.get_session(&ident(1)).unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(lock_session(&b).hits, 7);
    }

    #[test]
    fn test_get_session_factory_failure_returns_none() {
        let clock = Arc::new(ManualClock::default());
        let store: SessionStore<Tag> =
            SessionStore::new(ConstructorFactory::fallible(|| Err("broken".into())), clock);

        assert!(store.get_session(&ident(1)).is_none());
        assert!(store.is_empty(), "failed records are not retained");
    }

    #[test]
    fn test_get_does_not_create() {
        let (store, _) = store();
        assert!(store.get(&ident(1)).is_none());
        assert!(store.is_empty());
    }

    // =====================================================================
    // handle_reconnect() / handle_disconnect()
    // =====================================================================

    #[test]
    fn test_reconnect_binds_record() {
        let (store, _) = store();

        store.handle_reconnect(&player(1)).unwrap().expect("session");

        assert_eq!(state(&store, &ident(1)), SessionState::Bound);
    }

    #[test]
    fn test_reconnect_without_identity_is_rejected() {
        let (store, _) = store();
        let ghost = Player { id: None, name: "" };

        let result = store.handle_reconnect(&ghost);

        assert!(matches!(result, Err(SessionError::IdentityRequired)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_reconnect_named_actor_uses_name_identity() {
        let (store, _) = store();
        let console = Player { id: None, name: "CONSOLE" };

        store.handle_reconnect(&console).unwrap();

        assert!(store.get(&Identity::Named("CONSOLE".into())).is_some());
    }

    #[test]
    fn test_disconnect_detaches_and_stamps_time() {
        let (store, clock) = store();
        store.handle_reconnect(&player(1)).unwrap();
        clock.advance(TimeDelta::minutes(5));

        store.handle_disconnect(&ident(1)).unwrap();

        let handle = store.get(&ident(1)).unwrap();
        let record = lock_session(&handle);
        assert_eq!(record.core().state(store.now()), SessionState::Detached);
        assert_eq!(record.core().last_update(), store.now());
    }

    #[test]
    fn test_disconnect_unknown_identity_returns_not_found() {
        let (store, _) = store();

        let result = store.handle_disconnect(&ident(99));

        assert!(matches!(result, Err(SessionError::NotFound(id)) if id == ident(99)));
    }

    #[test]
    fn test_reconnect_within_max_age_keeps_record_state() {
        // 30-minute max age, back after 10 minutes.
        let (store, clock) = store();
        let first = store.handle_reconnect(&player(1)).unwrap().unwrap();
        lock_session(&first).hits = 3;
        store.handle_disconnect(&ident(1)).unwrap();

        clock.advance(TimeDelta::minutes(10));
        let again = store.handle_reconnect(&player(1)).unwrap().unwrap();

        assert!(Arc::ptr_eq(&first, &again));
        let record = lock_session(&again);
        assert_eq!(record.hits, 3);
        assert!(record.core().is_recent(store.now()));
        assert_eq!(record.core().state(store.now()), SessionState::Bound);
    }

    #[test]
    fn test_reconnect_after_max_age_replaces_record() {
        // 30-minute max age, back after 31 minutes.
        let (store, clock) = store();
        let first = store.handle_reconnect(&player(1)).unwrap().unwrap();
        lock_session(&first).hits = 3;
        store.handle_disconnect(&ident(1)).unwrap();

        clock.advance(TimeDelta::minutes(31));
        assert!(!lock_session(&first).core().is_recent(store.now()));
        assert_eq!(state(&store, &ident(1)), SessionState::Expired);

        let again = store.handle_reconnect(&player(1)).unwrap().unwrap();

        assert!(!Arc::ptr_eq(&first, &again));
        let record = lock_session(&again);
        assert_eq!(record.hits, 0, "fresh record");
        assert_eq!(record.core().state(store.now()), SessionState::Bound);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_reads_between_disconnect_and_late_reconnect_are_not_recent() {
        let (store, clock) = store();
        store.handle_reconnect(&player(1)).unwrap();
        store.handle_disconnect(&ident(1)).unwrap();
        let handle = store.get(&ident(1)).unwrap();

        clock.advance(TimeDelta::minutes(29));
        assert!(lock_session(&handle).core().is_recent(store.now()));

        for _ in 0..3 {
            clock.advance(TimeDelta::minutes(1));
            assert!(!lock_session(&handle).core().is_recent(store.now()));
        }
    }

    #[test]
    fn test_disconnect_twice_does_not_revive_expired_record() {
        let (store, clock) = store();
        let first = store.handle_reconnect(&player(1)).unwrap().unwrap();
        lock_session(&first).hits = 9;
        assert!(store.handle_disconnect(&ident(1)).unwrap());

        clock.advance(TimeDelta::minutes(40));
        assert!(!store.handle_disconnect(&ident(1)).unwrap());
        assert!(!lock_session(&first).core().is_recent(store.now()));

        let again = store.handle_reconnect(&player(1)).unwrap().unwrap();
        assert!(!Arc::ptr_eq(&first, &again));
        assert_eq!(lock_session(&again).hits, 0);
    }

    #[test]
    fn test_disconnect_unbound_record_is_left_alone() {
        let (store, clock) = store();
        store.get_session(&ident(1));
        let created = store.get(&ident(1)).unwrap();
        let stamped = lock_session(&created).core().last_update();
        clock.advance(TimeDelta::minutes(5));

        assert!(!store.handle_disconnect(&ident(1)).unwrap());

        let record = lock_session(&created);
        assert_eq!(record.core().last_update(), stamped);
        assert_eq!(record.core().state(store.now()), SessionState::Unbound);
    }

    #[test]
    fn test_reconnect_twice_keeps_one_record() {
        let (store, _) = store();
        let first = store.handle_reconnect(&player(1)).unwrap().unwrap();
        let second = store.handle_reconnect(&player(1)).unwrap().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.len(), 1);
    }

    // =====================================================================
    // get_all_sessions() / purge_expired()
    // =====================================================================

    #[test]
    fn test_get_all_sessions_is_a_snapshot() {
        let (store, _) = store();
        store.get_session(&ident(1));
        store.get_session(&ident(2));

        let snapshot = store.get_all_sessions();
        store.get_session(&ident(3));

        assert_eq!(snapshot.len(), 2);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_purge_expired_removes_only_expired() {
        let (store, clock) = store();
        store.handle_reconnect(&player(1)).unwrap();
        store.handle_reconnect(&player(2)).unwrap();
        store.handle_disconnect(&ident(1)).unwrap();
        // Player 2 stays bound.

        clock.advance(TimeDelta::hours(1));
        let purged = store.purge_expired();

        assert_eq!(purged, vec![ident(1)]);
        assert!(store.get(&ident(1)).is_none());
        assert!(store.get(&ident(2)).is_some());
    }

    // =====================================================================
    // with_config() / restore()
    // =====================================================================

    #[test]
    fn test_with_config_overrides_factory_max_age() {
        let clock = Arc::new(ManualClock::default());
        let store = SessionStore::<Tag>::new(ConstructorFactory::of_default(), clock)
            .with_config(&SessionConfig { max_age_minutes: -1 });

        let handle = store.get_session(&ident(1)).unwrap();
        assert_eq!(lock_session(&handle).core().max_age(), MaxAge::Never);
    }

    #[test]
    fn test_restore_loads_persisted_fields() {
        let (store, clock) = store();
        clock.advance(TimeDelta::hours(2));
        let persisted = ConfigNode::from(serde_json::json!({
            "last-update": 60 * 60 * 1000,
            "hits": 12
        }));

        let report = store
            .restore(&ident(1), &persisted, &BindingEngine::default())
            .unwrap();

        assert_eq!(report.bound, 2);
        let handle = store.get(&ident(1)).unwrap();
        let record = lock_session(&handle);
        assert_eq!(record.hits, 12);
        assert_eq!(record.core().last_update().timestamp(), 3600);
        // Touched an hour ago with a 30-minute max age.
        assert_eq!(record.core().state(store.now()), SessionState::Expired);
    }

    #[test]
    fn test_fn_factory_receives_identity() {
        let clock = Arc::new(ManualClock::default());
        let store = SessionStore::new(
            FnFactory::new(|id: &Identity| {
                let hits = if matches!(id, Identity::Named(_)) { 100 } else { 0 };
                Ok(Tag { hits, ..Tag::default() })
            }),
            clock,
        );

        let handle = store.get_session(&Identity::Named("console".into())).unwrap();
        assert_eq!(lock_session(&handle).hits, 100);
    }
}
