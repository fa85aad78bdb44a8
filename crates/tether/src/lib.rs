//! # Tether
//!
//! Typed configuration binding and identity-keyed sessions.
//!
//! Tether turns an untyped config tree into strongly typed struct fields,
//! and builds a session lifecycle on top of that: per-actor records that
//! survive disconnects for a while, hydrate from persisted trees, and are
//! periodically reconciled against live state.
//!
//! ## Layers
//!
//! ```text
//! tether (this crate)  ← reconciliation, freeze consumer, logging
//!     ↕
//! tether-session       ← identity, records, stores, lazy expiry
//!     ↕
//! tether-bind          ← strategies, registry, binding engine
//!     ↕
//! tether-node          ← config tree, type descriptors, values
//! ```
//!
//! `tether-tick` paces the reconcile loop.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tether::prelude::*;
//!
//! # struct Player;
//! # impl Actor for Player {
//! #     fn unique_id(&self) -> Option<uuid::Uuid> { None }
//! #     fn name(&self) -> &str { "player" }
//! #     fn is_online(&self) -> bool { true }
//! # }
//! # impl Locatable for Player {
//! #     fn position(&self) -> Position { Position::default() }
//! #     fn teleport(&self, _: Position) {}
//! #     fn notify(&self, _: &str) {}
//! # }
//! # struct Server;
//! # impl ActorDirectory for Server {
//! #     type Actor = Player;
//! #     fn find(&self, _: &Identity) -> Option<Player> { None }
//! # }
//! # async fn run(server: Arc<Server>) -> Result<(), TetherError> {
//! let store = Arc::new(SessionStore::<FreezeSession>::with_system_clock(
//!     ConstructorFactory::of_default(),
//! ));
//! let sweeper = ReconcileLoop::spawn(
//!     store.clone(),
//!     server,
//!     FreezeReconciler::default(),
//!     ReconcileConfig::default(),
//! );
//! // ... connects and disconnects drive `store` ...
//! sweeper.shutdown().await?;
//! # Ok(())
//! # }
//! ```

mod error;
pub mod freeze;
pub mod logging;
mod reconcile;

pub use error::TetherError;
pub use reconcile::{sweep, ReconcileConfig, ReconcileLoop, Reconciler, Reconciliation, SweepReport};

pub use tether_bind as bind;
pub use tether_node as node;
pub use tether_session as session;
pub use tether_tick as tick;

/// Everything most applications need.
pub mod prelude {
    pub use crate::freeze::{FreezeReconciler, FreezeSession, Locatable, Position};
    pub use crate::{
        sweep, ReconcileConfig, ReconcileLoop, Reconciler, Reconciliation, SweepReport,
        TetherError,
    };
    pub use tether_bind::{Bindable, BindingEngine, FieldBinding, FromValue, LoadReport};
    pub use tether_node::{ConfigNode, Mapping, Scalar};
    pub use tether_session::{
        lock_session, Actor, ActorDirectory, ConstructorFactory, FnFactory, Identity, Session,
        SessionConfig, SessionCore, SessionRegistry, SessionStore,
    };
}
