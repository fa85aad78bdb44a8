//! Identity-keyed session records for Tether.
//!
//! This crate tracks per-user ephemeral state across connects and
//! disconnects:
//!
//! 1. **Identity**: who a record belongs to ([`Identity`], derived from
//!    an [`Actor`])
//! 2. **Records**: consumer types embedding a [`SessionCore`] and
//!    implementing [`Session`]
//! 3. **Factories**: how records get built on first lookup
//!    ([`SessionFactory`], [`FnFactory`], [`ConstructorFactory`])
//! 4. **Stores**: who owns the records ([`SessionStore`], one per record
//!    kind, grouped in a [`SessionRegistry`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Reconciliation (above)  ← sweeps bound records on a fixed interval
//!     ↕
//! Session Layer (this crate)  ← identity, lifecycle, lazy expiry
//!     ↕
//! Bind Layer (below)  ← hydrates persisted record fields from a tree
//! ```
//!
//! Expiry is lazy. Nothing evicts records in the background; readers ask
//! [`SessionCore::is_recent`] before trusting one.

mod clock;
mod error;
mod factory;
mod identity;
mod registry;
mod session;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::SessionError;
pub use factory::{ConstructorFactory, FnFactory, SessionFactory};
pub use identity::{Actor, ActorDirectory, Identity};
pub use registry::SessionRegistry;
pub use session::{MaxAge, Session, SessionConfig, SessionCore, SessionState};
pub use store::{lock_session, SessionHandle, SessionStore};
