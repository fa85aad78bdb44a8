//! Freeze: a movement lock built on the session layer.
//!
//! A frozen actor must stay within `radius` of an anchor. Every sweep,
//! [`FreezeReconciler`] measures how far the actor wandered and, if it
//! left the circle, teleports it back and tells it why.
//!
//! The record persists its anchor, radius, and last update:
//!
//! ```text
//! anchor: { x: 10.5, y: 64, z: -3 }
//! radius: 1.5
//! last-update: 1700000000000
//! ```
//!
//! `anchor` is a named `"position"` type, so the engine that loads it must
//! have a [`PositionStrategy`] registered. [`binding_engine`] returns one
//! that does.

use std::fmt;

use chrono::TimeDelta;
use tether_bind::{
    Bindable, BindingEngine, CastContext, ConversionRegistry, ConversionStrategy, FieldBinding,
    FromValue,
};
use tether_node::{BaseType, ConfigNode, TypeDescriptor, Value};
use tether_session::{Actor, ActorDirectory, MaxAge, Session, SessionCore};

use crate::{Reconciler, Reconciliation};

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A point in the world.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn distance(&self, other: &Position) -> f64 {
        let (dx, dy, dz) = (self.x - other.x, self.y - other.y, self.z - other.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1}, {:.1})", self.x, self.y, self.z)
    }
}

impl FromValue for Position {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::named(PositionStrategy::TYPE)
    }

    fn from_value(value: Value) -> Option<Self> {
        value.downcast_ref::<Position>().copied()
    }
}

/// Casts `{x, y, z}` mappings to [`Position`].
///
/// Each axis goes back through the registry as an `f64`, so ints and
/// numeric strings work too. A missing `y` defaults to 0; a missing `x`
/// or `z` makes the whole mapping unconvertible.
pub struct PositionStrategy;

impl PositionStrategy {
    pub const TYPE: &'static str = "position";
}

impl ConversionStrategy for PositionStrategy {
    fn name(&self) -> &'static str {
        "position"
    }

    fn arity(&self) -> usize {
        0
    }

    fn applicable(&self, target: &TypeDescriptor, raw: &ConfigNode) -> bool {
        matches!(&target.base, BaseType::Named(name) if name == Self::TYPE)
            && raw.as_mapping().is_some()
    }

    fn convert(
        &self,
        _target: &TypeDescriptor,
        raw: &ConfigNode,
        cx: &mut CastContext<'_>,
    ) -> Option<Value> {
        let map = raw.as_mapping()?;
        let f64_ty = TypeDescriptor::scalar(BaseType::F64);
        let mut axis = |key: &str| match cx.cast(&f64_ty, map.get(key)?)? {
            Value::F64(v) => Some(v),
            _ => None,
        };

        let x = axis("x")?;
        let y = axis("y").unwrap_or_default();
        let z = axis("z")?;
        Some(Value::opaque(Position { x, y, z }))
    }
}

/// The default engine plus [`PositionStrategy`].
pub fn binding_engine() -> BindingEngine {
    let mut registry = ConversionRegistry::with_defaults();
    registry.register(Box::new(PositionStrategy));
    BindingEngine::new(registry)
}

// ---------------------------------------------------------------------------
// FreezeSession
// ---------------------------------------------------------------------------

/// Per-actor freeze state.
///
/// Unfrozen when `anchor` is `None`.
#[derive(Debug, Clone)]
pub struct FreezeSession {
    core: SessionCore,
    pub anchor: Option<Position>,
    pub radius: f64,
}

impl FreezeSession {
    pub const DEFAULT_RADIUS: f64 = 1.5;

    pub fn freeze(&mut self, at: Position) {
        self.anchor = Some(at);
    }

    pub fn thaw(&mut self) {
        self.anchor = None;
    }

    pub fn is_frozen(&self) -> bool {
        self.anchor.is_some()
    }
}

impl Default for FreezeSession {
    /// Unfrozen, expiring 30 minutes after the actor leaves.
    fn default() -> Self {
        Self {
            core: SessionCore::new(MaxAge::After(TimeDelta::minutes(30))),
            anchor: None,
            radius: Self::DEFAULT_RADIUS,
        }
    }
}

impl Bindable for FreezeSession {
    fn bindings() -> Vec<FieldBinding<Self>> {
        let mut bindings = SessionCore::bindings::<Self>();
        bindings.push(FieldBinding::new("anchor", |s: &mut Self| &mut s.anchor));
        bindings.push(FieldBinding::new("radius", |s: &mut Self| &mut s.radius));
        bindings
    }
}

impl Session for FreezeSession {
    fn core(&self) -> &SessionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SessionCore {
        &mut self.core
    }
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

/// An actor that has a position and can be moved and messaged.
pub trait Locatable: Actor {
    fn position(&self) -> Position;
    fn teleport(&self, to: Position);
    fn notify(&self, message: &str);
}

/// Pulls frozen actors back to their anchor.
#[derive(Debug, Clone)]
pub struct FreezeReconciler {
    message: String,
}

impl FreezeReconciler {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Default for FreezeReconciler {
    fn default() -> Self {
        Self::new("You are frozen and cannot move.")
    }
}

impl<D> Reconciler<FreezeSession, D> for FreezeReconciler
where
    D: ActorDirectory,
    D::Actor: Locatable,
{
    fn reconcile(&self, session: &mut FreezeSession, actor: &D::Actor) -> Reconciliation {
        let Some(anchor) = session.anchor else {
            return Reconciliation::Kept;
        };
        let at = actor.position();
        let drift = at.distance(&anchor);
        if drift <= session.radius {
            return Reconciliation::Kept;
        }

        actor.teleport(anchor);
        actor.notify(&self.message);
        Reconciliation::Corrected(format!("moved {drift:.2} from {anchor}, returned"))
    }
}
