use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde_json::json;
use tether::freeze::binding_engine;
use tether::prelude::*;
use tracing::info;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// A pretend world
// ---------------------------------------------------------------------------

struct Body {
    position: Position,
    online: bool,
}

#[derive(Clone)]
struct Player {
    id: Uuid,
    name: &'static str,
    body: Arc<Mutex<Body>>,
}

impl Player {
    fn body(&self) -> std::sync::MutexGuard<'_, Body> {
        self.body.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn walk(&self, dx: f64, dz: f64) {
        let mut body = self.body();
        body.position.x += dx;
        body.position.z += dz;
    }
}

impl Actor for Player {
    fn unique_id(&self) -> Option<Uuid> {
        Some(self.id)
    }
    fn name(&self) -> &str {
        self.name
    }
    fn is_online(&self) -> bool {
        self.body().online
    }
}

impl Locatable for Player {
    fn position(&self) -> Position {
        self.body().position
    }
    fn teleport(&self, to: Position) {
        self.body().position = to;
    }
    fn notify(&self, message: &str) {
        info!(player = self.name, message, "-> chat");
    }
}

#[derive(Default)]
struct World {
    players: Mutex<HashMap<Identity, Player>>,
}

impl World {
    fn join(&self, name: &'static str, at: Position) -> Player {
        let player = Player {
            id: Uuid::new_v4(),
            name,
            body: Arc::new(Mutex::new(Body { position: at, online: true })),
        };
        self.players
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(Identity::Unique(player.id), player.clone());
        player
    }
}

impl ActorDirectory for World {
    type Actor = Player;

    fn find(&self, identity: &Identity) -> Option<Player> {
        self.players
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(identity)
            .cloned()
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), TetherError> {
    tether::logging::init();

    // What a config file would have parsed into.
    let tree = ConfigNode::from(json!({
        "sessions": { "max-age-minutes": 30 },
        "reconcile": { "interval-ms": 100, "every-n-ticks": 2 }
    }));
    let engine = binding_engine();

    let mut sessions = SessionConfig::default();
    let mut reconcile = ReconcileConfig::default();
    engine.load(&mut sessions, &tree);
    engine.load(&mut reconcile, &tree);
    info!(?sessions, every_n_ticks = reconcile.every_n_ticks, "config loaded");

    let mut registry = SessionRegistry::new();
    let freezes = registry.register(
        SessionStore::<FreezeSession>::with_system_clock(ConstructorFactory::of_default())
            .with_config(&sessions),
    );

    let world = Arc::new(World::default());
    let alex = world.join("alex", Position::new(0.0, 64.0, 0.0));
    let sam = world.join("sam", Position::new(20.0, 64.0, 5.0));
    registry.handle_connect(&alex)?;
    registry.handle_connect(&sam)?;

    // Freeze alex where they stand; sam's record is restored from disk.
    if let Some(handle) = Identity::of(&alex).and_then(|id| freezes.get(&id)) {
        lock_session(&handle).freeze(alex.position());
    }
    let saved_sam = ConfigNode::from(json!({
        "anchor": { "x": 20, "y": 64, "z": 5 },
        "radius": 0.5
    }));
    if let Some(id) = Identity::of(&sam) {
        freezes.restore(&id, &saved_sam, &engine);
    }

    let sweeper = ReconcileLoop::spawn(
        freezes.clone(),
        world.clone(),
        FreezeReconciler::default(),
        reconcile,
    );

    for step in 0..10 {
        alex.walk(0.7, 0.0);
        sam.walk(0.0, 0.4);
        info!(step, alex = %alex.position(), sam = %sam.position(), "players moved");
        tokio::time::sleep(Duration::from_millis(60)).await;
    }

    let sweeps = sweeper.shutdown().await?;
    info!(sweeps, "done");
    Ok(())
}
