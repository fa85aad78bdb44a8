//! Periodic reconciliation: stored intent vs. live reality.
//!
//! A [`Reconciler`] compares one bound record with its live actor and
//! fixes whatever drifted. [`sweep`] runs it over every bound record of
//! a store once; [`ReconcileLoop`] runs sweeps on a tick schedule.
//!
//! ```text
//!  TickScheduler ──(every N ticks)──→ sweep()
//!                                       │  snapshot of handles
//!                                       ▼
//!                      for each record: bound? ──no──→ skip
//!                                       │ yes
//!                                       ▼
//!                      owner online in directory? ──no──→ skipped_offline
//!                                       │ yes
//!                                       ▼
//!                               Reconciler::reconcile
//! ```
//!
//! A sweep always runs to completion. Records added or removed while it
//! runs may or may not be seen.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tether_bind::{Bindable, FieldBinding};
use tether_session::{lock_session, ActorDirectory, Session, SessionStore};
use tether_tick::{TickConfig, TickScheduler};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::TetherError;

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

/// Outcome of reconciling one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// Nothing to do.
    Kept,
    /// The live state was pulled back in line. Carries a short reason for
    /// the log.
    Corrected(String),
}

/// Checks one record against its live actor.
///
/// Called with the record locked. Implementations should only touch the
/// record and the actor handed to them.
pub trait Reconciler<S: Session, D: ActorDirectory>: Send + Sync + 'static {
    fn reconcile(&self, session: &mut S, actor: &D::Actor) -> Reconciliation;
}

/// Totals for one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Bound records whose owner was online and got reconciled.
    pub visited: usize,
    /// Of those, how many needed a correction.
    pub corrected: usize,
    /// Bound records whose owner could not be resolved or was offline.
    pub skipped_offline: usize,
}

/// Runs `reconciler` over every bound, recent record in `store`.
pub fn sweep<S, D, R>(store: &SessionStore<S>, directory: &D, reconciler: &R) -> SweepReport
where
    S: Session,
    D: ActorDirectory,
    R: Reconciler<S, D> + ?Sized,
{
    let now = store.now();
    let mut report = SweepReport::default();

    for (identity, handle) in store.get_all_sessions() {
        let mut record = lock_session(&handle);
        let core = record.core();
        if !core.is_bound() || !core.is_recent(now) {
            continue;
        }
        let Some(actor) = core.owner(directory) else {
            report.skipped_offline += 1;
            continue;
        };

        report.visited += 1;
        if let Reconciliation::Corrected(reason) = reconciler.reconcile(&mut record, &actor) {
            report.corrected += 1;
            info!(%identity, reason = %reason, "session reconciled");
        }
    }

    debug!(
        visited = report.visited,
        corrected = report.corrected,
        skipped_offline = report.skipped_offline,
        "sweep finished"
    );
    report
}

// ---------------------------------------------------------------------------
// ReconcileConfig
// ---------------------------------------------------------------------------

/// How often a [`ReconcileLoop`] sweeps.
///
/// Loadable from a tree under `reconcile.*`:
///
/// ```text
/// reconcile:
///   interval-ms: 50
///   every-n-ticks: 2
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    pub tick: TickConfig,
    /// Sweep on every n-th tick. 0 is treated as 1.
    pub every_n_ticks: u64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            tick: TickConfig::every(std::time::Duration::from_millis(50)),
            every_n_ticks: 2,
        }
    }
}

impl Bindable for ReconcileConfig {
    fn bindings() -> Vec<FieldBinding<Self>> {
        vec![
            FieldBinding::new("reconcile.interval-ms", |c: &mut Self| &mut c.tick.interval_ms),
            FieldBinding::new("reconcile.every-n-ticks", |c: &mut Self| &mut c.every_n_ticks),
            FieldBinding::new("reconcile.budget-warn-ratio", |c: &mut Self| {
                &mut c.tick.budget_warn_ratio
            }),
        ]
    }
}

// ---------------------------------------------------------------------------
// ReconcileLoop
// ---------------------------------------------------------------------------

/// A background task sweeping one store on a schedule.
///
/// Dropping the handle does not stop the task; call
/// [`shutdown`](Self::shutdown).
#[derive(Debug)]
pub struct ReconcileLoop {
    stop: watch::Sender<bool>,
    task: JoinHandle<u64>,
}

impl ReconcileLoop {
    /// Spawns the loop on the current tokio runtime.
    pub fn spawn<S, D, R>(
        store: Arc<SessionStore<S>>,
        directory: Arc<D>,
        reconciler: R,
        config: ReconcileConfig,
    ) -> Self
    where
        S: Session,
        D: ActorDirectory + 'static,
        R: Reconciler<S, D>,
    {
        let (stop, mut stopped) = watch::channel(false);
        let every = config.every_n_ticks.max(1);
        let mut scheduler = TickScheduler::new(config.tick);

        let task = tokio::spawn(async move {
            let mut sweeps = 0u64;
            loop {
                tokio::select! {
                    changed = stopped.changed() => {
                        if changed.is_err() || *stopped.borrow() {
                            break;
                        }
                    }
                    info = scheduler.wait_for_tick() => {
                        if info.tick % every == 0 {
                            sweep(&store, directory.as_ref(), &reconciler);
                            sweeps += 1;
                        }
                        scheduler.record_work_end();
                    }
                }
            }
            info!(sweeps, "reconcile loop stopped");
            sweeps
        });

        Self { stop, task }
    }

    /// Stops the loop after the current sweep and returns how many sweeps
    /// ran.
    ///
    /// # Errors
    /// Returns [`TetherError::ReconcileLoop`] if the task panicked or was
    /// cancelled.
    pub async fn shutdown(self) -> Result<u64, TetherError> {
        // The receiver only disappears once the task has already ended.
        let _ = self.stop.send(true);
        self.task
            .await
            .map_err(|e| TetherError::ReconcileLoop(e.to_string()))
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
