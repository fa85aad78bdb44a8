//! Fixed-interval tick scheduler for Tether.
//!
//! Paces periodic work such as reconciliation sweeps. Supports an
//! overrun policy, pause/resume, and work-time metrics.
//!
//! # Idle mode
//!
//! With an interval of 0 the scheduler is idle and
//! [`TickScheduler::wait_for_tick`] never resolves. A loop built around it
//! then only reacts to its other `select!` branches.
//!
//! # Usage
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         _ = shutdown.changed() => break,
//!         info = scheduler.wait_for_tick() => {
//!             run_sweep(info.tick);
//!             scheduler.record_work_end();
//!         }
//!     }
//! }
//! ```

mod config;
mod metrics;
mod scheduler;

pub use config::{TickConfig, TickPolicy};
pub use metrics::TickMetrics;
pub use scheduler::{TickInfo, TickScheduler};
