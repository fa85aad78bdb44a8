//! The scheduler itself.

use std::time::Duration;

use rand::Rng;
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

use crate::{TickConfig, TickMetrics, TickPolicy};

/// What [`TickScheduler::wait_for_tick`] hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickInfo {
    /// Starts at 1 and increases by one per fired tick.
    pub tick: u64,
    pub interval: Duration,
    /// The tick fired more than a tenth of an interval late.
    pub overrun: bool,
    /// Ticks that will never fire because of this overrun.
    pub skipped: u64,
}

/// Fires ticks at a fixed interval.
///
/// Time comes from tokio, so paused-clock tests (`start_paused = true`)
/// drive both firing and work timing.
///
/// ```text
///   new() ──(jitter + interval)──→ tick 1 ──(interval)──→ tick 2 ──→ ...
///                                    │
///                       record_work_end() measures the work in between
/// ```
#[derive(Debug)]
pub struct TickScheduler {
    config: TickConfig,
    interval: Option<Duration>,
    ticks: u64,
    deadline: Option<Instant>,
    work_started: Option<Instant>,
    paused: bool,
    metrics: TickMetrics,
}

impl TickScheduler {
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let interval = config.interval();
        let deadline = interval.map(|i| Instant::now() + i + jitter(config.initial_jitter_ms));

        match interval {
            None => debug!("tick scheduler idle"),
            Some(interval) => debug!(
                interval_ms = interval.as_millis() as u64,
                policy = ?config.policy,
                "tick scheduler created"
            ),
        }

        Self {
            config,
            interval,
            ticks: 0,
            deadline,
            work_started: None,
            paused: false,
            metrics: TickMetrics::default(),
        }
    }

    /// Shorthand for `TickScheduler::new(TickConfig::every(interval))`.
    pub fn every(interval: Duration) -> Self {
        Self::new(TickConfig::every(interval))
    }

    /// Waits for the next tick.
    ///
    /// Never resolves while idle or paused, so it is safe as one branch of
    /// a `tokio::select!`.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let (Some(deadline), Some(interval)) = (self.deadline, self.interval) else {
            return std::future::pending().await;
        };
        if self.paused {
            return std::future::pending().await;
        }

        time::sleep_until(deadline).await;

        let now = Instant::now();
        let late = now.saturating_duration_since(deadline);
        let overrun = late > interval / 10;
        let behind = u64::try_from(late.as_nanos() / interval.as_nanos()).unwrap_or(u64::MAX);
        let (next, skipped) = self.next_deadline(deadline, now, interval, behind);

        self.ticks += 1;
        self.deadline = Some(next);
        self.work_started = Some(now);
        self.metrics.record_fire(overrun, skipped);

        if overrun {
            warn!(
                tick = self.ticks,
                late_ms = late.as_millis() as u64,
                skipped,
                policy = ?self.config.policy,
                "tick fired late"
            );
        }
        trace!(tick = self.ticks, "tick");

        TickInfo {
            tick: self.ticks,
            interval,
            overrun,
            skipped,
        }
    }

    /// Picks the next deadline after a tick due at `deadline` fired at
    /// `now`, `behind` whole intervals late. Returns it with the number of
    /// ticks given up.
    fn next_deadline(
        &self,
        deadline: Instant,
        now: Instant,
        interval: Duration,
        behind: u64,
    ) -> (Instant, u64) {
        match self.config.policy {
            TickPolicy::Skip => (now + interval, behind),
            TickPolicy::CatchUp { max_catchup } => {
                let max_catchup = u64::from(max_catchup);
                if behind <= max_catchup {
                    (deadline + interval, 0)
                } else {
                    (now + interval, behind - max_catchup)
                }
            }
            TickPolicy::Drop => {
                let steps = u32::try_from(behind.saturating_add(1)).unwrap_or(u32::MAX);
                let aligned = interval
                    .checked_mul(steps)
                    .and_then(|offset| deadline.checked_add(offset))
                    .unwrap_or(now + interval);
                (aligned, behind)
            }
        }
    }

    /// Marks the end of the work started by the last tick.
    ///
    /// Feeds the metrics and logs a warning when the work used more than
    /// `budget_warn_ratio` of the interval. Does nothing if no tick is
    /// outstanding.
    pub fn record_work_end(&mut self) {
        let (Some(started), Some(interval)) = (self.work_started.take(), self.interval) else {
            return;
        };
        let elapsed = started.elapsed();
        let utilization = elapsed.as_secs_f64() / interval.as_secs_f64();

        if utilization >= 1.0 {
            warn!(
                tick = self.ticks,
                elapsed_ms = elapsed.as_millis() as u64,
                interval_ms = interval.as_millis() as u64,
                "work took longer than the tick interval"
            );
        } else if utilization >= self.config.budget_warn_ratio {
            warn!(
                tick = self.ticks,
                utilization_pct = format!("{:.1}", utilization * 100.0),
                "work close to the tick interval"
            );
        }

        if self.config.metrics_enabled {
            self.metrics.budget_utilization = utilization;
            self.metrics.record_work(elapsed);
        }
    }

    /// Stops ticking until [`resume`](Self::resume). Idempotent.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(tick = self.ticks, "tick scheduler paused");
        }
    }

    /// Starts ticking again, one full interval from now. Idempotent.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.deadline = self.interval.map(|i| Instant::now() + i);
            debug!(tick = self.ticks, "tick scheduler resumed");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_idle(&self) -> bool {
        self.interval.is_none()
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    pub fn config(&self) -> &TickConfig {
        &self.config
    }

    pub fn metrics(&self) -> &TickMetrics {
        &self.metrics
    }
}

fn jitter(max_ms: u64) -> Duration {
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::rng().random_range(0..max_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jitter_zero_is_zero() {
        assert_eq!(jitter(0), Duration::ZERO);
    }

    #[test]
    fn test_jitter_stays_below_max() {
        for _ in 0..100 {
            assert!(jitter(5) < Duration::from_millis(5));
        }
    }
}
