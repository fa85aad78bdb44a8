//! Scheduler configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// What to do when the caller fell behind and a tick fires late.
///
/// Sweeps run far less often than a frame loop, so the default skips:
/// a sweep that ran late has already seen the current state, and running
/// the missed ones back to back only repeats the same work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TickPolicy {
    /// Forget the missed ticks and reschedule from now.
    #[default]
    Skip,
    /// Fire missed ticks back to back, at most `max_catchup` of them.
    CatchUp { max_catchup: u32 },
    /// Keep the original cadence. The late tick still counts as an overrun.
    Drop,
}

/// Full configuration for a [`TickScheduler`](crate::TickScheduler).
///
/// Serializes as:
///
/// ```json
/// { "interval_ms": 1000, "policy": { "kind": "skip" }, "budget_warn_ratio": 0.8,
///   "metrics_enabled": true, "initial_jitter_ms": 250 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Time between ticks in milliseconds. 0 means idle: no tick ever fires.
    pub interval_ms: u64,
    pub policy: TickPolicy,
    /// Fraction of the interval a tick's work may take before a warning
    /// is logged. Clamped to `0.0..=1.0`.
    pub budget_warn_ratio: f64,
    pub metrics_enabled: bool,
    /// Upper bound of the random delay added before the first tick, so
    /// loops started together don't sweep in lockstep.
    pub initial_jitter_ms: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            interval_ms: 0,
            policy: TickPolicy::default(),
            budget_warn_ratio: 0.80,
            metrics_enabled: true,
            initial_jitter_ms: 250,
        }
    }
}

impl TickConfig {
    /// Shortest interval the scheduler accepts (about 128 Hz).
    pub const MIN_INTERVAL_MS: u64 = 8;

    /// A config ticking every `interval`, defaults elsewhere.
    pub fn every(interval: Duration) -> Self {
        Self {
            interval_ms: u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
            ..Self::default()
        }
    }

    /// A config that never ticks.
    pub fn idle() -> Self {
        Self::default()
    }

    /// Returns a copy with out-of-range values fixed.
    ///
    /// - a nonzero interval below [`Self::MIN_INTERVAL_MS`] is raised to it
    /// - `budget_warn_ratio` is clamped to `0.0..=1.0` (NaN becomes 1.0)
    pub fn validated(mut self) -> Self {
        if self.interval_ms != 0 && self.interval_ms < Self::MIN_INTERVAL_MS {
            warn!(
                interval_ms = self.interval_ms,
                min = Self::MIN_INTERVAL_MS,
                "tick interval below minimum, raising"
            );
            self.interval_ms = Self::MIN_INTERVAL_MS;
        }
        self.budget_warn_ratio = if self.budget_warn_ratio.is_nan() {
            1.0
        } else {
            self.budget_warn_ratio.clamp(0.0, 1.0)
        };
        self
    }

    /// The tick interval, or `None` when idle.
    pub fn interval(&self) -> Option<Duration> {
        (self.interval_ms > 0).then(|| Duration::from_millis(self.interval_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_idle() {
        let cfg = TickConfig::default();
        assert_eq!(cfg.interval(), None);
        assert_eq!(cfg, TickConfig::idle());
    }

    #[test]
    fn test_every_sets_interval() {
        let cfg = TickConfig::every(Duration::from_secs(2));
        assert_eq!(cfg.interval_ms, 2_000);
        assert_eq!(cfg.interval(), Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_validated_raises_tiny_interval() {
        let cfg = TickConfig::every(Duration::from_millis(1)).validated();
        assert_eq!(cfg.interval_ms, TickConfig::MIN_INTERVAL_MS);
    }

    #[test]
    fn test_validated_keeps_idle() {
        assert_eq!(TickConfig::idle().validated().interval_ms, 0);
    }

    #[test]
    fn test_validated_clamps_ratio() {
        let high = TickConfig { budget_warn_ratio: 3.0, ..TickConfig::default() };
        let nan = TickConfig { budget_warn_ratio: f64::NAN, ..TickConfig::default() };
        assert_eq!(high.validated().budget_warn_ratio, 1.0);
        assert_eq!(nan.validated().budget_warn_ratio, 1.0);
    }

    #[test]
    fn test_policy_serde_uses_kind_tag() {
        let json = serde_json::to_string(&TickPolicy::CatchUp { max_catchup: 3 }).unwrap();
        assert_eq!(json, r#"{"kind":"catch-up","max_catchup":3}"#);

        let cfg: TickConfig = serde_json::from_str(r#"{"interval_ms": 500}"#).unwrap();
        assert_eq!(cfg.interval_ms, 500);
        assert_eq!(cfg.policy, TickPolicy::Skip);
    }
}
