//! Per-scheduler counters.

use std::time::Duration;

/// Running totals for one scheduler.
///
/// Work timings come from
/// [`TickScheduler::record_work_end`](crate::TickScheduler::record_work_end).
/// Ticks whose work is never recorded only show up in the counters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickMetrics {
    pub total_ticks: u64,
    pub total_overruns: u64,
    /// Ticks that were never fired because the scheduler fell behind.
    pub total_skipped: u64,
    /// Exponential moving average of recorded work time.
    pub avg_work_time: Duration,
    pub max_work_time: Duration,
    /// Last recorded work time as a fraction of the interval.
    pub budget_utilization: f64,
}

impl TickMetrics {
    const EMA_ALPHA: f64 = 0.1;

    pub(crate) fn record_fire(&mut self, overrun: bool, skipped: u64) {
        self.total_ticks += 1;
        self.total_skipped += skipped;
        if overrun {
            self.total_overruns += 1;
        }
    }

    pub(crate) fn record_work(&mut self, elapsed: Duration) {
        self.max_work_time = self.max_work_time.max(elapsed);
        let prev = self.avg_work_time.as_secs_f64();
        let next = prev + (elapsed.as_secs_f64() - prev) * Self::EMA_ALPHA;
        self.avg_work_time = Duration::from_secs_f64(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_fire_counts() {
        let mut m = TickMetrics::default();
        m.record_fire(false, 0);
        m.record_fire(true, 3);
        assert_eq!(m.total_ticks, 2);
        assert_eq!(m.total_overruns, 1);
        assert_eq!(m.total_skipped, 3);
    }

    #[test]
    fn test_record_work_tracks_max_and_average() {
        let mut m = TickMetrics::default();
        m.record_work(Duration::from_millis(100));
        m.record_work(Duration::from_millis(20));
        let avg = m.avg_work_time.as_secs_f64();
        // 0 -> 10ms -> 11ms
        assert!((avg - 0.011).abs() < 1e-6, "avg was {avg}");

        m.record_work(Duration::ZERO);
        let avg = m.avg_work_time.as_secs_f64();
        // 11ms -> 9.9ms
        assert!((avg - 0.0099).abs() < 1e-6, "avg was {avg}");
        assert_eq!(m.max_work_time, Duration::from_millis(100));
    }
}
