//! Integration tests for the tick scheduler.
//!
//! Every async test runs on a paused tokio clock. `sleep_until` resolves
//! as soon as the runtime is idle, and `advance` moves time by an exact
//! amount, so firing times and work timings are deterministic.

use std::time::Duration;

use tether_tick::{TickConfig, TickPolicy, TickScheduler};
use tokio::time::{advance, timeout, Instant};

// =========================================================================
// Helpers
// =========================================================================

const INTERVAL: Duration = Duration::from_millis(100);

fn config(policy: TickPolicy) -> TickConfig {
    TickConfig {
        initial_jitter_ms: 0,
        policy,
        ..TickConfig::every(INTERVAL)
    }
}

fn scheduler() -> TickScheduler {
    TickScheduler::new(config(TickPolicy::Skip))
}

/// Fires one tick, then lets 350ms pass so the next tick is 250ms late.
async fn fall_behind(s: &mut TickScheduler) {
    s.wait_for_tick().await;
    advance(Duration::from_millis(350)).await;
}

// =========================================================================
// Creation
// =========================================================================

#[test]
fn test_new_initial_state() {
    let s = scheduler();
    assert_eq!(s.tick_count(), 0);
    assert_eq!(s.interval(), Some(INTERVAL));
    assert!(!s.is_idle());
    assert!(!s.is_paused());
    assert_eq!(s.metrics().total_ticks, 0);
}

#[test]
fn test_new_idle_config() {
    let s = TickScheduler::new(TickConfig::idle());
    assert!(s.is_idle());
    assert_eq!(s.interval(), None);
}

#[test]
fn test_every_applies_validation() {
    let s = TickScheduler::every(Duration::from_millis(2));
    assert_eq!(s.interval(), Some(Duration::from_millis(TickConfig::MIN_INTERVAL_MS)));
}

// =========================================================================
// wait_for_tick()
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_wait_for_tick_fires_after_one_interval() {
    let mut s = scheduler();
    let start = Instant::now();

    let info = s.wait_for_tick().await;

    assert_eq!(info.tick, 1);
    assert_eq!(info.interval, INTERVAL);
    assert!(!info.overrun);
    assert_eq!(info.skipped, 0);
    assert_eq!(start.elapsed(), INTERVAL);
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_tick_counts_monotonically() {
    let mut s = scheduler();
    for expected in 1..=5 {
        assert_eq!(s.wait_for_tick().await.tick, expected);
    }
    assert_eq!(s.tick_count(), 5);
    assert_eq!(s.metrics().total_ticks, 5);
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_tick_idle_never_fires() {
    let mut s = TickScheduler::new(TickConfig::idle());
    let result = timeout(Duration::from_secs(60), s.wait_for_tick()).await;
    assert!(result.is_err(), "idle scheduler must pend");
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_tick_jitter_delays_first_tick_only() {
    let mut s = TickScheduler::new(TickConfig {
        initial_jitter_ms: 50,
        ..TickConfig::every(INTERVAL)
    });
    let start = Instant::now();

    s.wait_for_tick().await;
    let first = start.elapsed();
    assert!(first >= INTERVAL && first < INTERVAL + Duration::from_millis(50));

    let before = Instant::now();
    s.wait_for_tick().await;
    assert_eq!(before.elapsed(), INTERVAL);
}

// =========================================================================
// Overrun policies
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_skip_policy_reschedules_from_now() {
    let mut s = scheduler();
    fall_behind(&mut s).await;

    let late = s.wait_for_tick().await;
    assert!(late.overrun);
    assert_eq!(late.skipped, 2);

    let before = Instant::now();
    let next = s.wait_for_tick().await;
    assert!(!next.overrun);
    assert_eq!(before.elapsed(), INTERVAL);
    assert_eq!(s.metrics().total_overruns, 1);
    assert_eq!(s.metrics().total_skipped, 2);
}

#[tokio::test(start_paused = true)]
async fn test_catchup_policy_fires_missed_ticks_immediately() {
    let mut s = TickScheduler::new(config(TickPolicy::CatchUp { max_catchup: 5 }));
    fall_behind(&mut s).await;

    let late = s.wait_for_tick().await;
    assert!(late.overrun);
    assert_eq!(late.skipped, 0);

    // The missed tick is due in the past, so it fires without waiting.
    let before = Instant::now();
    s.wait_for_tick().await;
    assert_eq!(before.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_catchup_policy_caps_and_skips_the_rest() {
    let mut s = TickScheduler::new(config(TickPolicy::CatchUp { max_catchup: 1 }));
    fall_behind(&mut s).await;

    let late = s.wait_for_tick().await;
    assert_eq!(late.skipped, 1);

    let before = Instant::now();
    s.wait_for_tick().await;
    assert_eq!(before.elapsed(), INTERVAL);
}

#[tokio::test(start_paused = true)]
async fn test_drop_policy_stays_on_grid() {
    let mut s = TickScheduler::new(config(TickPolicy::Drop));
    let start = Instant::now();
    fall_behind(&mut s).await;

    let late = s.wait_for_tick().await;
    assert!(late.overrun);
    assert_eq!(late.skipped, 2);

    // Tick 1 at 100ms, late tick at 450ms, next grid point is 500ms.
    s.wait_for_tick().await;
    assert_eq!(start.elapsed(), Duration::from_millis(500));
}

// =========================================================================
// pause() / resume()
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_pause_prevents_ticks() {
    let mut s = scheduler();
    s.wait_for_tick().await;

    s.pause();
    assert!(s.is_paused());
    let result = timeout(Duration::from_secs(5), s.wait_for_tick()).await;
    assert!(result.is_err(), "paused scheduler must pend");
}

#[tokio::test(start_paused = true)]
async fn test_resume_waits_a_full_interval_without_overrun() {
    let mut s = scheduler();
    s.wait_for_tick().await;
    s.pause();
    advance(Duration::from_secs(10)).await;

    s.resume();
    let before = Instant::now();
    let info = s.wait_for_tick().await;

    assert_eq!(info.tick, 2);
    assert!(!info.overrun, "time spent paused is not an overrun");
    assert_eq!(before.elapsed(), INTERVAL);
}

#[tokio::test]
async fn test_pause_resume_idempotent() {
    let mut s = scheduler();
    s.pause();
    s.pause();
    assert!(s.is_paused());
    s.resume();
    s.resume();
    assert!(!s.is_paused());
}

// =========================================================================
// record_work_end()
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_record_work_end_measures_work() {
    let mut s = scheduler();
    s.wait_for_tick().await;
    advance(Duration::from_millis(30)).await;

    s.record_work_end();

    let m = s.metrics();
    assert_eq!(m.max_work_time, Duration::from_millis(30));
    assert!((m.budget_utilization - 0.3).abs() < 1e-9);
    assert!((m.avg_work_time.as_secs_f64() - 0.003).abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn test_record_work_end_without_tick_is_noop() {
    let mut s = scheduler();
    s.record_work_end();
    assert_eq!(s.metrics().max_work_time, Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_record_work_end_metrics_disabled() {
    let mut s = TickScheduler::new(TickConfig {
        metrics_enabled: false,
        ..config(TickPolicy::Skip)
    });
    s.wait_for_tick().await;
    advance(Duration::from_millis(30)).await;

    s.record_work_end();

    assert_eq!(s.metrics().max_work_time, Duration::ZERO);
    assert_eq!(s.metrics().avg_work_time, Duration::ZERO);
    assert_eq!(s.metrics().total_ticks, 1, "counters still run");
}

// =========================================================================
// select! loop
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_select_loop_stops_on_shutdown() {
    let mut s = scheduler();
    let (tx, mut rx) = tokio::sync::watch::channel(false);

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(350)).await;
        tx.send(true).ok();
    });

    let mut fired = 0;
    loop {
        tokio::select! {
            _ = rx.changed() => break,
            info = s.wait_for_tick() => {
                fired += 1;
                assert_eq!(info.tick, fired);
                s.record_work_end();
            }
        }
    }

    assert_eq!(fired, 3);
}
