//! Run statistics shared by every worker

use crate::types::StatsSnapshot;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy)]
struct RunClock {
    started: Instant,
    started_at: chrono::DateTime<chrono::Utc>,
}

/// Lock-free attempt/hit counters with a derived per-minute rate.
///
/// `valid` is only ever bumped after the same worker has bumped `tested`,
/// and [`StatsAggregator::snapshot`] reads `valid` first, so every snapshot
/// satisfies `valid <= tested`.
#[derive(Debug, Default)]
pub struct StatsAggregator {
    tested: AtomicU64,
    valid: AtomicU64,
    rate_per_minute: AtomicU64,
    clock: Mutex<Option<RunClock>>,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero all counters and restart the clock
    pub fn reset(&self) {
        self.valid.store(0, Ordering::SeqCst);
        self.tested.store(0, Ordering::SeqCst);
        self.rate_per_minute.store(0, Ordering::SeqCst);
        *self.lock_clock() = Some(RunClock {
            started: Instant::now(),
            started_at: chrono::Utc::now(),
        });
    }

    pub fn record_attempt(&self) {
        let tested = self.tested.fetch_add(1, Ordering::SeqCst) + 1;
        self.update_rate(tested);
    }

    pub fn record_valid(&self) {
        self.valid.fetch_add(1, Ordering::SeqCst);
    }

    pub fn tested(&self) -> u64 {
        self.tested.load(Ordering::SeqCst)
    }

    pub fn valid(&self) -> u64 {
        self.valid.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let valid = self.valid.load(Ordering::SeqCst);
        let tested = self.tested.load(Ordering::SeqCst);
        let clock = *self.lock_clock();
        StatsSnapshot {
            tested,
            valid,
            rate_per_minute: self.rate_per_minute.load(Ordering::SeqCst),
            started_at: clock.map(|c| c.started_at),
            elapsed_ms: clock
                .map(|c| c.started.elapsed().as_millis() as u64)
                .unwrap_or(0),
            session_active: false,
        }
    }

    fn update_rate(&self, tested: u64) {
        let Some(clock) = *self.lock_clock() else {
            return;
        };
        if let Some(rate) = rate_per_minute(tested, clock.started.elapsed().as_secs_f64()) {
            self.rate_per_minute.store(rate, Ordering::SeqCst);
        }
    }

    fn lock_clock(&self) -> std::sync::MutexGuard<'_, Option<RunClock>> {
        match self.clock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// `floor(tested / elapsed_minutes)`, or `None` when no time has passed
pub fn rate_per_minute(tested: u64, elapsed_secs: f64) -> Option<u64> {
    if elapsed_secs <= 0.0 {
        return None;
    }
    let minutes = elapsed_secs / 60.0;
    Some((tested as f64 / minutes).floor() as u64)
}
