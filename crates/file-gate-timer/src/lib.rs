#![warn(missing_docs)]
//! # file-gate-timer
//!
//! ## Purpose
//! Provides the injectable clock and the wall-clock-anchored countdown.
//!
//! ## Responsibilities
//! - Define a backend-agnostic [`Clock`] trait.
//! - Expose the real system clock and a deterministic [`ManualClock`] for
//!   tests and CI.
//! - Describe a fixed tick [`Cadence`] and its schedule.
//! - Run a [`Countdown`] that recomputes remaining time from an absolute end
//!   instant on every tick and completes exactly once.
//!
//! ## Data flow
//! Login success -> [`Countdown::start`] emits the first display -> the
//! portal polls [`Countdown::tick`] whenever [`Countdown::next_tick_at`] is
//! due -> the tick that observes zero remaining time reports completion.
//!
//! ## Ownership and lifetimes
//! Clocks are shared as `Arc<dyn Clock>`. [`ManualClock`] clones share one
//! underlying instant so a test can advance time seen by the portal.
//!
//! ## Error model
//! Invalid cadence configuration returns [`TimerError`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use file_gate_core::{format_mmss, remaining_ms, remaining_seconds};
use thiserror::Error;

/// Source of the current wall-clock instant in epoch milliseconds.
pub trait Clock: Send + Sync {
    /// Current Unix epoch milliseconds.
    fn now_ms(&self) -> u64;
}

/// Clock backed by [`SystemTime`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Deterministic clock advanced explicitly by tests.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_ms: Arc<AtomicU64>,
}

impl ManualClock {
    /// Creates a clock frozen at `start_ms`.
    pub fn new(start_ms: u64) -> Self {
        Self {
            now_ms: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    /// Moves time forward by `delta_ms`.
    pub fn advance(&self, delta_ms: u64) {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }

    /// Jumps to an absolute instant.
    pub fn set(&self, now_ms: u64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

/// Fixed repeating tick interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    interval_ms: u64,
}

impl Cadence {
    /// Creates a validated cadence.
    ///
    /// # Errors
    /// Returns [`TimerError::InvalidInterval`] when `interval_ms == 0`.
    pub fn new(interval_ms: u64) -> Result<Self, TimerError> {
        if interval_ms == 0 {
            return Err(TimerError::InvalidInterval);
        }
        Ok(Self { interval_ms })
    }

    /// Tick interval in milliseconds.
    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// First grid instant strictly after `now_ms`, for a grid anchored at
    /// `origin_ms`.
    pub fn next_after(&self, origin_ms: u64, now_ms: u64) -> u64 {
        if now_ms < origin_ms {
            return origin_ms;
        }
        let elapsed_ticks = (now_ms - origin_ms) / self.interval_ms + 1;
        origin_ms.saturating_add(elapsed_ticks.saturating_mul(self.interval_ms))
    }
}

/// Snapshot emitted by every countdown update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Milliseconds left until the end instant.
    pub remaining_ms: u64,
    /// Whole seconds left, rounded up.
    pub remaining_seconds: u64,
    /// `MM:SS` rendering of `remaining_seconds`.
    pub display: String,
    /// Elapsed share of the wait, in per-mille.
    pub progress_permille: u16,
    /// `true` only on the single tick that finished the countdown.
    pub completed: bool,
}

/// Countdown towards a fixed end instant.
#[derive(Debug, Clone)]
pub struct Countdown {
    started_at_ms: u64,
    end_ms: u64,
    cadence: Cadence,
    next_tick_ms: u64,
    completed: bool,
}

impl Countdown {
    /// Starts a countdown of `duration_ms` at `now_ms` and returns the first
    /// display.
    ///
    /// The initial report never completes the countdown, even for a zero
    /// duration; completion is only observed on a cadence tick.
    pub fn start(duration_ms: u64, cadence: Cadence, now_ms: u64) -> (Self, TickReport) {
        let countdown = Self {
            started_at_ms: now_ms,
            end_ms: now_ms.saturating_add(duration_ms),
            cadence,
            next_tick_ms: now_ms.saturating_add(cadence.interval_ms()),
            completed: false,
        };
        let report = countdown.report(now_ms, false);
        (countdown, report)
    }

    /// Absolute end instant.
    pub fn end_ms(&self) -> u64 {
        self.end_ms
    }

    /// Next instant a tick is due, or `None` once completed.
    pub fn next_tick_at(&self) -> Option<u64> {
        (!self.completed).then_some(self.next_tick_ms)
    }

    /// Returns `true` after the completing tick.
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Processes a tick if one is due at `now_ms`.
    ///
    /// Returns `None` when no tick is due or the countdown already completed.
    /// A late poll yields a single tick at `now_ms` and re-aligns the next tick
    /// to the cadence grid.
    pub fn tick(&mut self, now_ms: u64) -> Option<TickReport> {
        if self.completed || now_ms < self.next_tick_ms {
            return None;
        }

        let finished = remaining_ms(self.end_ms, now_ms) == 0;
        if finished {
            self.completed = true;
        } else {
            self.next_tick_ms = self.cadence.next_after(self.started_at_ms, now_ms);
        }
        Some(self.report(now_ms, finished))
    }

    fn report(&self, now_ms: u64, completed: bool) -> TickReport {
        let remaining = remaining_ms(self.end_ms, now_ms);
        let seconds = remaining_seconds(self.end_ms, now_ms);
        TickReport {
            remaining_ms: remaining,
            remaining_seconds: seconds,
            display: format_mmss(seconds),
            progress_permille: progress_permille(self.started_at_ms, self.end_ms, now_ms),
            completed,
        }
    }
}

fn progress_permille(start_ms: u64, end_ms: u64, now_ms: u64) -> u16 {
    let total = end_ms.saturating_sub(start_ms);
    if total == 0 {
        return 1_000;
    }
    let elapsed = now_ms.saturating_sub(start_ms).min(total);
    ((elapsed as u128 * 1_000) / total as u128) as u16
}

/// Timer configuration errors.
#[derive(Debug, Error)]
pub enum TimerError {
    /// Cadence interval must be positive.
    #[error("invalid tick interval: must be greater than zero")]
    InvalidInterval,
}
