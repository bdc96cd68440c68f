//! Remaining-time decomposition and start-to-target progress.
//!
//! Every function here is a pure function of its inputs. Callers re-run them on
//! each tick; nothing is cached between calls.

use serde::Serialize;
use tracing::trace;

use crate::error::ConfigError;
use crate::time::{Instant, millis_between};

const MILLIS_PER_SECOND: i64 = 1_000;

/// Validated `[start, target]` pair. `start` is strictly before `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountdownWindow {
    start: Instant,
    target: Instant,
}

impl CountdownWindow {
    pub fn new(start: Instant, target: Instant) -> Result<Self, ConfigError> {
        if start >= target {
            return Err(ConfigError::EmptyWindow {
                start: start.to_rfc3339(),
                target: target.to_rfc3339(),
            });
        }
        Ok(Self { start, target })
    }

    pub fn start(&self) -> Instant {
        self.start
    }

    pub fn target(&self) -> Instant {
        self.target
    }

    pub fn duration_millis(&self) -> i64 {
        millis_between(self.start, self.target)
    }

    pub fn phase(&self, now: Instant) -> CountdownPhase {
        if now >= self.target {
            CountdownPhase::Expired
        } else if now < self.start {
            CountdownPhase::NotStarted
        } else {
            CountdownPhase::Active
        }
    }
}

/// Where `now` sits relative to the window. `Expired` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CountdownPhase {
    NotStarted,
    Active,
    Expired,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CountdownResult {
    pub total_seconds: i64,
    pub total_minutes: i64,
    pub total_hours: i64,
    pub total_days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub decimal_months: f64,
    pub decimal_weeks: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressResult {
    pub elapsed_seconds: i64,
    pub remaining_seconds: i64,
    pub percentage: f64,
}

impl ProgressResult {
    fn complete() -> Self {
        Self {
            elapsed_seconds: 0,
            remaining_seconds: 0,
            percentage: 100.0,
        }
    }
}

pub fn compute_countdown(now: Instant, target: Instant) -> CountdownResult {
    let diff_ms = millis_between(now, target);
    if diff_ms <= 0 {
        return CountdownResult::default();
    }

    let total_seconds = diff_ms / MILLIS_PER_SECOND;
    let total_minutes = total_seconds / 60;
    let total_hours = total_minutes / 60;
    let total_days = total_hours / 24;

    let result = CountdownResult {
        total_seconds,
        total_minutes,
        total_hours,
        total_days,
        hours: total_hours % 24,
        minutes: total_minutes % 60,
        seconds: total_seconds % 60,
        decimal_months: round_to(total_days as f64 / 30.0, 1),
        decimal_weeks: round_to(total_days as f64 / 7.0, 1),
    };
    trace!(?result, "computed countdown");
    result
}

/// Elapsed and remaining seconds are floored independently from the raw
/// instant differences, so they need not sum to the window duration.
pub fn compute_progress(now: Instant, window: &CountdownWindow) -> ProgressResult {
    let remaining_ms = millis_between(now, window.target());
    if remaining_ms <= 0 {
        return ProgressResult::complete();
    }

    let elapsed_ms = millis_between(window.start(), now);
    let total_ms = window.duration_millis();

    ProgressResult {
        elapsed_seconds: elapsed_ms.div_euclid(MILLIS_PER_SECOND),
        remaining_seconds: remaining_ms.div_euclid(MILLIS_PER_SECOND),
        percentage: round_to((elapsed_ms as f64 / total_ms as f64) * 100.0, 4),
    }
}

pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10_f64.powi(places);
    (value * factor).round() / factor
}
