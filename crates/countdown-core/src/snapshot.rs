use serde::Serialize;
use tracing::debug;

use crate::calendar::{CalendarDay, GridMode, custom_day_progress, generate_grid};
use crate::countdown::{
    CountdownPhase, CountdownResult, CountdownWindow, ProgressResult, compute_countdown,
    compute_progress,
};
use crate::time::{Instant, Zone};

/// Everything one tick publishes, recomputed from `(now, window, zone, mode)`.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub now: Instant,
    pub phase: CountdownPhase,
    pub countdown: CountdownResult,
    pub progress: ProgressResult,
    pub day_progress: f64,
    pub calendar: Vec<CalendarDay>,
}

impl Snapshot {
    #[tracing::instrument(skip(window, zone))]
    pub fn capture(window: &CountdownWindow, zone: &Zone, now: Instant, mode: GridMode) -> Self {
        let snapshot = Self {
            now,
            phase: window.phase(now),
            countdown: compute_countdown(now, window.target()),
            progress: compute_progress(now, window),
            day_progress: custom_day_progress(now, zone),
            calendar: generate_grid(window, now, mode, zone),
        };
        debug!(
            phase = ?snapshot.phase,
            percentage = snapshot.progress.percentage,
            days = snapshot.calendar.len(),
            "captured snapshot"
        );
        snapshot
    }
}
