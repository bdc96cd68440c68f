//! Periodic tick source for live views.
//!
//! A [`Ticker`] owns exactly one repeating task. Dropping the handle aborts the
//! task, so a view releases its timer the moment the handle goes out of scope.

use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

use crate::time::Instant;

/// Source of the current instant, read once per tick.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Utc::now()
    }
}

/// Clock pinned to one instant, for `--at` previews and tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Instant);

impl Clock for FixedClock {
    fn now(&self) -> Instant {
        self.0
    }
}

#[derive(Debug)]
pub struct Ticker {
    handle: JoinHandle<()>,
    period: Duration,
}

impl Ticker {
    /// Spawns the repeating task on the current tokio runtime. The first tick
    /// fires immediately.
    pub fn spawn<C, F>(period: Duration, clock: C, mut on_tick: F) -> Self
    where
        C: Clock,
        F: FnMut(Instant) + Send + 'static,
    {
        debug!(period_ms = period.as_millis() as u64, "starting ticker");
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let now = clock.now();
                trace!(%now, "tick");
                on_tick(now);
            }
        });

        Self { handle, period }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.handle.abort();
        debug!("ticker released");
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use tokio::sync::mpsc;

    use super::*;

    fn launch_now() -> Instant {
        Utc.with_ymd_and_hms(2025, 8, 18, 11, 15, 0)
            .single()
            .expect("valid instant")
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_with_clock_reading() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let ticker = Ticker::spawn(Duration::from_secs(1), FixedClock(launch_now()), move |now| {
            let _ = tx.send(now);
        });

        for _ in 0..3 {
            let now = rx.recv().await.expect("tick delivered");
            assert_eq!(now, launch_now());
        }
        assert!(ticker.is_running());
        assert_eq!(ticker.period(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_are_one_period_apart() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _ticker = Ticker::spawn(Duration::from_secs(1), SystemClock, move |_| {
            let _ = tx.send(tokio::time::Instant::now());
        });

        let first = rx.recv().await.expect("first tick");
        let second = rx.recv().await.expect("second tick");
        assert_eq!(second - first, Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn drop_releases_task() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let ticker = Ticker::spawn(Duration::from_secs(1), FixedClock(launch_now()), move |now| {
            let _ = tx.send(now);
        });

        rx.recv().await.expect("first tick");
        drop(ticker);

        assert_eq!(rx.recv().await, None);
    }
}
