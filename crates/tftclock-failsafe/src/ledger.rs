//! Sliding-window restart accounting.

use std::time::{Duration, Instant};

/// Counts abnormal exits inside a window that restarts whenever an exit
/// lands more than `window` after the window opened.
#[derive(Debug, Clone)]
pub struct RestartLedger {
    max_restarts: u32,
    window: Duration,
    count: u32,
    window_start: Option<Instant>,
}

impl RestartLedger {
    pub fn new(max_restarts: u32, window: Duration) -> Self {
        Self {
            max_restarts,
            window,
            count: 0,
            window_start: None,
        }
    }

    /// Records an abnormal exit at `now` and returns the updated count.
    pub fn record(&mut self, now: Instant) -> u32 {
        let expired = match self.window_start {
            Some(start) => now.saturating_duration_since(start) > self.window,
            None => true,
        };
        if expired {
            self.window_start = Some(now);
            self.count = 0;
        }
        self.count += 1;
        self.count
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn max_restarts(&self) -> u32 {
        self.max_restarts
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// True once the count exceeds the configured maximum.
    pub fn is_tripped(&self) -> bool {
        self.count > self.max_restarts
    }
}
