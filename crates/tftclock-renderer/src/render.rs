//! Cooperative refresh loop.

use std::time::Duration;

use chrono::{NaiveDateTime, Timelike};
use embedded_hal::delay::DelayNs;
use tftclock_hw::{Link, Panel, Result, Surface};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::face::ClockFace;

/// Remembers the last presented wall-clock second.
#[derive(Debug, Default)]
pub struct SecondTicker {
    last: Option<NaiveDateTime>,
}

impl SecondTicker {
    /// Returns true when `now` falls in a different second than last time.
    pub fn advance(&mut self, now: NaiveDateTime) -> bool {
        let second = now.with_nanosecond(0).unwrap_or(now);
        if self.last == Some(second) {
            return false;
        }
        self.last = Some(second);
        true
    }
}

/// Paints and refreshes once per second until `token` is cancelled.
///
/// The clock is polled every `poll`; cancellation is observed between
/// iterations, never in the middle of a refresh. Returns the number of
/// frames sent.
pub fn run_clock<L, D, F>(
    panel: &mut Panel<L, D>,
    face: &ClockFace,
    token: &CancellationToken,
    poll: Duration,
    mut now: F,
) -> Result<u64>
where
    L: Link,
    D: DelayNs,
    F: FnMut() -> NaiveDateTime,
{
    let mut surface = Surface::with_dimensions(panel.width(), panel.height());
    let mut ticker = SecondTicker::default();
    let mut frames = 0;

    while !token.is_cancelled() {
        let current = now();
        if ticker.advance(current) {
            face.draw(&mut surface, &current);
            panel.refresh(&surface)?;
            frames += 1;
            trace!("Frame {} at {}", frames, current);
        }
        std::thread::sleep(poll);
    }

    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Palette;
    use chrono::NaiveDate;
    use std::collections::VecDeque;
    use tftclock_hw::sim::SimulatedPanel;
    use tftclock_hw::PanelState;

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    const PALETTE: Palette = Palette {
        time: 0x07FF,
        date: 0xFFE0,
        background: 0x0000,
    };

    fn at(s: u32, ms: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_milli_opt(8, 15, s, ms)
            .unwrap()
    }

    #[test]
    fn test_ticker_only_on_second_change() {
        let mut ticker = SecondTicker::default();
        assert!(ticker.advance(at(1, 0)));
        assert!(!ticker.advance(at(1, 900)));
        assert!(ticker.advance(at(2, 100)));
        assert!(!ticker.advance(at(2, 100)));
    }

    #[test]
    fn test_refreshes_once_per_second() {
        let mut panel = Panel::with_dimensions(SimulatedPanel::new(320, 240), NoDelay, 320, 240);
        panel.init().unwrap();

        let face = ClockFace::new(PALETTE, 6, 3);
        let token = CancellationToken::new();
        let mut script: VecDeque<_> =
            [at(1, 0), at(1, 100), at(1, 200), at(2, 0), at(2, 500), at(3, 0)].into();
        let stop = token.clone();

        let frames = run_clock(&mut panel, &face, &token, Duration::ZERO, || {
            let next = script.pop_front().unwrap();
            if script.is_empty() {
                stop.cancel();
            }
            next
        })
        .unwrap();

        assert_eq!(frames, 3);
        let sim = panel.into_link();
        assert_eq!(sim.commands().iter().filter(|&&c| c == 0x2C).count(), 3);
        assert!(sim.finish().is_empty());
    }

    #[test]
    fn test_cancelled_before_start() {
        let mut panel = Panel::with_dimensions(SimulatedPanel::new(320, 240), NoDelay, 320, 240);
        panel.init().unwrap();
        let face = ClockFace::new(PALETTE, 6, 3);
        let token = CancellationToken::new();
        token.cancel();

        let frames = run_clock(&mut panel, &face, &token, Duration::ZERO, || at(0, 0)).unwrap();

        assert_eq!(frames, 0);
        assert_eq!(panel.state(), PanelState::Active);
    }

    #[test]
    fn test_refresh_error_propagates() {
        let mut panel = Panel::with_dimensions(SimulatedPanel::new(320, 240), NoDelay, 320, 240);
        let face = ClockFace::new(PALETTE, 6, 3);
        let token = CancellationToken::new();

        // Never initialized: the first refresh is refused.
        let result = run_clock(&mut panel, &face, &token, Duration::ZERO, || at(0, 0));
        assert!(result.is_err());
    }
}
