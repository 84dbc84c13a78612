//! Panel self-test: backlight, color fills and patterns.
//!
//! Every step checks the cancellation token before and after its hold
//! period; the panel is always blanked and the backlight switched off on the
//! way out, whether the run finished, was interrupted or failed.

use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;
use tftclock_hw::color::{BLACK, BLUE, CYAN, GREEN, MAGENTA, RED, WHITE, YELLOW};
use tftclock_hw::{Link, Panel, PanelState, Result, Surface};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Longest uninterrupted sleep while holding a pattern on screen.
const HOLD_SLICE: Duration = Duration::from_millis(50);

const FILL_COLORS: [(&str, u16); 5] = [
    ("red", RED),
    ("green", GREEN),
    ("blue", BLUE),
    ("white", WHITE),
    ("black", BLACK),
];

const BAR_COLORS: [u16; 8] = [WHITE, YELLOW, CYAN, GREEN, MAGENTA, RED, BLUE, BLACK];

const CHECKER_SIZES: [u16; 4] = [40, 20, 10, 5];

/// How long each step stays on screen.
#[derive(Debug, Clone)]
pub struct SelfTestTimings {
    pub backlight_period: Duration,
    pub fill_hold: Duration,
    pub pattern_hold: Duration,
    pub checker_hold: Duration,
    pub stress: Duration,
}

impl Default for SelfTestTimings {
    fn default() -> Self {
        Self {
            backlight_period: Duration::from_secs(1),
            fill_hold: Duration::from_secs(1),
            pattern_hold: Duration::from_secs(3),
            checker_hold: Duration::from_secs(1),
            stress: Duration::from_secs(5),
        }
    }
}

/// Result of a self-test run.
#[derive(Debug, Default)]
pub struct SelfTestReport {
    pub steps_passed: u32,
    pub stress_frames: u64,
    pub interrupted: bool,
}

/// Runs every self-test step, cleaning up the panel afterwards.
pub fn run_self_test<L, D>(
    panel: &mut Panel<L, D>,
    token: &CancellationToken,
    timings: &SelfTestTimings,
) -> Result<SelfTestReport>
where
    L: Link,
    D: DelayNs,
{
    let mut report = SelfTestReport::default();
    let outcome = run_steps(panel, token, timings, &mut report);

    if panel.state() == PanelState::Active {
        panel.fill(BLACK)?;
        panel.set_backlight(false)?;
    }
    outcome?;

    if report.interrupted {
        warn!("Self-test interrupted after {} steps", report.steps_passed);
    } else {
        info!(
            "Self-test complete: {} steps, {} stress frames",
            report.steps_passed, report.stress_frames
        );
    }
    Ok(report)
}

fn run_steps<L, D>(
    panel: &mut Panel<L, D>,
    token: &CancellationToken,
    timings: &SelfTestTimings,
    report: &mut SelfTestReport,
) -> Result<()>
where
    L: Link,
    D: DelayNs,
{
    info!("Initializing display");
    panel.init()?;

    macro_rules! hold {
        ($duration:expr) => {
            if !hold(token, $duration) {
                report.interrupted = true;
                return Ok(());
            }
        };
    }

    info!("Testing backlight");
    for _ in 0..3 {
        panel.set_backlight(false)?;
        hold!(timings.backlight_period);
        panel.set_backlight(true)?;
        hold!(timings.backlight_period);
    }
    report.steps_passed += 1;

    info!("Testing color fills");
    for (name, color) in FILL_COLORS {
        info!("  Filling screen with {}", name);
        panel.fill(color)?;
        hold!(timings.fill_hold);
    }
    report.steps_passed += 1;

    let mut surface = Surface::with_dimensions(panel.width(), panel.height());

    info!("Testing color bars");
    paint_color_bars(&mut surface);
    panel.refresh(&surface)?;
    hold!(timings.pattern_hold);
    report.steps_passed += 1;

    info!("Testing gradient");
    paint_gradient(&mut surface);
    panel.refresh(&surface)?;
    hold!(timings.pattern_hold);
    report.steps_passed += 1;

    info!("Testing checkerboard patterns");
    for size in CHECKER_SIZES {
        paint_checkerboard(&mut surface, size);
        panel.refresh(&surface)?;
        hold!(timings.checker_hold);
    }
    report.steps_passed += 1;

    info!("Running stress test for {:?}", timings.stress);
    let start = Instant::now();
    while start.elapsed() < timings.stress {
        if token.is_cancelled() {
            report.interrupted = true;
            return Ok(());
        }
        let (_, color) = FILL_COLORS[report.stress_frames as usize % FILL_COLORS.len()];
        panel.fill(color)?;
        report.stress_frames += 1;
    }
    if !timings.stress.is_zero() {
        info!(
            "  {} frames (~{:.1} fps)",
            report.stress_frames,
            report.stress_frames as f64 / timings.stress.as_secs_f64()
        );
    }
    report.steps_passed += 1;

    Ok(())
}

/// Sleeps for `duration` in short slices. Returns false if cancelled.
fn hold(token: &CancellationToken, duration: Duration) -> bool {
    let deadline = Instant::now() + duration;
    loop {
        if token.is_cancelled() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        std::thread::sleep((deadline - now).min(HOLD_SLICE));
    }
}

/// Eight vertical bars, white through black.
pub fn paint_color_bars(surface: &mut Surface) {
    let bar_width = (surface.width() / BAR_COLORS.len() as u16).max(1);
    for y in 0..surface.height() {
        for x in 0..surface.width() {
            let index = ((x / bar_width) as usize).min(BAR_COLORS.len() - 1);
            surface.set_pixel(x, y, BAR_COLORS[index]);
        }
    }
}

/// Red ramps left to right, green top to bottom, blue along the diagonal.
pub fn paint_gradient(surface: &mut Surface) {
    let (w, h) = (surface.width() as u32, surface.height() as u32);
    for y in 0..h {
        for x in 0..w {
            let r = x * 31 / w;
            let g = y * 63 / h;
            let b = (x + y) * 31 / (w + h);
            surface.set_pixel(x as u16, y as u16, ((r << 11) | (g << 5) | b) as u16);
        }
    }
}

/// Black and white squares of `size` pixels, white at the origin.
pub fn paint_checkerboard(surface: &mut Surface, size: u16) {
    let size = size.max(1);
    for y in 0..surface.height() {
        for x in 0..surface.width() {
            let white = ((x / size) + (y / size)) % 2 == 0;
            surface.set_pixel(x, y, if white { WHITE } else { BLACK });
        }
    }
}
