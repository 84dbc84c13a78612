//! Out-of-band panel recovery, run only after the child has been reaped.

use std::future::Future;

use tftclock_hw::LinkConfig;
use tracing::{error, info, warn};

/// Hardware actions the supervisor can take between restarts.
pub trait Recovery {
    /// Pulses the panel's reset line.
    fn reset_hardware(&mut self) -> impl Future<Output = ()>;

    /// Re-initializes the panel and floods it with the alarm color.
    fn show_error_indicator(&mut self) -> impl Future<Output = ()>;
}

/// Recovery through the panel driver on a blocking thread.
///
/// The link is opened fresh for every action and released afterwards. An
/// action whose link cannot be opened is logged and skipped.
#[derive(Debug, Clone)]
pub struct PanelRecovery {
    link: LinkConfig,
    alarm: u16,
}

impl PanelRecovery {
    pub fn new(link: LinkConfig, alarm: u16) -> Self {
        Self { link, alarm }
    }

    async fn run<F>(&self, action: &'static str, work: F)
    where
        F: FnOnce(&mut tftclock_hw::HardwarePanel) -> tftclock_hw::Result<()> + Send + 'static,
    {
        let link = self.link.clone();
        let result = tokio::task::spawn_blocking(move || {
            let mut panel = tftclock_hw::open_panel(&link)?;
            work(&mut panel)
        })
        .await;

        match result {
            Ok(Ok(())) => info!("{} complete", action),
            Ok(Err(e)) => warn!("Skipping {}: {}", action, e),
            Err(e) => error!("{} task failed: {}", action, e),
        }
    }
}

impl Recovery for PanelRecovery {
    async fn reset_hardware(&mut self) {
        info!("Performing hardware reset");
        self.run("Hardware reset", |panel| panel.hardware_reset()).await;
    }

    async fn show_error_indicator(&mut self) {
        info!("Displaying error indicator");
        let alarm = self.alarm;
        self.run("Error indicator", move |panel| panel.show_error_indicator(alarm))
            .await;
    }
}
