//! Child lifecycle and restart-storm state machine.
//!
//! ```text
//! Starting ─spawn─▶ Running ─exit─▶ ChildExited ─clean─▶ Stopped
//!    ▲                                  │
//!    │                              abnormal
//!    │                                  ▼
//!    └─cool-down── Recovering ◀─under limit─┴─over limit─▶ CircuitOpen ─▶ Stopped
//! ```
//!
//! A shutdown request wins from any state: the live child gets SIGTERM, a
//! bounded grace period, then SIGKILL.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::config::SupervisorConfig;
use crate::ledger::RestartLedger;
use crate::process::{is_fork_failure, Launcher, RunningChild, Termination};
use crate::recovery::Recovery;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Starting,
    Running,
    ChildExited,
    Recovering,
    CircuitOpen,
    Stopped,
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SupervisorState::Starting => "starting",
            SupervisorState::Running => "running",
            SupervisorState::ChildExited => "child exited",
            SupervisorState::Recovering => "recovering",
            SupervisorState::CircuitOpen => "circuit open",
            SupervisorState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// The one live (or most recent) child.
#[derive(Debug, Clone)]
pub struct ChildRecord {
    pub pid: Option<u32>,
    pub started: Instant,
    /// `None` while the child is still running.
    pub termination: Option<Termination>,
}

/// Why the supervisor stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    CleanExit,
    ShutdownRequested,
    RestartStorm,
    SpawnFailed,
    WaitFailed,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::CleanExit | Outcome::ShutdownRequested)
    }
}

pub struct Supervisor<L, R> {
    launcher: L,
    recovery: R,
    ledger: RestartLedger,
    recovery_cooldown: Duration,
    circuit_cooldown: Duration,
    shutdown_grace: Duration,
    state: SupervisorState,
    child: Option<ChildRecord>,
}

impl<L, R> Supervisor<L, R>
where
    L: Launcher,
    R: Recovery,
{
    pub fn new(launcher: L, recovery: R, config: &SupervisorConfig) -> Self {
        Self {
            launcher,
            recovery,
            ledger: RestartLedger::new(config.max_restarts, config.restart_window()),
            recovery_cooldown: config.recovery_cooldown(),
            circuit_cooldown: config.circuit_cooldown(),
            shutdown_grace: config.shutdown_grace(),
            state: SupervisorState::Starting,
            child: None,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn ledger(&self) -> &RestartLedger {
        &self.ledger
    }

    pub fn child(&self) -> Option<&ChildRecord> {
        self.child.as_ref()
    }

    fn transition(&mut self, next: SupervisorState) {
        debug!("Supervisor {} -> {}", self.state, next);
        self.state = next;
    }

    fn stop(&mut self, outcome: Outcome) -> Outcome {
        self.transition(SupervisorState::Stopped);
        outcome
    }

    /// Supervises the child until it exits cleanly, the restart limit is
    /// exceeded or `shutdown` resolves.
    pub async fn run<S>(&mut self, shutdown: S) -> Outcome
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            self.transition(SupervisorState::Starting);
            info!("Starting child process");
            let termination = match self.launcher.launch() {
                Ok(mut child) => {
                    self.child = Some(ChildRecord {
                        pid: child.id(),
                        started: Instant::now(),
                        termination: None,
                    });
                    debug!("Child pid {:?}", child.id());
                    self.transition(SupervisorState::Running);

                    let waited = tokio::select! {
                        result = child.wait() => result,
                        _ = shutdown.as_mut() => {
                            info!("Shutdown requested");
                            self.stop_child(&mut child).await;
                            return self.stop(Outcome::ShutdownRequested);
                        }
                    };
                    match waited {
                        Ok(termination) => termination,
                        Err(e) => {
                            error!("Failed to wait for child: {}", e);
                            return self.stop(Outcome::WaitFailed);
                        }
                    }
                }
                Err(e) if is_fork_failure(&e) => {
                    error!("Failed to start child process: {}", e);
                    return self.stop(Outcome::SpawnFailed);
                }
                Err(e) => {
                    // The program never ran; counts as a failed child.
                    error!("Failed to execute child program: {}", e);
                    self.child = Some(ChildRecord {
                        pid: None,
                        started: Instant::now(),
                        termination: None,
                    });
                    Termination::Exited(1)
                }
            };
            self.transition(SupervisorState::ChildExited);
            self.record_termination(termination);

            if termination.is_clean() {
                info!("Child {}, shutting down", termination);
                return self.stop(Outcome::CleanExit);
            }
            warn!("Child {}", termination);

            let count = self.ledger.record(Instant::now());
            if self.ledger.is_tripped() {
                error!(
                    "Too many restarts ({} within {:?}), giving up",
                    self.ledger.count(),
                    self.ledger.window()
                );
                self.transition(SupervisorState::CircuitOpen);
                let held = or_shutdown(
                    async {
                        self.recovery.show_error_indicator().await;
                        tokio::time::sleep(self.circuit_cooldown).await;
                    },
                    &mut shutdown,
                )
                .await;
                return match held {
                    Some(()) => self.stop(Outcome::RestartStorm),
                    None => self.stop(Outcome::ShutdownRequested),
                };
            }

            info!(
                "Attempting recovery (restart {} of {})",
                count,
                self.ledger.max_restarts()
            );
            self.transition(SupervisorState::Recovering);
            let recovered = or_shutdown(
                async {
                    self.recovery.reset_hardware().await;
                    tokio::time::sleep(self.recovery_cooldown).await;
                },
                &mut shutdown,
            )
            .await;
            if recovered.is_none() {
                info!("Shutdown requested during recovery");
                return self.stop(Outcome::ShutdownRequested);
            }
        }
    }

    /// SIGTERM, bounded wait, then SIGKILL. Leaves the ledger alone.
    async fn stop_child(&mut self, child: &mut L::Child) {
        if let Err(e) = child.terminate() {
            warn!("Failed to signal child: {}", e);
        }
        match tokio::time::timeout(self.shutdown_grace, child.wait()).await {
            Ok(Ok(termination)) => {
                info!("Child {}", termination);
                self.record_termination(termination);
            }
            Ok(Err(e)) => warn!("Failed to wait for child: {}", e),
            Err(_) => {
                warn!(
                    "Child still running after {:?}, killing",
                    self.shutdown_grace
                );
                if let Err(e) = child.kill().await {
                    error!("Failed to kill child: {}", e);
                }
            }
        }
    }

    fn record_termination(&mut self, termination: Termination) {
        if let Some(record) = self.child.as_mut() {
            debug!(
                "Child pid {:?} ran for {:?}",
                record.pid,
                record.started.elapsed()
            );
            record.termination = Some(termination);
        }
    }
}

/// Runs `work` unless `shutdown` resolves first.
async fn or_shutdown<F, S>(work: F, shutdown: &mut Pin<&mut S>) -> Option<F::Output>
where
    F: Future,
    S: Future<Output = ()>,
{
    tokio::select! {
        output = work => Some(output),
        _ = shutdown.as_mut() => None,
    }
}
