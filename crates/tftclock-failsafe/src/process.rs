//! Child process launching and termination classification.

use std::ffi::OsString;
use std::fmt;
use std::future::Future;
use std::io;
use std::os::unix::process::ExitStatusExt;
use std::process::{ExitStatus, Stdio};

use tokio::process::{Child, Command};

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Exited normally with a status code.
    Exited(i32),
    /// Killed by a signal.
    Signaled(i32),
}

impl Termination {
    pub fn from_status(status: ExitStatus) -> Self {
        match (status.code(), status.signal()) {
            (Some(code), _) => Termination::Exited(code),
            (None, Some(signal)) => Termination::Signaled(signal),
            (None, None) => Termination::Exited(-1),
        }
    }

    /// Only a zero exit code is clean.
    pub fn is_clean(&self) -> bool {
        matches!(self, Termination::Exited(0))
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Exited(code) => write!(f, "exited with code {}", code),
            Termination::Signaled(signal) => write!(f, "killed by signal {}", signal),
        }
    }
}

/// True when a launch failed for lack of system resources (fork could not
/// create the process), as opposed to the program failing to execute.
pub fn is_fork_failure(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::OutOfMemory {
        return true;
    }
    matches!(
        err.raw_os_error(),
        Some(libc::EAGAIN | libc::ENOMEM | libc::EMFILE | libc::ENFILE)
    )
}

/// Starts a fresh child process.
pub trait Launcher {
    type Child: RunningChild;

    fn launch(&mut self) -> io::Result<Self::Child>;
}

/// A live child the supervisor can wait on and stop.
pub trait RunningChild {
    fn id(&self) -> Option<u32>;

    /// Resolves when the child terminates.
    fn wait(&mut self) -> impl Future<Output = io::Result<Termination>>;

    /// Asks the child to exit (SIGTERM).
    fn terminate(&mut self) -> io::Result<()>;

    /// Forces the child down and reaps it.
    fn kill(&mut self) -> impl Future<Output = io::Result<()>>;
}

/// Launches `program` with `args`, inheriting stdio.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    program: OsString,
    args: Vec<OsString>,
}

impl ProcessLauncher {
    pub fn new(program: impl Into<OsString>, args: impl IntoIterator<Item = OsString>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().collect(),
        }
    }

    pub fn program(&self) -> &OsString {
        &self.program
    }
}

impl Launcher for ProcessLauncher {
    type Child = ChildProcess;

    fn launch(&mut self) -> io::Result<ChildProcess> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;
        Ok(ChildProcess { inner: child })
    }
}

/// A spawned OS process.
#[derive(Debug)]
pub struct ChildProcess {
    inner: Child,
}

impl RunningChild for ChildProcess {
    fn id(&self) -> Option<u32> {
        self.inner.id()
    }

    async fn wait(&mut self) -> io::Result<Termination> {
        let status = self.inner.wait().await?;
        Ok(Termination::from_status(status))
    }

    fn terminate(&mut self) -> io::Result<()> {
        // Already reaped.
        let Some(pid) = self.inner.id() else {
            return Ok(());
        };
        let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
        if rc == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }

    async fn kill(&mut self) -> io::Result<()> {
        self.inner.kill().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(Termination::Exited(0).is_clean());
        assert!(!Termination::Exited(1).is_clean());
        assert!(!Termination::Signaled(libc::SIGSEGV).is_clean());
        assert_eq!(Termination::Signaled(11).to_string(), "killed by signal 11");
        assert_eq!(Termination::Exited(3).to_string(), "exited with code 3");
    }

    #[test]
    fn test_from_raw_status() {
        // Raw wait statuses: exit code in the high byte, signal in the low bits.
        assert_eq!(
            Termination::from_status(ExitStatus::from_raw(2 << 8)),
            Termination::Exited(2)
        );
        assert_eq!(
            Termination::from_status(ExitStatus::from_raw(libc::SIGKILL)),
            Termination::Signaled(libc::SIGKILL)
        );
    }

    #[tokio::test]
    async fn test_real_process_exit_code() {
        let mut launcher = ProcessLauncher::new("sh", ["-c".into(), "exit 3".into()]);
        let mut child = launcher.launch().unwrap();
        assert_eq!(child.wait().await.unwrap(), Termination::Exited(3));
    }

    #[tokio::test]
    async fn test_terminate_running_process() {
        let mut launcher = ProcessLauncher::new("sleep", ["30".into()]);
        let mut child = launcher.launch().unwrap();
        child.terminate().unwrap();
        assert_eq!(
            child.wait().await.unwrap(),
            Termination::Signaled(libc::SIGTERM)
        );
    }

    #[tokio::test]
    async fn test_missing_program_is_not_a_fork_failure() {
        let mut launcher = ProcessLauncher::new("/nonexistent/renderer", Vec::new());
        let err = launcher.launch().unwrap_err();
        assert!(!is_fork_failure(&err));
    }

    #[test]
    fn test_fork_failure_classification() {
        assert!(is_fork_failure(&io::Error::from_raw_os_error(libc::EAGAIN)));
        assert!(is_fork_failure(&io::Error::from_raw_os_error(libc::ENOMEM)));
        assert!(!is_fork_failure(&io::Error::from_raw_os_error(libc::ENOENT)));
        assert!(!is_fork_failure(&io::Error::from_raw_os_error(libc::EACCES)));
    }
}
