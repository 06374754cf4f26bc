// gotools-core/src/strategy.rs

//! Ways of spawning a process and waiting for it.
//!
//! The executor tries its strategies in order. A strategy reports
//! [`ExecError::Spawn`] (or [`ExecError::Join`]) when it could not get the
//! process to run at all, which lets the next one have a go. Anything else it
//! returns is final.

use crate::errors::ExecError;
use crate::output::CommandOutput;
use crate::path::{Platform, to_windows_dir};
use async_trait::async_trait;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// A concrete process to spawn, derived from a command line, a working
/// directory and the platform's shell conventions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// The command line as requested by the tool handler.
    pub command: String,
    pub program: String,
    pub args: Vec<String>,
    /// Native working directory. `None` when the directory is folded into
    /// the command line instead.
    pub current_dir: Option<PathBuf>,
}

impl Invocation {
    pub fn build(command: &str, working_dir: &str, platform: Platform) -> Self {
        match platform {
            Platform::Windows => Self {
                command: command.to_string(),
                program: "cmd".to_string(),
                args: vec![
                    "/C".to_string(),
                    format!("cd /d \"{}\" && {}", to_windows_dir(working_dir), command),
                ],
                current_dir: None,
            },
            Platform::Unix => Self {
                command: command.to_string(),
                program: "sh".to_string(),
                args: vec!["-c".to_string(), command.to_string()],
                current_dir: Some(PathBuf::from(working_dir)),
            },
        }
    }
}

/// Bounds on a single run.
#[derive(Debug, Clone, Default)]
pub struct RunLimits {
    pub timeout: Option<Duration>,
    pub cancel: CancellationToken,
}

#[async_trait]
pub trait ExecutionStrategy: Send + Sync + fmt::Debug {
    /// Short name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Runs `invocation` to completion, whatever its exit status.
    async fn run(&self, invocation: &Invocation, limits: &RunLimits) -> Result<CommandOutput, ExecError>;
}

enum Stop {
    Deadline(Duration),
    Cancelled,
}

impl Stop {
    fn into_error(self, command: &str) -> ExecError {
        match self {
            Stop::Deadline(after) => ExecError::Timeout { command: command.to_string(), after },
            Stop::Cancelled => ExecError::Cancelled { command: command.to_string() },
        }
    }
}

/// Resolves when the run must be abandoned. Pending forever if neither a
/// deadline nor a cancellation ever arrives.
async fn stop_signal(limits: &RunLimits) -> Stop {
    match limits.timeout {
        Some(after) => tokio::select! {
            _ = tokio::time::sleep(after) => Stop::Deadline(after),
            _ = limits.cancel.cancelled() => Stop::Cancelled,
        },
        None => {
            limits.cancel.cancelled().await;
            Stop::Cancelled
        }
    }
}

fn spawn_error(strategy: &'static str, invocation: &Invocation, source: io::Error) -> ExecError {
    ExecError::Spawn { strategy, command: invocation.command.clone(), source }
}

/// Spawns through `duct` and blocks a worker thread until the process exits.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockingStrategy;

#[async_trait]
impl ExecutionStrategy for BlockingStrategy {
    fn name(&self) -> &'static str {
        "blocking"
    }

    async fn run(&self, invocation: &Invocation, limits: &RunLimits) -> Result<CommandOutput, ExecError> {
        let mut expression = duct::cmd(invocation.program.as_str(), invocation.args.iter())
            .stdin_null()
            .stdout_capture()
            .stderr_capture()
            .unchecked()
            .before_spawn(|command| {
                own_process_group(command);
                Ok(())
            });
        if let Some(dir) = &invocation.current_dir {
            expression = expression.dir(dir);
        }

        let handle = Arc::new(
            expression
                .start()
                .map_err(|e| spawn_error(self.name(), invocation, e))?,
        );
        let waiter = Arc::clone(&handle);
        let mut wait = tokio::task::spawn_blocking(move || waiter.wait().map(CommandOutput::from_process));

        tokio::select! {
            joined = &mut wait => match joined {
                Ok(Ok(output)) => Ok(output),
                Ok(Err(e)) => Err(spawn_error(self.name(), invocation, e)),
                Err(e) => Err(ExecError::Join {
                    strategy: self.name(),
                    command: invocation.command.clone(),
                    message: e.to_string(),
                }),
            },
            stop = stop_signal(limits) => {
                for pid in handle.pids() {
                    if let Err(e) = kill_process_tree(pid) {
                        warn!(command = %invocation.command, pid, error = %e, "Failed to kill process tree");
                        if let Err(e) = handle.kill() {
                            warn!(command = %invocation.command, error = %e, "Failed to kill process");
                        }
                    }
                }
                // The waiter thread exits on its own once the capture pipes close.
                Err(stop.into_error(&invocation.command))
            }
        }
    }
}

/// Spawns through `tokio::process` and awaits the exit without holding a thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsyncStrategy;

#[async_trait]
impl ExecutionStrategy for AsyncStrategy {
    fn name(&self) -> &'static str {
        "async"
    }

    async fn run(&self, invocation: &Invocation, limits: &RunLimits) -> Result<CommandOutput, ExecError> {
        let mut command = std::process::Command::new(&invocation.program);
        add_args(&mut command, &invocation.args);
        own_process_group(&mut command);
        if let Some(dir) = &invocation.current_dir {
            command.current_dir(dir);
        }
        let mut command = tokio::process::Command::from(command);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = command
            .spawn()
            .map_err(|e| spawn_error(self.name(), invocation, e))?;
        let pid = child.id();
        debug!(command = %invocation.command, pid = ?pid, "Spawned async process");

        tokio::select! {
            output = child.wait_with_output() => output
                .map(|out| CommandOutput::from_process(&out))
                .map_err(|e| spawn_error(self.name(), invocation, e)),
            stop = stop_signal(limits) => {
                if let Some(pid) = pid {
                    if let Err(e) = kill_process_tree(pid) {
                        warn!(command = %invocation.command, pid, error = %e, "Failed to kill process tree");
                    }
                }
                // Dropping the wait future drops the child, which kills it if still running.
                Err(stop.into_error(&invocation.command))
            }
        }
    }
}

// cmd.exe does its own parsing of the `cd /d "..." && ...` line; hand it over verbatim.
#[cfg(windows)]
fn add_args(command: &mut std::process::Command, args: &[String]) {
    use std::os::windows::process::CommandExt;
    for arg in args {
        command.raw_arg(arg);
    }
}

#[cfg(not(windows))]
fn add_args(command: &mut std::process::Command, args: &[String]) {
    command.args(args);
}

/// Makes the spawned shell the leader of a new process group, so that
/// everything it starts can be killed together.
#[cfg(unix)]
fn own_process_group(command: &mut std::process::Command) {
    use std::os::unix::process::CommandExt;
    command.process_group(0);
}

#[cfg(not(unix))]
fn own_process_group(_command: &mut std::process::Command) {}

/// Kills `pid` and every process it started.
#[cfg(unix)]
fn kill_process_tree(pid: u32) -> io::Result<()> {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let pgid = i32::try_from(pid).map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;
    killpg(Pid::from_raw(pgid), Signal::SIGKILL).map_err(io::Error::from)
}

#[cfg(windows)]
fn kill_process_tree(pid: u32) -> io::Result<()> {
    duct::cmd!("taskkill", "/F", "/T", "/PID", pid.to_string())
        .stdout_null()
        .stderr_null()
        .run()
        .map(|_| ())
}
