// gotools-core/src/executor.rs

//! Runs one command line against a working directory.

use crate::config::{ExecutionConfig, StrategyKind};
use crate::errors::ExecError;
use crate::output::{CommandOutput, ExecutionResult};
use crate::path::{Platform, is_absolute};
use crate::quote::check_cmd_safe;
use crate::strategy::{AsyncStrategy, BlockingStrategy, ExecutionStrategy, Invocation, RunLimits};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Executes command lines through an ordered list of strategies.
///
/// Cheap to share: hold it in an `Arc` and call [`execute`](Self::execute)
/// from as many requests as you like. Calls share no mutable state.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    platform: Platform,
    strategies: Vec<Arc<dyn ExecutionStrategy>>,
    timeout: Option<Duration>,
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::from_config(&ExecutionConfig::default())
    }
}

impl CommandExecutor {
    pub fn new(platform: Platform, strategies: Vec<Arc<dyn ExecutionStrategy>>) -> Self {
        Self { platform, strategies, timeout: None }
    }

    /// Builds the executor for the current platform from `[execution]`.
    pub fn from_config(config: &ExecutionConfig) -> Self {
        let platform = Platform::current();
        let strategies = config
            .strategies
            .for_platform(platform)
            .iter()
            .map(|kind| -> Arc<dyn ExecutionStrategy> {
                match kind {
                    StrategyKind::Blocking => Arc::new(BlockingStrategy),
                    StrategyKind::Async => Arc::new(AsyncStrategy),
                }
            })
            .collect();
        Self::new(platform, strategies).with_timeout(config.timeout())
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Checks `working_dir` before anything is spawned in it.
    ///
    /// On Windows the directory is spliced into the `cd /d` prefix, so it must
    /// also be free of `cmd.exe` metacharacters.
    pub fn validate(&self, working_dir: &str) -> Result<(), ExecError> {
        if !is_absolute(working_dir) {
            return Err(ExecError::invalid_working_dir(working_dir));
        }
        if self.platform == Platform::Windows {
            check_cmd_safe(working_dir)
                .map_err(|source| ExecError::UnsafeWorkingDir { path: working_dir.to_string(), source })?;
        }
        Ok(())
    }

    /// Runs `command` in `working_dir` and normalizes the outcome.
    ///
    /// Never fails: validation errors, spawn failures, non-zero exits,
    /// timeouts and cancellation all come back as an [`ExecutionResult`]
    /// with `is_error` set. `success_message` stands in for empty output.
    pub async fn execute(
        &self,
        command: &str,
        working_dir: &str,
        success_message: &str,
        cancel: &CancellationToken,
    ) -> ExecutionResult {
        match self.run(command, working_dir, cancel).await {
            Ok(output) => {
                let result = ExecutionResult::from_output(command, &output, success_message);
                if result.is_error {
                    info!(command = command, status = output.status, "Command failed");
                }
                result
            }
            Err(e) => {
                warn!(command = command, working_dir = working_dir, error = %e, "Command did not complete");
                ExecutionResult::from_error(&e)
            }
        }
    }

    /// Validates, builds the invocation and walks the strategy list.
    pub async fn run(
        &self,
        command: &str,
        working_dir: &str,
        cancel: &CancellationToken,
    ) -> Result<CommandOutput, ExecError> {
        self.validate(working_dir)?;
        if cancel.is_cancelled() {
            return Err(ExecError::Cancelled { command: command.to_string() });
        }

        let invocation = Invocation::build(command, working_dir, self.platform);
        let limits = RunLimits { timeout: self.timeout, cancel: cancel.clone() };

        let mut last_error = None;
        for strategy in &self.strategies {
            debug!(
                command = command,
                working_dir = working_dir,
                strategy = strategy.name(),
                "Executing command"
            );
            match strategy.run(&invocation, &limits).await {
                Ok(output) => {
                    debug!(
                        "{} exit status: {}\nStdout preview (first 3 lines):\n{}\nStderr preview (first 3 lines):\n{}",
                        command,
                        output.status,
                        output.stdout.lines().take(3).collect::<Vec<_>>().join("\n"),
                        output.stderr.lines().take(3).collect::<Vec<_>>().join("\n")
                    );
                    return Ok(output);
                }
                Err(e) if e.is_fallback_eligible() => {
                    warn!(strategy = strategy.name(), error = %e, "Execution strategy failed, trying next");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| ExecError::NoStrategy { command: command.to_string() }))
    }
}
