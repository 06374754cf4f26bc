// gotools-core/src/sequence.rs

//! Ordered, continue-on-error execution of several commands.

use crate::executor::CommandExecutor;
use crate::output::ExecutionResult;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Separates the labeled blocks of a sequence's output.
pub const SEQUENCE_DELIMITER: &str = "\n\n---\n\n";

/// A command line plus the text to report when it prints nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub command: String,
    pub success_message: String,
}

impl CommandSpec {
    pub fn new(command: impl Into<String>, success_message: impl Into<String>) -> Self {
        Self { command: command.into(), success_message: success_message.into() }
    }
}

/// Runs `commands` one after another in `working_dir`.
///
/// A failing step never stops the sequence; later steps may fix or explain
/// what an earlier one reported. Each step contributes a block labeled with
/// its command line, and the result is an error if any step was.
pub async fn execute_sequence(
    executor: &CommandExecutor,
    commands: &[CommandSpec],
    working_dir: &str,
    combined_success_message: &str,
    cancel: &CancellationToken,
) -> ExecutionResult {
    if let Err(e) = executor.validate(working_dir) {
        return ExecutionResult::from_error(&e);
    }

    let mut blocks: Vec<String> = Vec::with_capacity(commands.len());
    let mut failed = false;

    for (index, spec) in commands.iter().enumerate() {
        debug!(step = index + 1, total = commands.len(), command = %spec.command, "Running sequence step");
        let result = executor
            .execute(&spec.command, working_dir, &spec.success_message, cancel)
            .await;
        if result.is_error {
            failed = true;
            blocks.push(format!("[{}] failed:\n{}", spec.command, result.text));
        } else {
            blocks.push(format!("[{}]:\n{}", spec.command, result.text));
        }
    }

    if failed {
        info!(steps = commands.len(), "Command sequence finished with failures");
    }

    let text = if blocks.is_empty() {
        combined_success_message.to_string()
    } else {
        blocks.join(SEQUENCE_DELIMITER)
    };
    ExecutionResult { text, is_error: failed }
}
