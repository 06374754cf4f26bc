// gotools-core/src/output.rs

//! Raw process outcomes and the normalized result every tool returns.

use crate::errors::ExecError;

/// Represents the structured output of an executed external command.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutput {
    /// The exit status code of the command (`-1` when killed by a signal).
    pub status: i32,
    /// The captured standard output.
    pub stdout: String,
    /// The captured standard error.
    pub stderr: String,
}

impl CommandOutput {
    pub fn from_process(output: &std::process::Output) -> Self {
        Self {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }

    /// Checks if the command executed successfully (status code 0).
    pub fn success(&self) -> bool {
        self.status == 0
    }

    /// First stream with visible content, stdout preferred.
    fn captured_text(&self) -> Option<&str> {
        [self.stdout.as_str(), self.stderr.as_str()]
            .into_iter()
            .map(str::trim_end)
            .find(|text| !text.trim().is_empty())
    }
}

/// The single shape every execution path converges to. `text` is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub text: String,
    pub is_error: bool,
}

impl ExecutionResult {
    pub fn success(text: impl Into<String>) -> Self {
        Self { text: text.into(), is_error: false }
    }

    pub fn failure(text: impl Into<String>) -> Self {
        Self { text: text.into(), is_error: true }
    }

    /// Normalizes a process that ran to completion.
    ///
    /// Exit 0 reports stdout, else stderr, else `success_message`. A non-zero
    /// exit reports stdout, else stderr, else a description of the exit.
    pub fn from_output(command: &str, output: &CommandOutput, success_message: &str) -> Self {
        if output.success() {
            let text = output.captured_text().unwrap_or(success_message);
            return Self::success(text);
        }
        match output.captured_text() {
            Some(text) => Self::failure(text),
            None => Self::failure(format!(
                "Command '{}' failed with exit code {} and produced no output",
                command, output.status
            )),
        }
    }

    pub fn from_error(error: &ExecError) -> Self {
        Self::failure(error.to_string())
    }
}
