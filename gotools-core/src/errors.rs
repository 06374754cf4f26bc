// gotools-core/src/errors.rs

use crate::quote::QuoteError;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while turning a command line into a finished process.
///
/// None of these escape the executor: [`crate::CommandExecutor::execute`]
/// renders them into an [`crate::ExecutionResult`] with `is_error` set.
#[derive(Error, Debug)]
pub enum ExecError {
    /// The working directory is not syntactically absolute.
    #[error("Working directory must be an absolute path, got: \"{path}\"")]
    InvalidWorkingDir { path: String },

    /// The working directory cannot be folded into a `cmd /C` line safely.
    #[error("Working directory \"{path}\" cannot be used: {source}")]
    UnsafeWorkingDir {
        path: String,
        #[source]
        source: QuoteError,
    },

    /// A strategy could not spawn (or wait on) the process.
    #[error("Failed to execute command '{command}' ({strategy} strategy): {source}")]
    Spawn {
        strategy: &'static str,
        command: String,
        #[source]
        source: io::Error,
    },

    /// The task waiting on a blocking spawn went away.
    #[error("Lost track of command '{command}' ({strategy} strategy): {message}")]
    Join {
        strategy: &'static str,
        command: String,
        message: String,
    },

    /// No execution strategy is configured for this platform.
    #[error("No execution strategy configured, cannot run '{command}'")]
    NoStrategy { command: String },

    /// The process outlived the configured deadline and was killed.
    #[error("Command '{command}' timed out after {}s and was terminated", .after.as_secs_f64())]
    Timeout { command: String, after: Duration },

    /// The caller cancelled the request.
    #[error("Command '{command}' was cancelled")]
    Cancelled { command: String },
}

impl ExecError {
    pub fn invalid_working_dir(path: impl Into<String>) -> Self {
        ExecError::InvalidWorkingDir { path: path.into() }
    }

    /// Whether the next strategy in the list may be tried after this error.
    ///
    /// Only failures to get a process running qualify. A deadline or a
    /// cancellation is the caller's decision and must not spawn again.
    pub fn is_fallback_eligible(&self) -> bool {
        matches!(self, ExecError::Spawn { .. } | ExecError::Join { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_eligibility() {
        let spawn = ExecError::Spawn {
            strategy: "blocking",
            command: "go vet".into(),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        assert!(spawn.is_fallback_eligible());
        assert!(!ExecError::Cancelled { command: "go vet".into() }.is_fallback_eligible());
        assert!(
            !ExecError::Timeout { command: "go test".into(), after: Duration::from_secs(5) }
                .is_fallback_eligible()
        );
        assert!(!ExecError::invalid_working_dir("rel").is_fallback_eligible());
    }

    #[test]
    fn test_messages_name_the_offender() {
        let msg = ExecError::invalid_working_dir("project/src").to_string();
        assert!(msg.contains("\"project/src\""), "Unexpected message: {}", msg);

        let msg = ExecError::Timeout { command: "go test ./...".into(), after: Duration::from_secs(600) }
            .to_string();
        assert_eq!(msg, "Command 'go test ./...' timed out after 600s and was terminated");
    }
}
