// gotools-core/src/lib.rs

//! Execution engine for the gotools MCP server.
//!
//! Tool handlers hand this crate a command line (or an ordered list of them)
//! and a working directory. The crate validates the directory, spawns the
//! command through an ordered list of [`ExecutionStrategy`] implementations,
//! and folds whatever happened into a single [`ExecutionResult`]. Nothing in
//! here returns an error to the caller: failures become text with
//! `is_error` set, so the automated client always has something to read.

pub mod config;
pub mod errors;
pub mod executor;
pub mod output;
pub mod path;
pub mod quote;
pub mod sequence;
pub mod strategy;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use config::{ExecutionConfig, GoToolsConfig, StrategyKind, ToolDefaults};
pub use errors::ExecError;
pub use executor::CommandExecutor;
pub use output::{CommandOutput, ExecutionResult};
pub use path::{Platform, is_absolute};
pub use quote::{QuoteError, quote_arg};
pub use sequence::{CommandSpec, SEQUENCE_DELIMITER, execute_sequence};
pub use strategy::{AsyncStrategy, BlockingStrategy, ExecutionStrategy, Invocation, RunLimits};

pub use tokio_util::sync::CancellationToken;
