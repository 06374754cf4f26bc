// gotools-server/src/cli.rs

use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// gotools: Go toolchain operations (vet, lint, test, format, tidy) over MCP.
/// Speaks the protocol on stdin/stdout; logs go to stderr and a log file.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (TOML). Defaults to `<config dir>/gotools/config.toml` when present.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase message verbosity.
    ///
    /// Specify multiple times for more verbose output:
    ///  -v:  INFO level
    ///  -vv: DEBUG level
    ///  -vvv: TRACE level (most verbose)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Directory for the log file. Defaults to `<cache dir>/gotools`.
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Log to stderr only.
    #[arg(long)]
    pub no_log_file: bool,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    pub print_config: bool,
}
