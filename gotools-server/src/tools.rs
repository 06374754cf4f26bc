// gotools-server/src/tools.rs

//! Tool parameters and the command lines they map onto.
//!
//! Every builder is pure: parameters plus configured defaults in, a
//! [`ToolPlan`] out. Caller-supplied values are quoted for the target shell
//! (or refused when that shell cannot take them safely); the working
//! directory is left to the engine to validate.

use gotools_core::config::{
    AnalyzeDefaults, DeadcodeDefaults, FixDefaults, FormatDefaults, PathDefaults, TestDefaults,
};
use gotools_core::{CommandSpec, Platform, QuoteError, quote_arg};
use schemars::JsonSchema;
use serde::Deserialize;

/// What a tool asks the engine to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Steps {
    Single(CommandSpec),
    Sequence { commands: Vec<CommandSpec>, success_message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPlan {
    pub working_dir: String,
    pub steps: Steps,
}

impl ToolPlan {
    fn single(working_dir: &str, command: String, success_message: &str) -> Self {
        Self {
            working_dir: working_dir.to_string(),
            steps: Steps::Single(CommandSpec::new(command, success_message)),
        }
    }

    fn sequence(working_dir: &str, commands: Vec<CommandSpec>, success_message: &str) -> Self {
        Self {
            working_dir: working_dir.to_string(),
            steps: Steps::Sequence { commands, success_message: success_message.to_string() },
        }
    }

    /// The command lines this plan runs, in order.
    pub fn commands(&self) -> Vec<&str> {
        match &self.steps {
            Steps::Single(spec) => vec![spec.command.as_str()],
            Steps::Sequence { commands, .. } => commands.iter().map(|c| c.command.as_str()).collect(),
        }
    }
}

fn shell_arg(value: &str, platform: Platform) -> Result<String, QuoteError> {
    quote_arg(value, platform).map(|quoted| quoted.into_owned())
}

fn pick(value: &Option<String>, default: &str, platform: Platform) -> Result<String, QuoteError> {
    shell_arg(value.as_deref().unwrap_or(default), platform)
}

/// `-run=^$` selects no tests. cmd.exe strips a bare `^`, so quote it there.
fn no_tests_filter(platform: Platform) -> &'static str {
    match platform {
        Platform::Unix => "-run=^$",
        Platform::Windows => "\"-run=^$\"",
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AnalyzeParams {
    /// Absolute path of the Go module to run in.
    pub wd: String,
    /// Package pattern to analyze (default "./...").
    pub path: Option<String>,
    /// Path to a golangci-lint configuration file.
    pub config: Option<String>,
    /// Run only fast linters.
    pub fast: Option<bool>,
    /// Let linters fix the issues they found.
    pub fix: Option<bool>,
    /// Default severity reported for issues.
    pub severity: Option<String>,
}

pub fn go_analyze(params: &AnalyzeParams, defaults: &AnalyzeDefaults, platform: Platform) -> Result<ToolPlan, QuoteError> {
    let mut command = String::from("golangci-lint run --out-format=colored-line-number");
    if let Some(config) = params.config.as_ref().or(defaults.config.as_ref()) {
        command.push_str(&format!(" --config={}", shell_arg(config, platform)?));
    }
    if params.fast.unwrap_or(defaults.fast) {
        command.push_str(" --fast");
    }
    if params.fix.unwrap_or(defaults.fix) {
        command.push_str(" --fix");
    }
    if let Some(severity) = params.severity.as_ref().or(defaults.severity.as_ref()) {
        command.push_str(&format!(" --severity={}", shell_arg(severity, platform)?));
    }
    command.push(' ');
    command.push_str(&pick(&params.path, &defaults.path, platform)?);
    Ok(ToolPlan::single(&params.wd, command, "No issues found by golangci-lint"))
}

/// Parameters shared by tools that only take a package pattern.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct PathParams {
    /// Absolute path of the Go module to run in.
    pub wd: String,
    /// Package pattern to check (default "./...").
    pub path: Option<String>,
}

pub fn go_lint(params: &PathParams, defaults: &PathDefaults, platform: Platform) -> Result<ToolPlan, QuoteError> {
    let command = format!("golint {}", pick(&params.path, &defaults.path, platform)?);
    Ok(ToolPlan::single(&params.wd, command, "No issues found by golint"))
}

pub fn go_vet(params: &PathParams, defaults: &PathDefaults, platform: Platform) -> Result<ToolPlan, QuoteError> {
    let command = format!("go vet {}", pick(&params.path, &defaults.path, platform)?);
    Ok(ToolPlan::single(&params.wd, command, "No issues found by go vet"))
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FormatParams {
    /// Absolute path of the Go module to run in.
    pub wd: String,
    /// Package pattern to format (default "./...").
    pub path: Option<String>,
    /// Rewrite files in place. When false only the planned gofmt commands are shown.
    pub write: Option<bool>,
}

pub fn go_format(params: &FormatParams, defaults: &FormatDefaults, platform: Platform) -> Result<ToolPlan, QuoteError> {
    let path = pick(&params.path, &defaults.path, platform)?;
    let plan = if params.write.unwrap_or(defaults.write) {
        ToolPlan::single(&params.wd, format!("go fmt {}", path), "All files are already formatted")
    } else {
        ToolPlan::single(
            &params.wd,
            format!("go fmt -n {}", path),
            "Dry run complete, no files were modified",
        )
    };
    Ok(plan)
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TidyParams {
    /// Absolute path of the Go module to run in.
    pub wd: String,
}

pub fn go_tidy(params: &TidyParams) -> ToolPlan {
    ToolPlan::single(&params.wd, "go mod tidy".to_string(), "go.mod and go.sum are tidy")
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DeadcodeParams {
    /// Absolute path of the Go module to run in.
    pub wd: String,
    /// Package pattern of the program roots (default "./...").
    pub path: Option<String>,
    /// Include test packages and executables.
    pub test: Option<bool>,
}

pub fn go_deadcode(params: &DeadcodeParams, defaults: &DeadcodeDefaults, platform: Platform) -> Result<ToolPlan, QuoteError> {
    let mut command = String::from("deadcode");
    if params.test.unwrap_or(defaults.test) {
        command.push_str(" -test");
    }
    command.push(' ');
    command.push_str(&pick(&params.path, &defaults.path, platform)?);
    Ok(ToolPlan::single(&params.wd, command, "No dead code found"))
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TestParams {
    /// Absolute path of the Go module to run in.
    pub wd: String,
    /// Package pattern to test (default "./...").
    pub path: Option<String>,
    /// Verbose test output.
    pub verbose: Option<bool>,
    /// Enable the race detector.
    pub race: Option<bool>,
    /// Write a coverage profile and print a per-function summary.
    pub coverage: Option<bool>,
    /// Coverage profile file name (default "coverage.out").
    pub coverprofile: Option<String>,
    /// Run benchmarks matching this regular expression instead of tests.
    pub bench: Option<String>,
}

pub fn go_test(params: &TestParams, defaults: &TestDefaults, platform: Platform) -> Result<ToolPlan, QuoteError> {
    let mut command = String::from("go test");
    if params.verbose.unwrap_or(defaults.verbose) {
        command.push_str(" -v");
    }
    if params.race.unwrap_or(defaults.race) {
        command.push_str(" -race");
    }
    if let Some(bench) = &params.bench {
        command.push_str(&format!(" -bench={} {}", shell_arg(bench, platform)?, no_tests_filter(platform)));
    }
    let path = pick(&params.path, &defaults.path, platform)?;

    if !params.coverage.unwrap_or(defaults.coverage) {
        command.push(' ');
        command.push_str(&path);
        return Ok(ToolPlan::single(&params.wd, command, "All tests passed"));
    }

    let profile = pick(&params.coverprofile, &defaults.coverprofile, platform)?;
    command.push_str(&format!(" -coverprofile={} {}", profile, path));
    let commands = vec![
        CommandSpec::new(command, "All tests passed"),
        CommandSpec::new(format!("go tool cover -func={}", profile), "Coverage report generated"),
    ];
    Ok(ToolPlan::sequence(&params.wd, commands, "Tests and coverage report completed"))
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FixParams {
    /// Absolute path of the Go module to run in.
    pub wd: String,
    /// Directory or file to fix (default ".").
    pub path: Option<String>,
    /// Run `go mod tidy` first.
    pub deps: Option<bool>,
    /// Organize imports with goimports.
    pub imports: Option<bool>,
    /// Format with gofumpt.
    pub format: Option<bool>,
    /// Enable gofumpt's extra rules.
    pub extra: Option<bool>,
}

/// Dependencies, then imports, then formatting: each step works on what the
/// previous one left behind.
pub fn go_fix(params: &FixParams, defaults: &FixDefaults, platform: Platform) -> Result<ToolPlan, QuoteError> {
    let path = pick(&params.path, &defaults.path, platform)?;
    let mut commands = Vec::new();
    if params.deps.unwrap_or(defaults.deps) {
        commands.push(CommandSpec::new("go mod tidy", "Dependencies tidied"));
    }
    if params.imports.unwrap_or(defaults.imports) {
        commands.push(CommandSpec::new(format!("goimports -w {}", path), "Imports organized"));
    }
    if params.format.unwrap_or(defaults.format) {
        let extra = if params.extra.unwrap_or(defaults.extra) { " -extra" } else { "" };
        commands.push(CommandSpec::new(
            format!("gofumpt -w{} {}", extra, path),
            "Code formatted with gofumpt",
        ));
    }
    Ok(ToolPlan::sequence(&params.wd, commands, "No fix steps were enabled"))
}
