// gotools-core/src/config.rs

//! Configuration for the executor and the per-tool defaults.
//!
//! Everything has a default, so an empty file (or no file at all) is valid.
//! The structure is built once at startup and shared read-only.

use crate::path::Platform;
use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_DIR_NAME: &str = "gotools";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// The default Go package pattern: every package under the working directory.
pub const DEFAULT_PACKAGE_PATTERN: &str = "./...";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct GoToolsConfig {
    pub execution: ExecutionConfig,
    pub tools: ToolDefaults,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Deadline for a single command in seconds. `0` disables it.
    pub timeout_secs: u64,
    pub strategies: StrategyTable,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self { timeout_secs: 600, strategies: StrategyTable::default() }
    }
}

impl ExecutionConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Blocking spawn through `duct` on the blocking thread pool.
    Blocking,
    /// Non-blocking spawn through `tokio::process`.
    Async,
}

/// Strategy order per platform, tried first to last.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct StrategyTable {
    pub unix: Vec<StrategyKind>,
    pub windows: Vec<StrategyKind>,
}

impl Default for StrategyTable {
    fn default() -> Self {
        let order = vec![StrategyKind::Blocking, StrategyKind::Async];
        Self { unix: order.clone(), windows: order }
    }
}

impl StrategyTable {
    pub fn for_platform(&self, platform: Platform) -> &[StrategyKind] {
        match platform {
            Platform::Unix => &self.unix,
            Platform::Windows => &self.windows,
        }
    }
}

fn default_pattern() -> String {
    DEFAULT_PACKAGE_PATTERN.to_string()
}

/// Defaults applied when a tool call omits an optional parameter.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ToolDefaults {
    pub analyze: AnalyzeDefaults,
    pub lint: PathDefaults,
    pub vet: PathDefaults,
    pub format: FormatDefaults,
    pub test: TestDefaults,
    pub fix: FixDefaults,
    pub deadcode: DeadcodeDefaults,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PathDefaults {
    pub path: String,
}

impl Default for PathDefaults {
    fn default() -> Self {
        Self { path: default_pattern() }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AnalyzeDefaults {
    pub path: String,
    pub fast: bool,
    pub fix: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
}

impl Default for AnalyzeDefaults {
    fn default() -> Self {
        Self { path: default_pattern(), fast: false, fix: false, config: None, severity: None }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FormatDefaults {
    pub path: String,
    /// Rewrite files in place. When off, `go fmt -n` only shows what it would run.
    pub write: bool,
}

impl Default for FormatDefaults {
    fn default() -> Self {
        Self { path: default_pattern(), write: false }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TestDefaults {
    pub path: String,
    pub verbose: bool,
    pub race: bool,
    pub coverage: bool,
    pub coverprofile: String,
}

impl Default for TestDefaults {
    fn default() -> Self {
        Self {
            path: default_pattern(),
            verbose: false,
            race: false,
            coverage: false,
            coverprofile: "coverage.out".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FixDefaults {
    /// goimports and gofumpt take directories, not package patterns.
    pub path: String,
    pub deps: bool,
    pub imports: bool,
    pub format: bool,
    /// Pass `-extra` to gofumpt.
    pub extra: bool,
}

impl Default for FixDefaults {
    fn default() -> Self {
        Self { path: ".".to_string(), deps: true, imports: true, format: true, extra: false }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DeadcodeDefaults {
    pub path: String,
    /// Include test packages in the analysis.
    pub test: bool,
}

impl Default for DeadcodeDefaults {
    fn default() -> Self {
        Self { path: default_pattern(), test: false }
    }
}

impl GoToolsConfig {
    pub fn from_toml_str(content: &str) -> Result<GoToolsConfig> {
        let config: GoToolsConfig = match toml::from_str(content) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::error!(error = %e, "Failed to parse TOML content");
                return Err(anyhow!(e)).context("Failed to parse configuration TOML content. Check TOML syntax.");
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Loads `explicit` if given, else the per-user config file if it
    /// exists, else the built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<GoToolsConfig> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match default_config_path().filter(|p| p.is_file()) {
                Some(path) => path,
                None => {
                    tracing::debug!("No configuration file found, using defaults");
                    return Ok(GoToolsConfig::default());
                }
            },
        };
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).context("Failed to serialize configuration")
    }

    fn validate(&self) -> Result<()> {
        if self.execution.strategies.unix.is_empty() {
            return Err(anyhow!("'execution.strategies.unix' must list at least one strategy."));
        }
        if self.execution.strategies.windows.is_empty() {
            return Err(anyhow!("'execution.strategies.windows' must list at least one strategy."));
        }

        let paths = [
            ("analyze", &self.tools.analyze.path),
            ("lint", &self.tools.lint.path),
            ("vet", &self.tools.vet.path),
            ("format", &self.tools.format.path),
            ("test", &self.tools.test.path),
            ("fix", &self.tools.fix.path),
            ("deadcode", &self.tools.deadcode.path),
        ];
        for (tool, path) in paths {
            if path.trim().is_empty() {
                return Err(anyhow!("'tools.{}.path' is empty.", tool));
            }
        }
        if self.tools.test.coverprofile.trim().is_empty() {
            return Err(anyhow!("'tools.test.coverprofile' is empty."));
        }
        Ok(())
    }
}

/// `<config dir>/gotools/config.toml`, when the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}
