// gotools-server/src/server.rs

//! The MCP tool handlers. Each tool builds a [`ToolPlan`] and hands it to the
//! execution engine; the engine's result goes back to the client as text.

use crate::tools::{self, Steps, ToolPlan};
use gotools_core::{
    CancellationToken, CommandExecutor, ExecutionResult, GoToolsConfig, Platform, QuoteError, execute_sequence,
};
use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    service::RequestContext,
    tool, tool_handler, tool_router,
};
use std::sync::Arc;
use tracing::{info, warn};

const INSTRUCTIONS: &str = "Go toolchain operations for a module on this machine. Every tool takes \
'wd', the absolute path of the Go module to run in. Output is the raw text of the underlying tool; \
isError is set when it failed.";

#[derive(Debug, Clone)]
pub struct GoToolsServer {
    config: Arc<GoToolsConfig>,
    executor: Arc<CommandExecutor>,
    tool_router: ToolRouter<GoToolsServer>,
}

impl GoToolsServer {
    pub fn new(config: Arc<GoToolsConfig>) -> Self {
        let executor = Arc::new(CommandExecutor::from_config(&config.execution));
        Self::with_executor(config, executor)
    }

    pub fn with_executor(config: Arc<GoToolsConfig>, executor: Arc<CommandExecutor>) -> Self {
        Self { config, executor, tool_router: Self::tool_router() }
    }

    /// Runs a plan through the executor or the sequence orchestrator.
    pub async fn run_plan(&self, plan: ToolPlan, cancel: &CancellationToken) -> ExecutionResult {
        info!(working_dir = %plan.working_dir, commands = ?plan.commands(), "Running tool plan");
        match &plan.steps {
            Steps::Single(spec) => {
                self.executor
                    .execute(&spec.command, &plan.working_dir, &spec.success_message, cancel)
                    .await
            }
            Steps::Sequence { commands, success_message } => {
                execute_sequence(&self.executor, commands, &plan.working_dir, success_message, cancel).await
            }
        }
    }

    fn platform(&self) -> Platform {
        self.executor.platform()
    }

    /// Runs a built plan, or reports why the parameters could not be turned into one.
    async fn respond(
        &self,
        plan: Result<ToolPlan, QuoteError>,
        context: &RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let result = match plan {
            Ok(plan) => self.run_plan(plan, &context.ct).await,
            Err(e) => {
                warn!(error = %e, "Refusing tool parameters");
                ExecutionResult::failure(e.to_string())
            }
        };
        Ok(into_call_result(result))
    }
}

fn into_call_result(result: ExecutionResult) -> CallToolResult {
    let content = vec![Content::text(result.text)];
    if result.is_error {
        CallToolResult::error(content)
    } else {
        CallToolResult::success(content)
    }
}

#[tool_router]
impl GoToolsServer {
    #[tool(
        name = "go_analyze",
        description = "Run golangci-lint over the given packages and report the issues it finds."
    )]
    async fn go_analyze(
        &self,
        Parameters(params): Parameters<tools::AnalyzeParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let plan = tools::go_analyze(&params, &self.config.tools.analyze, self.platform());
        self.respond(plan, &context).await
    }

    #[tool(name = "go_lint", description = "Run golint over the given packages.")]
    async fn go_lint(
        &self,
        Parameters(params): Parameters<tools::PathParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let plan = tools::go_lint(&params, &self.config.tools.lint, self.platform());
        self.respond(plan, &context).await
    }

    #[tool(name = "go_vet", description = "Run go vet to report suspicious constructs.")]
    async fn go_vet(
        &self,
        Parameters(params): Parameters<tools::PathParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let plan = tools::go_vet(&params, &self.config.tools.vet, self.platform());
        self.respond(plan, &context).await
    }

    #[tool(
        name = "go_format",
        description = "Format Go source with go fmt. Without write=true this is a dry run."
    )]
    async fn go_format(
        &self,
        Parameters(params): Parameters<tools::FormatParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let plan = tools::go_format(&params, &self.config.tools.format, self.platform());
        self.respond(plan, &context).await
    }

    #[tool(name = "go_tidy", description = "Run go mod tidy to sync go.mod and go.sum with the source.")]
    async fn go_tidy(
        &self,
        Parameters(params): Parameters<tools::TidyParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.respond(Ok(tools::go_tidy(&params)), &context).await
    }

    #[tool(name = "go_deadcode", description = "Find functions that are unreachable from the program's entry points.")]
    async fn go_deadcode(
        &self,
        Parameters(params): Parameters<tools::DeadcodeParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let plan = tools::go_deadcode(&params, &self.config.tools.deadcode, self.platform());
        self.respond(plan, &context).await
    }

    #[tool(
        name = "go_test",
        description = "Run go test. Optionally with the race detector, benchmarks, or a coverage summary."
    )]
    async fn go_test(
        &self,
        Parameters(params): Parameters<tools::TestParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let plan = tools::go_test(&params, &self.config.tools.test, self.platform());
        self.respond(plan, &context).await
    }

    #[tool(
        name = "go_fix",
        description = "Tidy dependencies, organize imports with goimports and format with gofumpt. \
                       Every step runs even if an earlier one fails."
    )]
    async fn go_fix(
        &self,
        Parameters(params): Parameters<tools::FixParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let plan = tools::go_fix(&params, &self.config.tools.fix, self.platform());
        self.respond(plan, &context).await
    }
}

#[tool_handler]
impl ServerHandler for GoToolsServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "gotools-server".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(INSTRUCTIONS.to_string()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gotools_core::testing::RecordingStrategy;
    use gotools_core::{ExecutionStrategy, SEQUENCE_DELIMITER, ToolDefaults};
    use serde_json::json;

    fn server_with(strategy: Arc<RecordingStrategy>) -> GoToolsServer {
        let executor = CommandExecutor::new(Platform::Unix, vec![strategy as Arc<dyn ExecutionStrategy>]);
        GoToolsServer::with_executor(Arc::new(GoToolsConfig::default()), Arc::new(executor))
    }

    fn params<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> T {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_every_operation_is_registered() {
        let server = server_with(Arc::new(RecordingStrategy::new()));
        let mut names: Vec<String> = server.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        names.sort();
        assert_eq!(
            names,
            vec!["go_analyze", "go_deadcode", "go_fix", "go_format", "go_lint", "go_test", "go_tidy", "go_vet"]
        );
    }

    #[tokio::test]
    async fn test_go_vet_silent_success() {
        let strategy = Arc::new(RecordingStrategy::new());
        let server = server_with(strategy.clone());
        let defaults = ToolDefaults::default();

        let plan = tools::go_vet(&params(json!({ "wd": "/abs/project", "path": "./..." })), &defaults.vet, Platform::Unix).unwrap();
        let result = server.run_plan(plan, &CancellationToken::new()).await;

        assert_eq!(result, ExecutionResult::success("No issues found by go vet"));
        assert_eq!(strategy.commands(), vec!["go vet ./..."]);
        let invocation = &strategy.invocations()[0];
        assert_eq!(invocation.current_dir.as_deref(), Some(std::path::Path::new("/abs/project")));
    }

    #[tokio::test]
    async fn test_relative_wd_never_spawns() {
        let strategy = Arc::new(RecordingStrategy::new());
        let server = server_with(strategy.clone());
        let defaults = ToolDefaults::default();
        let cancel = CancellationToken::new();

        let plans = vec![
            tools::go_vet(&params(json!({ "wd": "project" })), &defaults.vet, Platform::Unix).unwrap(),
            tools::go_tidy(&params(json!({ "wd": "./project" }))),
            tools::go_test(&params(json!({ "wd": "project", "coverage": true })), &defaults.test, Platform::Unix).unwrap(),
            tools::go_fix(&params(json!({ "wd": "project" })), &defaults.fix, Platform::Unix).unwrap(),
        ];
        for plan in plans {
            let wd = plan.working_dir.clone();
            let result = server.run_plan(plan, &cancel).await;
            assert!(result.is_error);
            assert!(result.text.contains(&wd), "Unexpected text: {}", result.text);
        }
        assert_eq!(strategy.call_count(), 0);
    }

    #[tokio::test]
    async fn test_go_test_with_coverage_runs_both_steps() {
        let strategy = Arc::new(
            RecordingStrategy::new()
                .respond("go test -coverprofile=coverage.out ./...", 0, "ok  \texample.com/demo\t0.01s\n", "")
                .respond("go tool cover -func=coverage.out", 0, "total:\t(statements)\t87.5%\n", ""),
        );
        let server = server_with(strategy.clone());

        let plan = tools::go_test(&params(json!({ "wd": "/abs/project", "coverage": true })), &ToolDefaults::default().test, Platform::Unix).unwrap();
        let result = server.run_plan(plan, &CancellationToken::new()).await;

        assert!(!result.is_error);
        assert_eq!(
            strategy.commands(),
            vec!["go test -coverprofile=coverage.out ./...", "go tool cover -func=coverage.out"]
        );
        let blocks: Vec<&str> = result.text.split(SEQUENCE_DELIMITER).collect();
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].starts_with("[go test -coverprofile=coverage.out ./...]:\n"));
        assert!(blocks[1].contains("87.5%"));
    }

    #[tokio::test]
    async fn test_go_fix_without_deps_runs_imports_then_format() {
        let strategy = Arc::new(RecordingStrategy::new());
        let server = server_with(strategy.clone());

        let plan = tools::go_fix(
            &params(json!({ "wd": "/abs/project", "deps": false, "imports": true, "format": true })),
            &ToolDefaults::default().fix,
            Platform::Unix,
        )
        .unwrap();
        let result = server.run_plan(plan, &CancellationToken::new()).await;

        assert!(!result.is_error);
        assert_eq!(strategy.commands(), vec!["goimports -w .", "gofumpt -w ."]);
        assert!(!result.text.contains("go mod tidy"));
    }

    #[tokio::test]
    async fn test_go_fix_reports_partial_failure() {
        let strategy = Arc::new(
            RecordingStrategy::new().respond("go mod tidy", 1, "", "go: go.mod file not found"),
        );
        let server = server_with(strategy.clone());

        let plan = tools::go_fix(&params(json!({ "wd": "/abs/project" })), &ToolDefaults::default().fix, Platform::Unix).unwrap();
        let result = server.run_plan(plan, &CancellationToken::new()).await;

        assert!(result.is_error);
        assert_eq!(strategy.call_count(), 3);
        assert!(result.text.contains("[go mod tidy] failed:\ngo: go.mod file not found"));
        assert!(result.text.contains("[gofumpt -w .]:\nCode formatted with gofumpt"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shell_syntax_in_parameters_runs_nothing_extra() {
        let dir = tempfile::tempdir().unwrap();
        let wd = dir.path().to_str().unwrap();
        let server = GoToolsServer::with_executor(
            Arc::new(GoToolsConfig::default()),
            Arc::new(CommandExecutor::new(Platform::Unix, vec![Arc::new(gotools_core::AsyncStrategy) as Arc<dyn ExecutionStrategy>])),
        );
        let defaults = ToolDefaults::default();
        let cancel = CancellationToken::new();

        let lint = tools::go_lint(
            &params(json!({ "wd": wd, "path": "./...;echo${IFS}INJECTED>&2;touch${IFS}pwned" })),
            &defaults.lint,
            Platform::Unix,
        )
        .unwrap();
        let result = server.run_plan(lint, &cancel).await;
        assert!(!result.text.contains("INJECTED"), "Unexpected text: {}", result.text);

        let vet = tools::go_vet(&params(json!({ "wd": wd, "path": "a b $(touch pwned2)" })), &defaults.vet, Platform::Unix)
            .unwrap();
        server.run_plan(vet, &cancel).await;

        let test = tools::go_test(&params(json!({ "wd": wd, "bench": "`touch pwned3`" })), &defaults.test, Platform::Unix)
            .unwrap();
        server.run_plan(test, &cancel).await;

        for marker in ["pwned", "pwned2", "pwned3"] {
            assert!(!dir.path().join(marker).exists(), "{} was created", marker);
        }
    }

    #[tokio::test]
    async fn test_refused_parameters_become_an_error_result() {
        let strategy = Arc::new(RecordingStrategy::new());
        let executor = CommandExecutor::new(Platform::Windows, vec![strategy.clone() as Arc<dyn ExecutionStrategy>]);
        let server = GoToolsServer::with_executor(Arc::new(GoToolsConfig::default()), Arc::new(executor));

        let plan = tools::go_vet(
            &params(json!({ "wd": "C:\\work", "path": "./... & calc" })),
            &ToolDefaults::default().vet,
            server.platform(),
        );
        assert!(plan.is_err());
        let message = plan.unwrap_err().to_string();
        let result = into_call_result(ExecutionResult::failure(message));
        assert_eq!(result.is_error, Some(true));
        assert_eq!(strategy.call_count(), 0);
    }

    #[test]
    fn test_call_result_carries_error_flag() {
        let ok = into_call_result(ExecutionResult::success("fine"));
        assert_eq!(ok.is_error, Some(false));
        let failed = into_call_result(ExecutionResult::failure("broken"));
        assert_eq!(failed.is_error, Some(true));
    }

    #[test]
    fn test_server_info_advertises_tools() {
        let server = server_with(Arc::new(RecordingStrategy::new()));
        let info = server.get_info();
        assert!(info.capabilities.tools.is_some());
        assert_eq!(info.server_info.name, "gotools-server");
    }
}
