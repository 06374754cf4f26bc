// gotools-core/src/testing.rs

//! A scripted strategy for tests that must not spawn real Go binaries.

use crate::errors::ExecError;
use crate::output::CommandOutput;
use crate::strategy::{ExecutionStrategy, Invocation, RunLimits};
use async_trait::async_trait;
use std::collections::HashMap;
use std::io;
use std::sync::Mutex;

#[derive(Debug, Clone)]
enum Scripted {
    Output(CommandOutput),
    SpawnFailure,
}

/// Records every invocation and answers from a script keyed by command line.
///
/// Unscripted commands exit 0 with no output.
#[derive(Debug, Default)]
pub struct RecordingStrategy {
    script: HashMap<String, Scripted>,
    calls: Mutex<Vec<Invocation>>,
}

impl RecordingStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, command: &str, status: i32, stdout: &str, stderr: &str) -> Self {
        let output = CommandOutput { status, stdout: stdout.to_string(), stderr: stderr.to_string() };
        self.script.insert(command.to_string(), Scripted::Output(output));
        self
    }

    pub fn spawn_failure(mut self, command: &str) -> Self {
        self.script.insert(command.to_string(), Scripted::SpawnFailure);
        self
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    /// The command lines seen so far, in call order.
    pub fn commands(&self) -> Vec<String> {
        self.invocations().into_iter().map(|i| i.command).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ExecutionStrategy for RecordingStrategy {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn run(&self, invocation: &Invocation, _limits: &RunLimits) -> Result<CommandOutput, ExecError> {
        self.calls.lock().unwrap().push(invocation.clone());
        match self.script.get(&invocation.command) {
            Some(Scripted::Output(output)) => Ok(output.clone()),
            Some(Scripted::SpawnFailure) => Err(ExecError::Spawn {
                strategy: self.name(),
                command: invocation.command.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "scripted spawn failure"),
            }),
            None => Ok(CommandOutput { status: 0, stdout: String::new(), stderr: String::new() }),
        }
    }
}
