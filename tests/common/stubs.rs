#![allow(dead_code)]

use engine_registry::engine::{
    Engine, EngineId, EnginePurpose, EngineSettings, ExecutableRole, ProcessOutput, ProcessRunner,
    Resource, RunError,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Scripted reply of the stub runner
#[derive(Debug, Clone)]
pub enum Reply {
    Output(ProcessOutput),
    LaunchFailure(String),
    Interrupted,
}

impl Reply {
    pub fn lines(exit_code: i32, lines: &[&str]) -> Self {
        Reply::Output(ProcessOutput::new(
            exit_code,
            lines.iter().map(|l| l.to_string()).collect(),
        ))
    }
}

/// `ProcessRunner` answering from a script and recording every invocation
#[derive(Default)]
pub struct StubRunner {
    replies: HashMap<PathBuf, Reply>,
    fallback: Option<Reply>,
    calls: Mutex<Vec<(PathBuf, Vec<String>)>>,
}

impl StubRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, program: impl Into<PathBuf>, reply: Reply) -> Self {
        self.replies.insert(program.into(), reply);
        self
    }

    /// Reply for programs without a scripted answer
    pub fn otherwise(mut self, reply: Reply) -> Self {
        self.fallback = Some(reply);
        self
    }

    pub fn calls(&self) -> Vec<(PathBuf, Vec<String>)> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn calls_for(&self, program: &Path) -> usize {
        self.calls.lock().iter().filter(|(p, _)| p == program).count()
    }
}

impl ProcessRunner for StubRunner {
    fn run(&self, program: &Path, args: &[&str]) -> Result<ProcessOutput, RunError> {
        self.calls.lock().push((
            program.to_path_buf(),
            args.iter().map(|a| a.to_string()).collect(),
        ));

        let reply = self
            .replies
            .get(program)
            .or(self.fallback.as_ref())
            .cloned()
            .unwrap_or_else(|| Reply::LaunchFailure(format!("no such program: {}", program.display())));

        match reply {
            Reply::Output(output) => Ok(output),
            Reply::LaunchFailure(message) => Err(RunError::Launch(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                message,
            ))),
            Reply::Interrupted => Err(RunError::Interrupted),
        }
    }
}

/// In-memory configuration provider
#[derive(Debug, Clone, Default)]
pub struct StubSettings {
    pub priority: Vec<String>,
    pub disabled: Vec<String>,
    pub roles: Vec<(String, ExecutableRole)>,
}

impl StubSettings {
    pub fn ranked(priority: &[&str]) -> Self {
        Self {
            priority: priority.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn disable(mut self, id: &str) -> Self {
        self.disabled.push(id.to_string());
        self
    }

    pub fn prefer(mut self, id: &str, role: ExecutableRole) -> Self {
        self.roles.push((id.to_string(), role));
        self
    }
}

impl EngineSettings for StubSettings {
    fn is_engine_enabled(&self, id: &EngineId) -> bool {
        !self.disabled.iter().any(|d| id.matches(d))
    }

    fn priority_rank(&self, id: &EngineId) -> Option<usize> {
        self.priority.iter().position(|p| id.matches(p))
    }

    fn executable_role(&self, id: &EngineId) -> Option<ExecutableRole> {
        self.roles
            .iter()
            .find(|(entry, _)| id.matches(entry))
            .map(|(_, role)| *role)
    }
}

/// Resource compatible with engines of one purpose
pub struct StubResource {
    pub name: String,
    pub purpose: EnginePurpose,
}

impl StubResource {
    pub fn new(name: &str, purpose: EnginePurpose) -> Self {
        Self {
            name: name.to_string(),
            purpose,
        }
    }
}

impl Resource for StubResource {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_compatible(&self, engine: &Engine) -> bool {
        engine.purpose() == self.purpose
    }
}
