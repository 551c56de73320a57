//! Pipeline step model.
//!
//! A [`Step`] is one resolved external command; a [`BootPlan`] is the
//! ordered sequence the entrypoint executes: setup steps to completion,
//! then the long-running server.

use std::path::PathBuf;

use crate::error::BootError;

/// The pipeline stages, in boot order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// Reconcile persisted schema state with the declared schema.
    Migrate,
    /// Populate baseline/reference data.
    Seed,
    /// Start the long-running network listener.
    Serve,
}

impl StepKind {
    /// Stable lowercase label used in logs and error messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Migrate => "migrate",
            Self::Seed => "seed",
            Self::Serve => "serve",
        }
    }
}

/// A resolved external command for one pipeline stage.
#[derive(Debug, Clone)]
pub struct Step {
    pub kind: StepKind,
    /// Program to execute (first token of the configured command line).
    pub program: String,
    /// Arguments passed to the program.
    pub args: Vec<String>,
    /// Additional environment variables set for the child process, on
    /// top of the inherited parent environment.
    pub env_vars: Vec<(String, String)>,
}

impl Step {
    /// Split `command_line` on whitespace into program and arguments.
    ///
    /// No quoting or shell expansion: the configured command is an argv
    /// vector, not shell text. A command that needs shell features
    /// should point at a script instead.
    pub fn parse(kind: StepKind, command_line: &str) -> Result<Self, BootError> {
        let mut tokens = command_line.split_whitespace().map(str::to_string);
        let program = tokens.next().ok_or(BootError::EmptyCommand {
            step: kind.label(),
        })?;

        Ok(Self {
            kind,
            program,
            args: tokens.collect(),
            env_vars: Vec::new(),
        })
    }

    /// Add an environment variable for the child process.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.push((key.into(), value.into()));
        self
    }

    /// Full command line for log messages.
    pub fn display_command(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// The ordered boot pipeline.
#[derive(Debug, Clone)]
pub struct BootPlan {
    /// Working directory applied to every child process.
    pub workdir: PathBuf,
    /// Steps run to completion, in order, before the server starts.
    pub setup: Vec<Step>,
    /// The long-running server step.
    pub server: Step,
}
