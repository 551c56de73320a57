//! Subprocess execution for pipeline steps.
//!
//! Children inherit stdio so their output streams straight through to
//! the container log driver; nothing is captured or buffered here.
//! Stdin is closed, keeping every step non-interactive.

use std::path::Path;
use std::process::Stdio;
use std::time::Instant;

use serde::Serialize;
use tokio::process::{Child, Command};

use crate::error::BootError;
use crate::step::Step;

/// Result of a step that ran to completion.
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    /// Step label (`migrate`, `seed`, `serve`).
    pub step: &'static str,
    /// Process exit code (`-1` if killed by a signal).
    pub exit_code: i32,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl StepOutcome {
    /// Whether the step exited cleanly.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Build the child process command for a step.
///
/// `kill_on_drop(true)` ensures a still-running child does not outlive
/// the supervisor if the pipeline is torn down early.
fn command(step: &Step, workdir: &Path) -> Command {
    let mut cmd = Command::new(&step.program);
    cmd.args(&step.args)
        .current_dir(workdir)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);

    for (key, value) in &step.env_vars {
        cmd.env(key, value);
    }

    cmd
}

/// Run a setup step to completion and report its exit status.
///
/// A non-zero exit is not an error here -- the caller decides what a
/// failed step means for the rest of the pipeline.
pub async fn run_to_completion(step: &Step, workdir: &Path) -> Result<StepOutcome, BootError> {
    let start = Instant::now();

    let mut child = command(step, workdir)
        .spawn()
        .map_err(|source| BootError::Spawn {
            step: step.kind.label(),
            program: step.program.clone(),
            source,
        })?;

    let status = child.wait().await.map_err(|source| BootError::Wait {
        step: step.kind.label(),
        source,
    })?;

    Ok(StepOutcome {
        step: step.kind.label(),
        exit_code: status.code().unwrap_or(-1),
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

/// Spawn the server step and hand back the child for supervised waiting.
pub fn spawn(step: &Step, workdir: &Path) -> Result<Child, BootError> {
    command(step, workdir)
        .spawn()
        .map_err(|source| BootError::Spawn {
            step: step.kind.label(),
            program: step.program.clone(),
            source,
        })
}
