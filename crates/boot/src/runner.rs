//! Boot pipeline execution.
//!
//! Runs the setup steps in order, fail-fast, then supervises the server
//! child until it exits on its own or a shutdown is requested.

use std::future::Future;
use std::time::Duration;

use stagehand_core::error::BootError;
use stagehand_core::process;
use stagehand_core::step::{BootPlan, Step};

use crate::signal;

/// Execute the full boot pipeline and return the process exit code.
///
/// Each setup step must exit cleanly before the next one spawns; the
/// first non-zero exit code stops the pipeline and becomes the return
/// value. When all setup steps succeed the server is spawned exactly
/// once and its exit code is returned.
///
/// `shutdown` resolves when the supervisor should stop the server (in
/// production: SIGINT/SIGTERM, see [`signal::shutdown_signal`]). `drain`
/// bounds how long the server child gets between SIGTERM and SIGKILL.
pub async fn run(
    plan: &BootPlan,
    shutdown: impl Future<Output = ()>,
    drain: Duration,
) -> Result<i32, BootError> {
    for step in &plan.setup {
        tracing::info!(
            step = step.kind.label(),
            command = %step.display_command(),
            "Running setup step",
        );

        let outcome = process::run_to_completion(step, &plan.workdir).await?;

        if !outcome.success() {
            tracing::error!(
                step = outcome.step,
                exit_code = outcome.exit_code,
                duration_ms = outcome.duration_ms,
                "Setup step failed, aborting boot",
            );
            return Ok(outcome.exit_code);
        }

        tracing::info!(
            step = outcome.step,
            duration_ms = outcome.duration_ms,
            "Setup step complete",
        );
    }

    serve(&plan.server, &plan.workdir, shutdown, drain).await
}

/// Spawn the server and wait for it to exit or for shutdown.
async fn serve(
    step: &Step,
    workdir: &std::path::Path,
    shutdown: impl Future<Output = ()>,
    drain: Duration,
) -> Result<i32, BootError> {
    tracing::info!(command = %step.display_command(), "Starting server");

    let mut child = process::spawn(step, workdir)?;
    let pid = child.id();
    tracing::info!(pid, "Server started");

    let exited = tokio::select! {
        status = child.wait() => Some(status),
        () = shutdown => None,
    };

    match exited {
        Some(status) => {
            let status = status.map_err(|source| BootError::Wait {
                step: step.kind.label(),
                source,
            })?;
            let exit_code = status.code().unwrap_or(-1);
            if exit_code == 0 {
                tracing::info!(exit_code, "Server exited");
            } else {
                tracing::error!(exit_code, "Server exited");
            }
            Ok(exit_code)
        }
        None => stop(child, drain).await,
    }
}

/// Stop a running server child: SIGTERM, bounded wait, SIGKILL fallback.
///
/// A child that dies to the forwarded signal is a clean stop -- the
/// shutdown was requested, so the pipeline did its job.
async fn stop(mut child: tokio::process::Child, drain: Duration) -> Result<i32, BootError> {
    if let Some(pid) = child.id() {
        signal::terminate_child(pid);
    }

    match tokio::time::timeout(drain, child.wait()).await {
        Ok(Ok(status)) => {
            let exit_code = status.code().unwrap_or(0);
            tracing::info!(exit_code, "Server stopped");
            Ok(exit_code)
        }
        Ok(Err(source)) => Err(BootError::Wait {
            step: "serve",
            source,
        }),
        Err(_elapsed) => {
            tracing::warn!(
                drain_secs = drain.as_secs(),
                "Server did not stop within drain window, killing",
            );
            child.kill().await.map_err(|source| BootError::Wait {
                step: "serve",
                source,
            })?;
            Ok(0)
        }
    }
}
