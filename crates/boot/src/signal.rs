//! Termination signal handling.

/// Wait for a termination signal to initiate shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server is
/// stopped cleanly whether the container is stopped interactively or by
/// the runtime (e.g. Docker, Kubernetes).
pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), stopping server");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, stopping server");
        }
    }
}

/// Forward SIGTERM to a child process so it can drain before the
/// runner's kill fallback fires.
#[cfg(unix)]
pub fn terminate_child(pid: u32) {
    // SAFETY: kill(2) with a valid pid and signal number has no memory
    // safety implications.
    let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
    if rc != 0 {
        tracing::warn!(pid, "Failed to forward SIGTERM to server child");
    }
}

#[cfg(not(unix))]
pub fn terminate_child(_pid: u32) {}
