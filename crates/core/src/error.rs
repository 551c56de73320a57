use std::path::PathBuf;

/// Errors that can abort the boot pipeline.
///
/// A step that runs and exits non-zero is not an error -- its exit code
/// is reported through [`StepOutcome`](crate::process::StepOutcome).
/// These variants cover the cases where a step could not run at all, or
/// the supervisor lost track of a running child.
#[derive(Debug, thiserror::Error)]
pub enum BootError {
    /// The configured application directory does not exist.
    #[error("application directory not found: {}", .0.display())]
    WorkdirMissing(PathBuf),

    /// A configured command line was empty after splitting.
    #[error("empty command line for {step} step")]
    EmptyCommand { step: &'static str },

    /// The step's program could not be spawned.
    #[error("failed to spawn {step} command `{program}`: {source}")]
    Spawn {
        step: &'static str,
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting on a running child process failed.
    #[error("failed waiting on {step} command: {source}")]
    Wait {
        step: &'static str,
        #[source]
        source: std::io::Error,
    },
}
