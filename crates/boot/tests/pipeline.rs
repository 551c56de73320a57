//! End-to-end pipeline tests.
//!
//! Each step is a small shell script that appends a marker to a shared
//! log file, so invocation order and fail-fast skipping are observable
//! from the filesystem.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use assert_matches::assert_matches;

use stagehand_boot::config::{BootConfig, LogFormat};
use stagehand_boot::runner;
use stagehand_core::error::BootError;
use stagehand_core::step::{BootPlan, Step, StepKind};

/// Write a shell script into `dir` and return a step that runs it.
fn script_step(kind: StepKind, dir: &Path, name: &str, body: &str) -> Step {
    let path = dir.join(name);
    let mut f = std::fs::File::create(&path).expect("create script");
    writeln!(f, "#!/bin/sh").expect("write shebang");
    write!(f, "{body}").expect("write body");
    Step::parse(kind, &format!("sh {}", path.display())).expect("parse")
}

/// A step that appends `marker` to the shared log, then exits with `code`.
fn marker_step(kind: StepKind, dir: &Path, log: &Path, marker: &str, code: i32) -> Step {
    script_step(
        kind,
        dir,
        &format!("{marker}.sh"),
        &format!("echo {marker} >> {}\nexit {code}\n", log.display()),
    )
}

fn plan(dir: &Path, setup: Vec<Step>, server: Step) -> BootPlan {
    BootPlan {
        workdir: dir.to_path_buf(),
        setup,
        server,
    }
}

fn read_log(log: &PathBuf) -> String {
    std::fs::read_to_string(log).unwrap_or_default()
}

const DRAIN: Duration = Duration::from_secs(5);

#[tokio::test]
async fn all_steps_succeed_server_runs_once_last() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log = dir.path().join("boot.log");

    let plan = plan(
        dir.path(),
        vec![
            marker_step(StepKind::Migrate, dir.path(), &log, "migrate", 0),
            marker_step(StepKind::Seed, dir.path(), &log, "seed", 0),
        ],
        marker_step(StepKind::Serve, dir.path(), &log, "serve", 0),
    );

    let code = runner::run(&plan, std::future::pending(), DRAIN)
        .await
        .expect("run");

    assert_eq!(code, 0);
    assert_eq!(read_log(&log), "migrate\nseed\nserve\n");
}

#[tokio::test]
async fn migration_failure_skips_seed_and_server() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log = dir.path().join("boot.log");

    let plan = plan(
        dir.path(),
        vec![
            marker_step(StepKind::Migrate, dir.path(), &log, "migrate", 3),
            marker_step(StepKind::Seed, dir.path(), &log, "seed", 0),
        ],
        marker_step(StepKind::Serve, dir.path(), &log, "serve", 0),
    );

    let code = runner::run(&plan, std::future::pending(), DRAIN)
        .await
        .expect("run");

    assert_eq!(code, 3, "exit code must be the failing step's code");
    assert_eq!(read_log(&log), "migrate\n");
}

#[tokio::test]
async fn seed_failure_skips_server() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log = dir.path().join("boot.log");

    let plan = plan(
        dir.path(),
        vec![
            marker_step(StepKind::Migrate, dir.path(), &log, "migrate", 0),
            marker_step(StepKind::Seed, dir.path(), &log, "seed", 5),
        ],
        marker_step(StepKind::Serve, dir.path(), &log, "serve", 0),
    );

    let code = runner::run(&plan, std::future::pending(), DRAIN)
        .await
        .expect("run");

    assert_eq!(code, 5);
    assert_eq!(read_log(&log), "migrate\nseed\n");
}

#[tokio::test]
async fn server_exit_code_is_propagated() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log = dir.path().join("boot.log");

    let plan = plan(
        dir.path(),
        vec![
            marker_step(StepKind::Migrate, dir.path(), &log, "migrate", 0),
            marker_step(StepKind::Seed, dir.path(), &log, "seed", 0),
        ],
        marker_step(StepKind::Serve, dir.path(), &log, "serve", 7),
    );

    let code = runner::run(&plan, std::future::pending(), DRAIN)
        .await
        .expect("run");

    assert_eq!(code, 7);
}

#[tokio::test]
async fn unspawnable_step_aborts_with_typed_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log = dir.path().join("boot.log");

    let plan = plan(
        dir.path(),
        vec![
            Step::parse(StepKind::Migrate, "/nonexistent/stagehand-migrate").expect("parse"),
            marker_step(StepKind::Seed, dir.path(), &log, "seed", 0),
        ],
        marker_step(StepKind::Serve, dir.path(), &log, "serve", 0),
    );

    let err = runner::run(&plan, std::future::pending(), DRAIN)
        .await
        .unwrap_err();

    assert_matches!(err, BootError::Spawn { step: "migrate", .. });
    assert_eq!(read_log(&log), "", "no later step may have run");
}

#[tokio::test]
async fn configured_pipeline_runs_unbuffered_server() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("env.txt");

    let noop = dir.path().join("noop.sh");
    std::fs::write(&noop, "#!/bin/sh\nexit 0\n").expect("write noop");
    let server = dir.path().join("server.sh");
    std::fs::write(
        &server,
        format!(
            "#!/bin/sh\nprintf '%s %s' \"$PYTHONUNBUFFERED\" \"$1\" > {}\n",
            out.display()
        ),
    )
    .expect("write server");

    let config = BootConfig {
        app_dir: dir.path().to_path_buf(),
        migrate_cmd: format!("sh {}", noop.display()),
        seed_cmd: format!("sh {}", noop.display()),
        server_cmd: format!("sh {} {{addr}}", server.display()),
        host: "0.0.0.0".into(),
        port: 8000,
        unbuffered: true,
        shutdown_timeout_secs: 5,
        log_format: LogFormat::Plain,
    };

    let plan = config.plan().expect("plan");
    let code = runner::run(&plan, std::future::pending(), DRAIN)
        .await
        .expect("run");

    assert_eq!(code, 0);
    assert_eq!(
        std::fs::read_to_string(&out).expect("read"),
        "1 0.0.0.0:8000",
        "server child must see PYTHONUNBUFFERED and the resolved bind address"
    );
}

/// Resolve once `ready` exists, i.e. once the server script is up.
async fn ready_then_shutdown(ready: PathBuf) {
    while !ready.exists() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn shutdown_terminates_server_cleanly() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ready = dir.path().join("ready");

    let server = script_step(
        StepKind::Serve,
        dir.path(),
        "server.sh",
        &format!(
            "trap 'exit 0' TERM\ntouch {}\nsleep 30 &\nwait $!\n",
            ready.display()
        ),
    );

    let plan = plan(dir.path(), vec![], server);

    let code = runner::run(&plan, ready_then_shutdown(ready), DRAIN)
        .await
        .expect("run");

    assert_eq!(code, 0, "a requested shutdown is a clean exit");
}

#[tokio::test]
async fn stubborn_server_is_killed_after_drain_window() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ready = dir.path().join("ready");

    // Ignores SIGTERM entirely; only SIGKILL can stop it.
    let server = script_step(
        StepKind::Serve,
        dir.path(),
        "server.sh",
        &format!(
            "trap '' TERM\ntouch {}\nsleep 30 &\nwait $!\n",
            ready.display()
        ),
    );

    let plan = plan(dir.path(), vec![], server);

    let start = std::time::Instant::now();
    let code = runner::run(&plan, ready_then_shutdown(ready), Duration::from_millis(500))
        .await
        .expect("run");

    assert_eq!(code, 0);
    assert!(
        start.elapsed() < Duration::from_secs(20),
        "kill fallback must not wait out the server's sleep"
    );
}
