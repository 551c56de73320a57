use std::path::PathBuf;

use stagehand_core::error::BootError;
use stagehand_core::step::{BootPlan, Step, StepKind};

/// Log output format for the container log driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Plain,
    Json,
}

/// Entrypoint configuration loaded from environment variables.
///
/// All fields have defaults matching the development container layout.
/// In deployment, override via environment variables.
#[derive(Debug, Clone)]
pub struct BootConfig {
    /// Application checkout directory inside the container.
    pub app_dir: PathBuf,
    /// Schema migration command; must run without prompts.
    pub migrate_cmd: String,
    /// Data seeding command.
    pub seed_cmd: String,
    /// Server command. The literal `{addr}` expands to `HOST:PORT`.
    pub server_cmd: String,
    /// Bind address for the server (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Set `PYTHONUNBUFFERED=1` on the server child so its output
    /// reaches the log driver without buffering delay.
    pub unbuffered: bool,
    /// Seconds the server gets between SIGTERM and SIGKILL on shutdown.
    pub shutdown_timeout_secs: u64,
    /// Log output format (default: plain).
    pub log_format: LogFormat,
}

impl BootConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                               |
    /// |-------------------------|---------------------------------------|
    /// | `APP_DIR`               | `/code`                               |
    /// | `MIGRATE_CMD`           | `python3 manage.py migrate --noinput` |
    /// | `SEED_CMD`              | `python3 manage.py seed`              |
    /// | `SERVER_CMD`            | `python3 manage.py runserver {addr}`  |
    /// | `HOST`                  | `0.0.0.0`                             |
    /// | `PORT`                  | `8000`                                |
    /// | `UNBUFFERED`            | `true`                                |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                                  |
    /// | `LOG_FORMAT`            | `plain`                               |
    pub fn from_env() -> Self {
        let app_dir = PathBuf::from(std::env::var("APP_DIR").unwrap_or_else(|_| "/code".into()));

        let migrate_cmd = std::env::var("MIGRATE_CMD")
            .unwrap_or_else(|_| "python3 manage.py migrate --noinput".into());
        let seed_cmd = std::env::var("SEED_CMD").unwrap_or_else(|_| "python3 manage.py seed".into());
        let server_cmd = std::env::var("SERVER_CMD")
            .unwrap_or_else(|_| "python3 manage.py runserver {addr}".into());

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let unbuffered = std::env::var("UNBUFFERED")
            .map(|v| parse_bool(&v))
            .unwrap_or(true);

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let log_format = match std::env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Plain,
        };

        Self {
            app_dir,
            migrate_cmd,
            seed_cmd,
            server_cmd,
            host,
            port,
            unbuffered,
            shutdown_timeout_secs,
            log_format,
        }
    }

    /// Validate the working directory and resolve the pipeline steps.
    ///
    /// Fails before the migration step ever runs if the deploy directory
    /// is missing, or if any configured command line is empty.
    pub fn plan(&self) -> Result<BootPlan, BootError> {
        if !self.app_dir.is_dir() {
            return Err(BootError::WorkdirMissing(self.app_dir.clone()));
        }

        let addr = format!("{}:{}", self.host, self.port);
        let mut server = Step::parse(StepKind::Serve, &self.server_cmd.replace("{addr}", &addr))?;
        if self.unbuffered {
            server = server.env("PYTHONUNBUFFERED", "1");
        }

        Ok(BootPlan {
            workdir: self.app_dir.clone(),
            setup: vec![
                Step::parse(StepKind::Migrate, &self.migrate_cmd)?,
                Step::parse(StepKind::Seed, &self.seed_cmd)?,
            ],
            server,
        })
    }
}

/// Lenient boolean parsing: anything except `0` / `false` / `no` is true.
fn parse_bool(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no"
    )
}
