//! `stagehand-boot` -- container entrypoint for the challenge platform
//! web service.
//!
//! Applies database migrations, seeds baseline data, then starts the
//! development web server, strictly in that order. The first failing
//! step aborts the boot and its exit code becomes the process exit
//! code; once the server is running, its exit code is propagated
//! instead.
//!
//! # Environment variables
//!
//! | Variable                | Required | Default                               | Description                            |
//! |-------------------------|----------|---------------------------------------|----------------------------------------|
//! | `APP_DIR`               | no       | `/code`                               | Application checkout directory         |
//! | `MIGRATE_CMD`           | no       | `python3 manage.py migrate --noinput` | Non-interactive schema migration       |
//! | `SEED_CMD`              | no       | `python3 manage.py seed`              | Baseline data seeding                  |
//! | `SERVER_CMD`            | no       | `python3 manage.py runserver {addr}`  | Server launch; `{addr}` = `HOST:PORT`  |
//! | `HOST`                  | no       | `0.0.0.0`                             | Server bind address                    |
//! | `PORT`                  | no       | `8000`                                | Server bind port                       |
//! | `UNBUFFERED`            | no       | `true`                                | `PYTHONUNBUFFERED=1` on the server     |
//! | `SHUTDOWN_TIMEOUT_SECS` | no       | `30`                                  | SIGTERM-to-SIGKILL drain window        |
//! | `LOG_FORMAT`            | no       | `plain`                               | `plain` or `json` log output           |

use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stagehand_boot::config::{BootConfig, LogFormat};
use stagehand_boot::{runner, signal};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = BootConfig::from_env();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "stagehand_boot=info,stagehand_core=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Plain => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    tracing::info!(
        app_dir = %config.app_dir.display(),
        host = %config.host,
        port = config.port,
        "Loaded entrypoint configuration",
    );

    let plan = match config.plan() {
        Ok(plan) => plan,
        Err(err) => {
            tracing::error!(error = %err, "Invalid boot configuration");
            std::process::exit(1);
        }
    };

    let drain = Duration::from_secs(config.shutdown_timeout_secs);

    let code = match runner::run(&plan, signal::shutdown_signal(), drain).await {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = %err, "Boot pipeline failed");
            1
        }
    };

    std::process::exit(code);
}
