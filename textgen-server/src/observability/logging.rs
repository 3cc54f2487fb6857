use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging with an optional daily rotating log file
///
/// - Stdout always
/// - `<log_dir>/textgen-server.log`, rotated daily, when `log_dir` is given
/// - `RUST_LOG` overrides `level`
pub fn init_logging(level: &str, log_dir: Option<&Path>) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match log_dir {
        Some(log_dir) => {
            std::fs::create_dir_all(log_dir)?;
            let file_appender =
                RollingFileAppender::new(Rotation::DAILY, log_dir, "textgen-server.log");

            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_writer(file_appender)
                        .with_ansi(false) // No colors in log files
                        .with_target(true)
                        .with_line_number(true),
                )
                .with(
                    fmt::layer()
                        .with_writer(std::io::stdout)
                        .with_target(false)
                        .with_line_number(false),
                )
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

            tracing::info!(
                log_dir = %log_dir.display(),
                level = %level,
                "File logging initialized"
            );
        }
        None => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stdout)
                        .with_target(false)
                        .with_line_number(false),
                )
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
        }
    }

    Ok(())
}
