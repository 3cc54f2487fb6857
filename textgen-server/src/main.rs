use clap::Parser;
use std::sync::Arc;
use textgen_server::backend::CheckpointLoader;
use textgen_server::errors::{Result, ServerError};
use textgen_server::{api, observability, AppState, Config};
use tokio::signal;
use tracing::info;

/// Text generation server with on-demand model loading
#[derive(Parser, Debug)]
#[command(name = "textgen-server")]
#[command(about = "Serve text generation from checkpoint runs over HTTP")]
#[command(version)]
struct Cli {
    /// Configuration file path (default: ~/.textgen/server.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Port to listen on (overrides config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Checkpoint directory (overrides config file)
    #[arg(long)]
    checkpoint_dir: Option<String>,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Generate default config and exit
    #[arg(long)]
    generate_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = Config::resolve_path(cli.config.as_deref())?;

    if cli.generate_config {
        Config::default().save(&config_path)?;
        println!("Generated default configuration at: {}", config_path.display());
        println!("\nEdit the configuration file and then start the server with:");
        println!("  textgen-server --config {}", config_path.display());
        return Ok(());
    }

    let mut config = if config_path.exists() {
        Config::load(&config_path)?
    } else {
        // Auto-generate default config on first run
        let config = Config::default();
        config.save(&config_path)?;
        println!(
            "First run detected - created default configuration at: {}",
            config_path.display()
        );
        config
    };

    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(dir) = cli.checkpoint_dir {
        config.models.checkpoint_dir = dir;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.validate()?;

    let log_dir = config.logging.log_to_file.then(|| config.log_dir());
    observability::init_logging(&config.logging.level, log_dir.as_deref())?;

    info!("Starting text generation server");

    let checkpoint_dir = config.checkpoint_dir();
    info!(
        path = %checkpoint_dir.display(),
        default_run_name = %config.models.default_run_name,
        "Using checkpoint directory"
    );
    if !checkpoint_dir.is_dir() {
        tracing::warn!(
            path = %checkpoint_dir.display(),
            "Checkpoint directory does not exist; every load will fail until it is created"
        );
    }

    let loader = Arc::new(CheckpointLoader::new(&checkpoint_dir));
    let state = AppState::new(loader, config.models.default_run_name.clone(), checkpoint_dir);
    let app = api::create_router(state.clone());

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        tracing::error!(address = %addr, error = %e, "Failed to bind");
        ServerError::Io(e)
    })?;
    info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.residency().unload();
    info!(stats = ?state.residency().stats(), "Server shut down");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }
}
