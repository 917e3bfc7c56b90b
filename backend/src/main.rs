//! OnAir backend server.

use clap::{Parser, Subcommand};
use std::io::BufRead;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{info, warn};

use onair::{
    auth::{self, AuthConfig},
    config::Config,
    create_app_with_config, logging,
    state::AppState,
    storage::{JsonFileStorage, PostgresStorage},
};

/// OnAir - stream endpoint authorization for the society media server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory holding endpoints.json when no database is configured
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Explicit path to the endpoints JSON file
    #[arg(long)]
    endpoints_path: Option<PathBuf>,

    /// PostgreSQL URL; when set the JSON file is not used
    #[arg(long)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a bcrypt hash for ONAIR_ADMIN_PASSWORD_HASH (reads stdin if no password is given)
    HashPassword { password: Option<String> },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if let Some(Command::HashPassword { password }) = args.command {
        let password = match password {
            Some(p) => p,
            None => {
                let mut line = String::new();
                std::io::stdin().lock().read_line(&mut line)?;
                line.trim_end_matches(['\r', '\n']).to_string()
            }
        };
        println!("{}", auth::hash_password(&password)?);
        return Ok(());
    }

    let config = Config::from_figment(
        args.port,
        args.data_dir,
        args.endpoints_path,
        args.database_url,
    )?;

    let _log_guard = logging::init(config.log_level.as_deref(), config.log_file.as_deref())?;
    info!("Starting OnAir backend server...");

    if config.stream.legacy_keys.is_empty() {
        warn!("No legacy stream keys configured - /stream/auth will refuse every key");
    }
    if !config.stream.enforce_validity_window {
        warn!("Validity windows are not enforced on publish");
    }

    let state = match &config.database_url {
        Some(url) => {
            info!("Using PostgreSQL endpoint storage");
            let storage = PostgresStorage::new(url, config.max_connections).await?;
            storage.run_migrations().await?;
            AppState::new(storage, config.stream.clone())
        }
        None => {
            info!(
                "Using JSON endpoint storage at {}",
                config.endpoints_path.display()
            );
            AppState::new(
                JsonFileStorage::new(&config.endpoints_path),
                config.stream.clone(),
            )
        }
    };

    let app = create_app_with_config(state, AuthConfig::from_env(), config.cors_allowed_origins);

    // Bind to 0.0.0.0 so the media server can reach us from other containers
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down gracefully...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server stopped");
    Ok(())
}
