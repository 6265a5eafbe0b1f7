// ABOUTME: Cadence server entrypoint
// ABOUTME: Parses flags, opens the database and serves the HTTP API

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::http::Method;
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use cadence_api::DbState;

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "cadence", about = "Sprint and task tracking server", version)]
struct Cli {
    /// Port to listen on (overrides CADENCE_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// SQLite database file (overrides CADENCE_DB)
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Allowed CORS origin (overrides CADENCE_CORS_ORIGIN)
    #[arg(long)]
    cors_origin: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let port = cli.port.unwrap_or(config.port);
    let database_path = cli.db_path.or(config.database_path);
    let cors_origin = cli.cors_origin.unwrap_or(config.cors_origin);

    let state = DbState::init_with_path(database_path).await?;
    info!("Database ready");

    let cors = CorsLayer::new()
        .allow_origin(cors_origin.parse::<axum::http::HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let app = cadence_api::create_router(state).layer(cors);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Cadence listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
