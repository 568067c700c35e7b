//! Quiz Server - token-authenticated backend for the quiz app

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use config::{Config, LoggingConfig, SeedUserConfig};
use quiz_api::{AppState, cors_layer, create_router};
use quiz_auth::JwtManager;
use quiz_db::{Database, NewUser, UserStore};

/// Quiz Server - issues and checks login tokens for the quiz app
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "QUIZ_SERVER_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Token signing secret
    #[arg(long, env = "SECRET_KEY", hide_env_values = true)]
    secret_key: Option<String>,

    /// SQLite database file
    #[arg(long, env = "DATABASE_PATH")]
    database: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration
    let file_config = Config::load(&args.config)?;
    let from_file = file_config.is_some();
    let mut config = file_config.unwrap_or_default();
    config.apply_overrides(args.bind, args.port, args.secret_key, args.database);

    // Initialize logging
    init_logging(&config.logging);

    info!("Starting Quiz Server v{}", env!("CARGO_PKG_VERSION"));
    if from_file {
        info!("Loaded configuration from {}", args.config);
    } else {
        warn!("Config file not found at {}, using defaults", args.config);
    }

    // Create data directory
    let data_dir = Path::new(&config.database.path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty());
    if let Some(parent) = data_dir {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create data directory {:?}", parent))?;
    }

    // Initialize database
    let db_path = format!("sqlite:{}?mode=rwc", config.database.path);
    let db = Database::new(&db_path).await?;

    if let Some(seed) = &config.seed {
        seed_user(&db, seed).await?;
    }

    // Initialize JWT manager
    let secret = config.auth.secret();
    if secret.is_none() {
        warn!("No signing secret configured; logins and token checks will fail until SECRET_KEY is set");
    }
    let jwt = Arc::new(JwtManager::new(
        secret,
        chrono::Duration::minutes(config.auth.validated_token_ttl_minutes()),
    ));

    // Create application state
    let store: Arc<dyn UserStore> = Arc::new(db);
    let state = AppState::new(store, jwt);

    // Metrics are optional; the API works without a recorder
    let metrics_handle = match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(Arc::new(handle)),
        Err(e) => {
            warn!("Failed to install Prometheus recorder: {}", e);
            None
        }
    };

    // Create router
    let app = create_router(state, metrics_handle)
        .layer(cors_layer(
            &config.cors.allowed_origins,
            Duration::from_secs(config.cors.max_age_secs),
        ))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http());

    // Determine bind address
    let addr: SocketAddr =
        format!("{}:{}", config.server.bind_address, config.server.port).parse()?;

    info!("Listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Create the configured user if the database has no users yet
async fn seed_user(db: &Database, seed: &SeedUserConfig) -> Result<()> {
    if db.has_users().await? {
        return Ok(());
    }

    info!("Creating seed user {}", seed.username);
    let password_hash = quiz_auth::hash_password(&seed.password)?;
    db.insert_user(NewUser {
        username: seed.username.clone(),
        password_hash,
    })
    .await?;
    Ok(())
}

/// Initialize logging
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let registry = tracing_subscriber::registry().with(filter);
    if config.format == "json" {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    info!("Shutdown signal received");
}
