//! Blog API server binary.
//!
//! # Usage
//!
//! ```bash
//! # With config file
//! blogapi --config config.yaml
//!
//! # With environment variables only
//! BLOGAPI_STORAGE__BACKEND=postgres BLOGAPI_STORAGE__DATABASE_URL=postgres://... blogapi
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::signal;
use tracing::{info, warn, Level};

use blogapi_api::http::{
    create_router_with_observability, create_router_with_options, AppState, RouterOptions,
};
use blogapi_api::observability::{init_logging, init_metrics, LoggingConfig};
use blogapi_server::ServerConfig;
use blogapi_storage::{
    BlogStore, MemoryBlogStore, MySQLBlogStore, MySQLConfig, PostgresBlogStore, PostgresConfig,
};

/// Blog API - BlogPost and Comment REST service
#[derive(Parser, Debug)]
#[command(name = "blogapi")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match args.config {
        Some(config_path) => ServerConfig::load(&config_path)?,
        None => ServerConfig::from_env()?,
    };

    init_logging(LoggingConfig {
        json_format: config.logging.json,
        default_level: parse_log_level(&config.logging.level),
    });

    info!(version = env!("CARGO_PKG_VERSION"), "Starting blog API server");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    match config.storage.backend.as_str() {
        "memory" => {
            info!("Using in-memory storage backend");
            serve(Arc::new(MemoryBlogStore::new()), addr, &config).await
        }
        "postgres" => {
            let pg_config = PostgresConfig {
                database_url: database_url(&config)?,
                max_connections: config.storage.pool_size,
                connect_timeout_secs: config.storage.connection_timeout_secs,
                ..Default::default()
            };

            info!("Connecting to PostgreSQL database");
            let storage = PostgresBlogStore::from_config(&pg_config).await?;
            info!("Running database migrations");
            storage.run_migrations().await?;

            serve(Arc::new(storage), addr, &config).await
        }
        "mysql" => {
            let mysql_config = MySQLConfig {
                database_url: database_url(&config)?,
                max_connections: config.storage.pool_size,
                connect_timeout_secs: config.storage.connection_timeout_secs,
                ..Default::default()
            };

            info!("Connecting to MySQL database");
            let storage = MySQLBlogStore::from_config(&mysql_config).await?;
            info!("Running database migrations");
            storage.run_migrations().await?;

            serve(Arc::new(storage), addr, &config).await
        }
        other => anyhow::bail!("Unknown storage backend: {other}"),
    }
}

fn database_url(config: &ServerConfig) -> anyhow::Result<String> {
    config.storage.database_url.clone().ok_or_else(|| {
        anyhow::anyhow!(
            "storage.database_url is required for {} backend",
            config.storage.backend
        )
    })
}

/// Builds the router for `storage` and serves it until a shutdown signal.
async fn serve<S: BlogStore>(
    storage: Arc<S>,
    addr: SocketAddr,
    config: &ServerConfig,
) -> anyhow::Result<()> {
    let state = AppState::new(storage);
    let options = RouterOptions {
        request_timeout: Some(Duration::from_secs(config.server.request_timeout_secs)),
        cors: config.server.cors,
        metrics_path: config.metrics.path.clone(),
        ..Default::default()
    };
    let request_metrics = Arc::clone(&options.request_metrics);

    let router = if config.metrics.enabled {
        let metrics_state = init_metrics()?;
        info!(path = %options.metrics_path, "Metrics enabled");
        create_router_with_observability(state, metrics_state, options)
    } else {
        warn!("Metrics disabled");
        create_router_with_options(state, options)
    };

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    request_metrics.log_summary();
    info!("HTTP server shutdown complete");
    Ok(())
}

/// Waits for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown"),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown"),
    }
}

/// Parse log level from string.
fn parse_log_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}
