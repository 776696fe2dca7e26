// Pulse API server

use anyhow::{Context, Result};
use pulse_api::{build_router, telemetry, LogService, ServerConfig, StorageConfig};
use pulse_storage::{InMemoryLogStore, PostgresLogStore};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Missing .env is fine; real environment variables always win
    dotenvy::dotenv().ok();

    let config = ServerConfig::from_env().context("Invalid server configuration")?;
    telemetry::init_tracing(config.log_format);

    info!("pulse-api starting...");

    let mut postgres: Option<Arc<PostgresLogStore>> = None;
    let service = match &config.storage {
        StorageConfig::Postgres { url } => {
            let store = PostgresLogStore::connect(url, &config.pool)
                .await
                .context("Failed to connect to database")?;
            info!(
                max_connections = config.pool.max_connections,
                "Connected to database"
            );

            if config.run_migrations {
                store
                    .migrate()
                    .await
                    .context("Failed to run database migrations")?;
                info!("Database migrations applied");
            }

            let store = Arc::new(store);
            postgres = Some(store.clone());
            LogService::from_store(store)
        }
        StorageConfig::InMemory => {
            warn!("DEV_MODE enabled: using in-memory store, data is lost on restart");
            LogService::from_store(Arc::new(InMemoryLogStore::new()))
        }
    };

    if !config.api_prefix.is_empty() {
        info!(prefix = %config.api_prefix, "API prefix configured");
    }
    if config.cors_origins.is_empty() {
        info!("CORS not configured (same-origin requests only)");
    } else {
        info!(origins = ?config.cors_origins, "CORS origins configured");
    }

    let app = build_router(
        Arc::new(service),
        &config.api_prefix,
        config.cors_origins.clone(),
    );

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;
    info!("HTTP server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(store) = postgres {
        store.close().await;
    }

    info!("Server shut down gracefully");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
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
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        },
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}
