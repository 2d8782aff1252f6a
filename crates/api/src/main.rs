// NexusQR API Server
// Main entry point for the multi-tenant QR and profile REST API

use anyhow::Context;
use dotenvy::dotenv;
use nexusqr_api::{build_app, config::Config, logging, AppState};
use nexusqr_database::Database;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    let config = Config::from_env().context("Failed to load configuration")?;
    logging::init(&config.logging, config.environment)?;

    tracing::info!("🚀 Starting {}", config.app_name);
    tracing::info!("📦 Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!("🌍 Environment: {}", config.environment.as_str());
    tracing::info!("🔌 Server: {}:{}", config.server_host, config.server_port);

    // Initialize database
    tracing::info!("🗄️  Connecting to database...");
    let database = Database::connect(config.database.clone())
        .await
        .context("Failed to connect to database")?;
    database.ping().await.context("Database ping failed")?;
    tracing::info!("✅ Database connected");

    if config.run_migrations {
        tracing::info!("📜 Running migrations...");
        database.migrate().await.context("Failed to run migrations")?;
        tracing::info!("✅ Migrations applied");
    }

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let docs_enabled = !config.is_production();
    let api_prefix = config.api_prefix.clone();

    let state = Arc::new(AppState::new(config, database.clone()));
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("✅ Server listening on http://{}{}", addr, api_prefix);
    if docs_enabled {
        tracing::info!("📚 OpenAPI document at http://{}/api-docs/openapi.json", addr);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    database.close().await;
    tracing::info!("👋 Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("🛑 Shutdown signal received"),
        Err(e) => {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
