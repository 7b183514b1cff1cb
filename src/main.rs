use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use kbase::app::{build_router, AppState};
use kbase::auth::login;
use kbase::config::AppConfig;
use kbase::db::article_repository::MongoArticleRepository;
use kbase::db::health::MongoHealth;
use kbase::db::section_repository::MongoSectionRepository;
use kbase::db::user_repository::MongoUserRepository;

/// Knowledge base HTTP server.
#[derive(Parser)]
#[command(name = "kbase", version, about)]
struct Cli {
    /// Path to an optional TOML settings file.
    #[arg(long, default_value = "kbase.toml")]
    config: PathBuf,
    /// Override the listen address (e.g. 127.0.0.1:8080).
    #[arg(long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kbase=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::load(&cli.config)
        .with_context(|| format!("Failed to load settings from {}", cli.config.display()))?;
    if let Some(listen) = cli.listen {
        config.listen_addr = listen;
    }

    tracing::info!("Starting kbase server...");

    let mongo_client = mongodb::Client::with_uri_str(&config.mongodb_uri)
        .await
        .context("Failed to connect to MongoDB")?;
    let mongo_db = mongo_client.database(&config.mongodb_database);

    let user_repo = MongoUserRepository::new(&mongo_db);
    user_repo
        .ensure_indexes()
        .await
        .context("Failed to create user indexes")?;

    tracing::info!(database = %config.mongodb_database, "Connected to MongoDB");

    let session_key = login::session_key(config.session_secret.as_deref())
        .context("Invalid session secret")?;

    let state = AppState {
        article_repo: Arc::new(MongoArticleRepository::new(&mongo_db)),
        section_repo: Arc::new(MongoSectionRepository::new(&mongo_db)),
        user_repo: Arc::new(user_repo),
        health: Arc::new(MongoHealth::new(&mongo_db)),
        session_cookie_secure: config.session_cookie_secure,
        session_key,
    };

    let app = build_router(state, config.cors_allow_any);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    tracing::info!("Listening on http://{}", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
