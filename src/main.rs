// Entry point of the memorial moderation service.
//
// **Architecture Overview:**
// - `core/` = Moderation rules and the traits they depend on
// - `infra/` = Implementations of core traits (SQLite, files, Telegram)
// - `web/` = HTTP adapter (axum router and handlers)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Serve HTTP until shutdown is requested

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;
#[path = "web/web_layer.rs"]
mod web;

mod config;

use crate::config::{AppConfig, StorageBackend};
use crate::core::moderation::{MemorialStore, ModerationService, ModerationSettings, PhotoStore};
use crate::core::notifications::Notifier;
use crate::infra::moderation::{InMemoryMemorialStore, SqliteMemorialStore};
use crate::infra::notifications::{LogNotifier, TelegramClient};
use crate::infra::photos::{FilePhotoStore, InMemoryPhotoStore};
use crate::web::AppState;
use anyhow::Context;
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // RUST_LOG wins; otherwise info for everything
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // This is the "composition root" where we wire everything together.

    let (store, photos): (Box<dyn MemorialStore>, Box<dyn PhotoStore>) = match config.storage {
        StorageBackend::Sqlite => {
            let db_path = config.database_path();
            let store = SqliteMemorialStore::new(&db_path.to_string_lossy())
                .await
                .with_context(|| format!("Failed to open memorial database at {}", db_path.display()))?;
            tokio::fs::create_dir_all(config.photo_dir())
                .await
                .context("Failed to create photo directory")?;
            tracing::info!(database = %db_path.display(), "Using SQLite storage");
            (Box::new(store), Box::new(FilePhotoStore::new(config.photo_dir())))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, all memories are lost on restart");
            (
                Box::new(InMemoryMemorialStore::new()),
                Box::new(InMemoryPhotoStore::new()),
            )
        }
    };

    let notifier: Box<dyn Notifier> = match &config.telegram {
        Some(telegram) => {
            tracing::info!("Reviewer notifications go to Telegram");
            let mut client =
                TelegramClient::new(telegram.bot_token.clone(), telegram.chat_id.clone())
                    .context("Failed to create Telegram client")?;
            if let Some(base_url) = &telegram.api_base_url {
                client = client.with_base_url(base_url.as_str());
            }
            Box::new(client)
        }
        None => {
            tracing::info!("Telegram not configured, reviewer notifications are only logged");
            Box::new(LogNotifier)
        }
    };

    if config.master_key.is_none() {
        tracing::warn!("MASTER_KEY is not set, admin provisioning is disabled");
    }

    let settings = ModerationSettings {
        master_key: config.master_key.clone(),
        public_base_url: config.public_base_url.clone(),
    };
    let moderation = ModerationService::new(store, photos, notifier, settings);
    let app = web::router(AppState::new(moderation));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Signal received, starting graceful shutdown");
}
