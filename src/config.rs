// Runtime configuration, read once at startup from the environment
// (a `.env` file is loaded first if present).

use anyhow::{bail, Context};
use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_DATA_DIR: &str = "data";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// SQLite queue database plus photos on disk under the data directory.
    Sqlite,
    /// Everything in process memory; lost on restart.
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
    /// Self-hosted Bot API server; `None` means api.telegram.org.
    pub api_base_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub public_base_url: String,
    pub data_dir: PathBuf,
    pub storage: StorageBackend,
    pub master_key: Option<String>,
    pub telegram: Option<TelegramConfig>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bind_addr = var("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("BIND_ADDR must be a socket address like 0.0.0.0:3000")?;

        let public_base_url = var("PUBLIC_BASE_URL")
            .unwrap_or_else(|| DEFAULT_PUBLIC_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let data_dir = PathBuf::from(var("DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()));

        let storage = match var("STORAGE_BACKEND").as_deref() {
            None | Some("sqlite") => StorageBackend::Sqlite,
            Some("memory") => StorageBackend::Memory,
            Some(other) => bail!(
                "STORAGE_BACKEND must be `sqlite` or `memory`, got `{}`",
                other
            ),
        };

        let telegram = match (var("TELEGRAM_BOT_TOKEN"), var("TELEGRAM_CHAT_ID")) {
            (Some(bot_token), Some(chat_id)) => Some(TelegramConfig {
                bot_token,
                chat_id,
                api_base_url: var("TELEGRAM_API_URL"),
            }),
            (None, None) => None,
            _ => {
                tracing::warn!(
                    "Only one of TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID is set, notifications will only be logged"
                );
                None
            }
        };

        Ok(Self {
            bind_addr,
            public_base_url,
            data_dir,
            storage,
            master_key: var("MASTER_KEY"),
            telegram,
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("memorials.db")
    }

    pub fn photo_dir(&self) -> PathBuf {
        self.data_dir.join("photos")
    }
}
