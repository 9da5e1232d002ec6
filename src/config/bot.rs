// src/config/bot.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::resolve::{ResolveLimits, DEFAULT_EXACT_PROBE_LIMIT, DEFAULT_TEXT_SEARCH_LIMIT};
use crate::telegram::client::{DEFAULT_API_BASE, DEFAULT_SEND_TIMEOUT_SECS};

pub const ENV_BOT_CONFIG_PATH: &str = "BOT_CONFIG_PATH";
pub const DEFAULT_BOT_CONFIG_PATH: &str = "config/bot.toml";

// Telegram caps long polling at 50 seconds.
const MAX_POLL_TIMEOUT_SECS: u64 = 50;

fn default_poll_timeout_secs() -> u64 {
    30
}
fn default_max_consecutive_poll_failures() -> u32 {
    5
}
fn default_poll_error_pause_ms() -> u64 {
    1_000
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Mongo,
    Json,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub mongo_uri: String,
    pub database: String,
    pub collection: String,
    /// `mongoimport --jsonArray` export used by the `json` backend.
    pub json_path: PathBuf,
    pub exact_probe_limit: usize,
    pub text_search_limit: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Mongo,
            mongo_uri: "mongodb://localhost:27017/".to_string(),
            database: "test".to_string(),
            collection: "pybestande".to_string(),
            json_path: PathBuf::from("data/bestande_reviews.json"),
            exact_probe_limit: DEFAULT_EXACT_PROBE_LIMIT,
            text_search_limit: DEFAULT_TEXT_SEARCH_LIMIT,
        }
    }
}

impl StoreConfig {
    pub fn limits(&self) -> ResolveLimits {
        ResolveLimits {
            exact_probe: self.exact_probe_limit,
            text_search: self.text_search_limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Long-poll wait per `getUpdates` call. Clamped to 1..=50.
    pub poll_timeout_secs: u64,
    /// Consecutive failed polls tolerated before the bot gives up.
    pub max_consecutive_poll_failures: u32,
    pub poll_error_pause_ms: u64,
    /// HTTP timeout for each `sendMessage` call.
    pub send_timeout_secs: u64,
    pub api_base: String,
    pub request_log_path: PathBuf,
    /// `host:port` for `/health` + `/metrics`; admin server off when unset.
    pub admin_addr: Option<String>,
    pub store: StoreConfig,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            poll_timeout_secs: default_poll_timeout_secs(),
            max_consecutive_poll_failures: default_max_consecutive_poll_failures(),
            poll_error_pause_ms: default_poll_error_pause_ms(),
            send_timeout_secs: DEFAULT_SEND_TIMEOUT_SECS,
            api_base: DEFAULT_API_BASE.to_string(),
            request_log_path: PathBuf::from("logs/requests.log"),
            admin_addr: None,
            store: StoreConfig::default(),
        }
    }
}

impl BotConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: BotConfig = toml::from_str(s).context("parsing bot config toml")?;
        Ok(cfg.sanitized())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading bot config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Load using env var + fallbacks:
    /// 1) $BOT_CONFIG_PATH
    /// 2) config/bot.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_BOT_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("BOT_CONFIG_PATH points to non-existent path"));
            }
            return Self::load_from(&pb);
        }
        let fallback = PathBuf::from(DEFAULT_BOT_CONFIG_PATH);
        if fallback.exists() {
            return Self::load_from(&fallback);
        }
        Ok(Self::default())
    }

    fn sanitized(mut self) -> Self {
        if !(1..=MAX_POLL_TIMEOUT_SECS).contains(&self.poll_timeout_secs) {
            self.poll_timeout_secs = default_poll_timeout_secs();
        }
        if self.max_consecutive_poll_failures == 0 {
            self.max_consecutive_poll_failures = default_max_consecutive_poll_failures();
        }
        if self.send_timeout_secs == 0 {
            self.send_timeout_secs = DEFAULT_SEND_TIMEOUT_SECS;
        }
        if self.store.exact_probe_limit == 0 {
            self.store.exact_probe_limit = DEFAULT_EXACT_PROBE_LIMIT;
        }
        if self.store.text_search_limit == 0 {
            self.store.text_search_limit = DEFAULT_TEXT_SEARCH_LIMIT;
        }
        if self.api_base.trim().is_empty() {
            self.api_base = DEFAULT_API_BASE.to_string();
        }
        self.admin_addr = self
            .admin_addr
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());
        self
    }
}
