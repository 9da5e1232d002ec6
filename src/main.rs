//! Course review bot: binary entrypoint.
//! Loads config and credentials, opens the review store, optionally starts
//! the admin server, then long-polls Telegram until a fatal error.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use course_review_bot::metrics::Metrics;
use course_review_bot::request_log::RequestLog;
use course_review_bot::{
    bot, store, BotConfig, Credentials, Session, SessionSettings, TelegramClient,
};

/// Compact logs by default, JSON lines with LOG_FORMAT=json.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("course_review_bot=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // No-op when there is no .env file.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = BotConfig::load_default()?;
    let creds = Credentials::load_default()?;
    info!(
        fallback_chat = ?creds.fallback_chat_id,
        token_len = creds.token.len(),
        store = ?cfg.store.backend,
        "config loaded"
    );

    let store = store::open(&cfg.store).await?;

    let _admin = match &cfg.admin_addr {
        Some(addr) => Some(Metrics::init()?.serve(addr).await?),
        None => None,
    };

    let transport = Arc::new(
        TelegramClient::new(creds.token.clone())
            .with_api_base(&cfg.api_base)
            .with_send_timeout(cfg.send_timeout_secs),
    );
    let session = Session::new(transport, store, SessionSettings::from(&cfg))
        .with_request_log(RequestLog::new(&cfg.request_log_path))
        .with_fallback_chat(creds.fallback_chat_id);

    bot::run(session).await
}
