// src/lib.rs
// Public library surface for the bins and integration tests.

pub mod aggregate;
pub mod bot;
pub mod config;
pub mod cursor;
pub mod metrics;
pub mod query;
pub mod reply;
pub mod request_log;
pub mod resolve;
pub mod store;
pub mod telegram;

// ---- Re-exports for stable public API ----
pub use crate::bot::{answer, run, PollOutcome, Session, SessionSettings};
pub use crate::config::{BotConfig, Credentials};
pub use crate::resolve::{resolve, Resolution, ResolveLimits};
pub use crate::store::{ReviewFilter, ReviewRecord, ReviewStore};
pub use crate::telegram::{ChatTransport, TelegramClient};
