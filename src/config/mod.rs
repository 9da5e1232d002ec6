// src/config/mod.rs
pub mod bot;
pub mod credentials;

pub use bot::{BotConfig, StoreBackend, StoreConfig};
pub use credentials::Credentials;
