// src/telegram/mod.rs
//! Telegram Bot API surface the bot uses: `getUpdates` long polling and
//! `sendMessage`.

pub mod client;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;

pub use client::TelegramClient;

pub type ChatId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    /// Absent for stickers, photos and other non-text messages.
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: ChatId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub first_name: String,
}

impl Message {
    /// Display name for logs.
    pub fn sender_name(&self) -> &str {
        self.from
            .as_ref()
            .map(|u| u.first_name.as_str())
            .filter(|n| !n.is_empty())
            .unwrap_or("unknown")
    }
}

/// Envelope every Bot API method answers with.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    /// Block up to `timeout_secs` for updates with id >= `offset`.
    async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>>;

    /// Send one Markdown-formatted message.
    async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<()>;
}

// --- Test helper ---

/// Scripted transport: hands out queued batches, records every send.
/// Polling past the last queued batch is an error.
#[derive(Default)]
pub struct MockTransport {
    batches: Mutex<VecDeque<Result<Vec<Update>>>>,
    pub offsets: Mutex<Vec<i64>>,
    pub sent: Mutex<Vec<(ChatId, String)>>,
    pub fail_sends: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_batch(self, batch: Vec<Update>) -> Self {
        self.push(Ok(batch));
        self
    }

    pub fn with_poll_error(self, msg: &str) -> Self {
        self.push(Err(anyhow!("{msg}")));
        self
    }

    pub fn failing_sends(mut self) -> Self {
        self.fail_sends = true;
        self
    }

    fn push(&self, item: Result<Vec<Update>>) {
        self.batches
            .lock()
            .expect("mock batches poisoned")
            .push_back(item);
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .expect("mock sent poisoned")
            .iter()
            .map(|(_, t)| t.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl ChatTransport for MockTransport {
    async fn get_updates(&self, offset: i64, _timeout_secs: u64) -> Result<Vec<Update>> {
        self.offsets
            .lock()
            .expect("mock offsets poisoned")
            .push(offset);
        self.batches
            .lock()
            .expect("mock batches poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(anyhow!("mock transport exhausted")))
    }

    async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<()> {
        self.sent
            .lock()
            .expect("mock sent poisoned")
            .push((chat_id, text.to_string()));
        if self.fail_sends {
            return Err(anyhow!("mock send failure"));
        }
        Ok(())
    }
}

/// Text update from `first_name` in `chat_id`.
pub fn text_update(update_id: i64, chat_id: ChatId, first_name: &str, text: &str) -> Update {
    Update {
        update_id,
        message: Some(Message {
            chat: Chat { id: chat_id },
            from: Some(User {
                first_name: first_name.to_string(),
            }),
            text: Some(text.to_string()),
        }),
    }
}
