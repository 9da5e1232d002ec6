//! # Bot session
//! The poll → resolve → reply cycle.
//!
//! A `Session` is built once at startup and owns everything the cycle
//! touches: transport, store, update cursor, request log. Recoverable
//! outcomes (unparseable text, unknown course, ambiguous course) become
//! chat replies; store failures and a run of failed polls end the loop.

use anyhow::Result;
use chrono::Utc;
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::BotConfig;
use crate::cursor::UpdateCursor;
use crate::query::{parse_command, Command};
use crate::reply::{self, USAGE_HINT};
use crate::request_log::RequestLog;
use crate::resolve::{resolve, ResolveLimits};
use crate::store::ReviewStore;
use crate::telegram::{ChatId, ChatTransport, Update};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub poll_timeout_secs: u64,
    pub max_consecutive_poll_failures: u32,
    pub poll_error_pause: Duration,
    pub limits: ResolveLimits,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&BotConfig::default())
    }
}

impl From<&BotConfig> for SessionSettings {
    fn from(cfg: &BotConfig) -> Self {
        Self {
            poll_timeout_secs: cfg.poll_timeout_secs,
            max_consecutive_poll_failures: cfg.max_consecutive_poll_failures,
            poll_error_pause: Duration::from_millis(cfg.poll_error_pause_ms),
            limits: cfg.store.limits(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Empty batch, or a failed poll still under the failure limit.
    Idle,
    /// Number of updates handled from the batch.
    Processed(usize),
}

/// Reply blocks for one inbound text. Store errors propagate.
pub async fn answer(
    store: &dyn ReviewStore,
    text: &str,
    limits: ResolveLimits,
) -> Result<Vec<String>> {
    match parse_command(text) {
        Ok(Command::Help) => Ok(vec![USAGE_HINT.to_string()]),
        Ok(Command::Lookup(query)) => {
            let resolution = resolve(store, &query, limits).await?;
            Ok(reply::render(&resolution))
        }
        Err(e) => {
            debug!(error = %e, "query not understood");
            Ok(vec![USAGE_HINT.to_string()])
        }
    }
}

pub struct Session {
    transport: Arc<dyn ChatTransport>,
    store: Arc<dyn ReviewStore>,
    settings: SessionSettings,
    cursor: UpdateCursor,
    request_log: Option<RequestLog>,
    fallback_chat_id: Option<ChatId>,
    poll_failures: u32,
}

impl Session {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        store: Arc<dyn ReviewStore>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            transport,
            store,
            settings,
            cursor: UpdateCursor::new(),
            request_log: None,
            fallback_chat_id: None,
            poll_failures: 0,
        }
    }

    pub fn with_request_log(mut self, log: RequestLog) -> Self {
        self.request_log = Some(log);
        self
    }

    pub fn with_fallback_chat(mut self, chat_id: Option<ChatId>) -> Self {
        self.fallback_chat_id = chat_id;
        self
    }

    pub fn cursor(&self) -> UpdateCursor {
        self.cursor
    }

    /// One long poll plus handling of every update it returned.
    pub async fn poll_once(&mut self) -> Result<PollOutcome> {
        let offset = self.cursor.offset();
        let updates = match self
            .transport
            .get_updates(offset, self.settings.poll_timeout_secs)
            .await
        {
            Ok(u) => {
                self.poll_failures = 0;
                u
            }
            Err(e) => {
                self.poll_failures += 1;
                counter!("bot_poll_failures_total").increment(1);
                if self.poll_failures >= self.settings.max_consecutive_poll_failures {
                    return Err(e.context(format!(
                        "long poll failed {} times in a row",
                        self.poll_failures
                    )));
                }
                warn!(
                    offset,
                    failures = self.poll_failures,
                    "long poll failed: {e:#}"
                );
                tokio::time::sleep(self.settings.poll_error_pause).await;
                return Ok(PollOutcome::Idle);
            }
        };

        if updates.is_empty() {
            return Ok(PollOutcome::Idle);
        }
        counter!("bot_updates_total").increment(updates.len() as u64);

        let mut handled = 0usize;
        for up in &updates {
            // Advance first: a failing update must not come back on the next poll.
            self.cursor.observe(up.update_id);
            self.handle_update(up).await?;
            handled += 1;
        }
        Ok(PollOutcome::Processed(handled))
    }

    async fn handle_update(&self, up: &Update) -> Result<()> {
        let Some(msg) = &up.message else {
            debug!(update_id = up.update_id, "skipping update without message");
            return Ok(());
        };
        let chat_id = msg.chat.id;
        let Some(text) = msg.text.as_deref() else {
            debug!(update_id = up.update_id, chat_id, "message without text");
            self.send_all(chat_id, &[USAGE_HINT.to_string()]).await;
            return Ok(());
        };

        let sender = msg.sender_name();
        info!(update_id = up.update_id, chat_id, sender, text, "request");
        counter!("bot_requests_total").increment(1);
        if let Some(log) = &self.request_log {
            if let Err(e) = log.append(Utc::now(), sender, text).await {
                warn!("request log append failed: {e:#}");
            }
        }

        let replies = answer(self.store.as_ref(), text, self.settings.limits).await?;
        self.send_all(chat_id, &replies).await;
        Ok(())
    }

    /// Sends each block as its own message, in order. Failures are logged only.
    async fn send_all(&self, chat_id: ChatId, replies: &[String]) {
        for text in replies {
            match self.transport.send_message(chat_id, text).await {
                Ok(()) => counter!("bot_replies_sent_total").increment(1),
                Err(e) => {
                    counter!("bot_send_failures_total").increment(1);
                    warn!(chat_id, "sendMessage failed: {e:#}");
                }
            }
        }
    }

    /// Best-effort shutdown diagnostic to the fallback chat.
    pub async fn notify_fatal(&self, err: &anyhow::Error) {
        let Some(chat_id) = self.fallback_chat_id else {
            warn!("no fallback chat configured; shutdown notice not sent");
            return;
        };
        if let Err(e) = self
            .transport
            .send_message(chat_id, &reply::fatal_notice(err))
            .await
        {
            warn!(chat_id, "shutdown notice failed: {e:#}");
        }
    }
}

/// Poll until a fatal error, report it once to the fallback chat, return it.
pub async fn run(mut session: Session) -> Result<()> {
    info!(
        store = session.store.name(),
        poll_timeout_secs = session.settings.poll_timeout_secs,
        "bot polling started"
    );
    loop {
        if let Err(e) = session.poll_once().await {
            error!(offset = session.cursor.offset(), "fatal error, shutting down: {e:#}");
            session.notify_fatal(&e).await;
            return Err(e);
        }
    }
}
