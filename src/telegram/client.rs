use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use super::{ApiResponse, ChatId, ChatTransport, Update};

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Slack on top of the long-poll timeout before the HTTP request gives up.
const POLL_HTTP_MARGIN: Duration = Duration::from_secs(10);

pub const DEFAULT_SEND_TIMEOUT_SECS: u64 = 10;

#[derive(Clone)]
pub struct TelegramClient {
    base: String,
    token: String,
    client: Client,
    send_timeout: Duration,
}

#[derive(Serialize)]
struct GetUpdatesReq {
    offset: i64,
    timeout: u64,
    allowed_updates: [&'static str; 1],
}

#[derive(Serialize)]
struct SendMessageReq<'a> {
    chat_id: ChatId,
    text: &'a str,
    parse_mode: &'static str,
}

impl TelegramClient {
    pub fn new(token: String) -> Self {
        Self {
            base: DEFAULT_API_BASE.to_string(),
            token,
            client: Client::new(),
            send_timeout: Duration::from_secs(DEFAULT_SEND_TIMEOUT_SECS),
        }
    }

    pub fn with_api_base(mut self, base: &str) -> Self {
        self.base = base.trim_end_matches('/').to_string();
        self
    }

    pub fn with_send_timeout(mut self, secs: u64) -> Self {
        self.send_timeout = Duration::from_secs(secs);
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base, self.token, method)
    }

    // The token is part of the URL, so reqwest errors are stripped of it.
    async fn call<B: Serialize, T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<T> {
        let rsp = self
            .client
            .post(self.method_url(method))
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| e.without_url())
            .with_context(|| format!("telegram {method} request"))?;

        let status = rsp.status();
        let env: ApiResponse<T> = rsp
            .json()
            .await
            .map_err(|e| e.without_url())
            .with_context(|| format!("telegram {method} response (HTTP {status})"))?;

        if !env.ok {
            return Err(anyhow!(
                "telegram {method} failed (HTTP {status}): {}",
                env.description.unwrap_or_else(|| "no description".into())
            ));
        }
        env.result
            .ok_or_else(|| anyhow!("telegram {method} returned ok without result"))
    }
}

#[async_trait::async_trait]
impl ChatTransport for TelegramClient {
    async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        let req = GetUpdatesReq {
            offset,
            timeout: timeout_secs,
            allowed_updates: ["message"],
        };
        let timeout = Duration::from_secs(timeout_secs) + POLL_HTTP_MARGIN;
        self.call("getUpdates", &req, timeout).await
    }

    async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<()> {
        let req = SendMessageReq {
            chat_id,
            text,
            parse_mode: "Markdown",
        };
        let _sent: serde_json::Value = self.call("sendMessage", &req, self.send_timeout).await?;
        Ok(())
    }
}
