// src/config/credentials.rs
use anyhow::{anyhow, Context, Result};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::telegram::ChatId;

pub const ENV_TOKEN_PATH: &str = "BOT_TOKEN_PATH";
pub const ENV_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_FALLBACK_CHAT_ID: &str = "TELEGRAM_FALLBACK_CHAT_ID";
pub const DEFAULT_TOKEN_PATH: &str = "data/token.txt";

/// Bot token plus the chat that receives the shutdown diagnostic.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub fallback_chat_id: Option<ChatId>,
    pub token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("fallback_chat_id", &self.fallback_chat_id)
            .field("token_len", &self.token.len())
            .finish()
    }
}

fn parse_chat_id(raw: &str) -> Result<Option<ChatId>> {
    let t = raw.trim();
    if t.is_empty() {
        return Ok(None);
    }
    t.parse::<ChatId>()
        .map(Some)
        .with_context(|| format!("invalid fallback chat id {t:?}"))
}

impl Credentials {
    /// Two lines: fallback chat id, then the bot token.
    pub fn parse(content: &str) -> Result<Self> {
        let mut lines = content.lines();
        let fallback_chat_id = parse_chat_id(lines.next().unwrap_or_default())?;
        let token = lines.next().unwrap_or_default().trim().to_string();
        Ok(Self {
            fallback_chat_id,
            token,
        })
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading credentials from {}", path.display()))?;
        Self::parse(&content)
    }

    /// File from $BOT_TOKEN_PATH (or data/token.txt when it exists), then
    /// $TELEGRAM_FALLBACK_CHAT_ID / $TELEGRAM_BOT_TOKEN override its fields.
    /// A missing token is an error.
    pub fn load_default() -> Result<Self> {
        let mut creds = match std::env::var(ENV_TOKEN_PATH) {
            Ok(p) => Self::load_from(&PathBuf::from(p))?,
            Err(_) => {
                let fallback = PathBuf::from(DEFAULT_TOKEN_PATH);
                if fallback.exists() {
                    Self::load_from(&fallback)?
                } else {
                    Self {
                        fallback_chat_id: None,
                        token: String::new(),
                    }
                }
            }
        };

        if let Ok(raw) = std::env::var(ENV_FALLBACK_CHAT_ID) {
            creds.fallback_chat_id = parse_chat_id(&raw)?;
        }
        if let Ok(tok) = std::env::var(ENV_BOT_TOKEN) {
            let tok = tok.trim();
            if !tok.is_empty() {
                creds.token = tok.to_string();
            }
        }

        if creds.token.is_empty() {
            return Err(anyhow!(
                "missing bot token (set {ENV_BOT_TOKEN} or provide {DEFAULT_TOKEN_PATH})"
            ));
        }
        Ok(creds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_two_line_file() {
        let c = Credentials::parse("-100123\n  123:abc \n").unwrap();
        assert_eq!(c.fallback_chat_id, Some(-100123));
        assert_eq!(c.token, "123:abc");
    }

    #[test]
    fn blank_chat_line_means_no_fallback() {
        let c = Credentials::parse("\n123:abc").unwrap();
        assert_eq!(c.fallback_chat_id, None);
        assert_eq!(c.token, "123:abc");
    }

    #[test]
    fn rejects_non_numeric_chat() {
        assert!(Credentials::parse("@channel\n123:abc").is_err());
    }

    #[test]
    fn debug_hides_token() {
        let c = Credentials::parse("1\nsecret-token").unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("secret-token"));
        assert!(dbg.contains("token_len: 12"));
    }
}
