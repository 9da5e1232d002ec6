// src/request_log.rs
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Append-only, human-readable log of processed requests. Never read back.
#[derive(Debug, Clone)]
pub struct RequestLog {
    path: PathBuf,
}

impl RequestLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, ts: DateTime<Utc>, sender: &str, text: &str) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("creating log dir {}", dir.display()))?;
        }
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("opening request log {}", self.path.display()))?;
        f.write_all(format_line(ts, sender, text).as_bytes())
            .await
            .context("writing request log line")?;
        Ok(())
    }
}

/// `timestamp<TAB>sender<TAB>text`, newlines in the text flattened.
pub fn format_line(ts: DateTime<Utc>, sender: &str, text: &str) -> String {
    let flat = |s: &str| s.replace(['\r', '\n', '\t'], " ");
    format!(
        "{}\t{}\t{}\n",
        ts.to_rfc3339_opts(SecondsFormat::Secs, true),
        flat(sender),
        flat(text)
    )
}
