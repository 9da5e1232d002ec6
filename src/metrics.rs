use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

fn describe_all() {
    describe_counter!("bot_updates_total", "Updates received from long polling.");
    describe_counter!("bot_requests_total", "Text messages handled as requests.");
    describe_counter!("bot_replies_sent_total", "Reply messages delivered.");
    describe_counter!("bot_send_failures_total", "Reply messages that failed to send.");
    describe_counter!("bot_poll_failures_total", "Failed getUpdates calls.");
    describe_counter!(
        "resolve_text_fallback_total",
        "Queries resolved through the text-search fallback."
    );
    describe_counter!("resolve_outcome_total", "Resolution outcomes by kind.");
    describe_histogram!("resolve_duration_ms", "Course resolution time in milliseconds.");
}

impl Metrics {
    /// Install the global Prometheus recorder. Once per process.
    pub fn init() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        describe_all();
        Ok(Self { handle })
    }

    pub fn from_handle(handle: PrometheusHandle) -> Self {
        Self { handle }
    }

    /// `/health` plus `/metrics` in the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new()
            .route("/health", get(|| async { "ok" }))
            .route(
                "/metrics",
                get(move || {
                    let h = handle.clone();
                    async move { h.render() }
                }),
            )
    }

    pub async fn serve(&self, addr: &str) -> Result<JoinHandle<()>> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("binding admin server on {addr}"))?;
        let router = self.router();
        tracing::info!(addr, "admin server listening");
        Ok(tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::warn!("admin server stopped: {e:#}");
            }
        }))
    }
}
