//! Resolve one query against the configured review store and print the
//! reply blocks the bot would send, separated by blank lines.
//!
//! Usage: `lookup "<course shortname>[, <university>]"`

use course_review_bot::{answer, store, BotConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let query = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if query.trim().is_empty() {
        anyhow::bail!("usage: lookup \"<course shortname>[, <university>]\"");
    }

    let cfg = BotConfig::load_default()?;
    let store = store::open(&cfg.store).await?;
    for block in answer(store.as_ref(), &query, cfg.store.limits()).await? {
        println!("{block}\n");
    }
    Ok(())
}
