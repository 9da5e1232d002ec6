// src/store/mod.rs
//! Review store: record model, query filter and the backend trait.
//!
//! The bot only ever reads from the store. Backends:
//! - `memory::MemoryStore`: a `mongoimport --jsonArray` export loaded into memory.
//! - `mongo::MongoStore`: the live MongoDB collection (feature `mongo`).

pub mod memory;
#[cfg(feature = "mongo")]
pub mod mongo;

use anyhow::Result;
use serde::Deserialize;
use std::sync::Arc;

use crate::config::{StoreBackend, StoreConfig};

/// Upvote/downvote pair. Stored documents carry both counters or neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Votes {
    pub up: u32,
    pub down: u32,
}

/// One stored course review.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawReview")]
pub struct ReviewRecord {
    pub course_name_short: String,
    pub university: String,
    pub score: i32,
    /// `None` when the document has no review text or an empty one.
    pub review: Option<String>,
    /// `None` unless both `upvotes` and `downvotes` are present.
    pub votes: Option<Votes>,
}

impl ReviewRecord {
    /// Review text if it contains anything besides whitespace.
    pub fn written_review(&self) -> Option<&str> {
        self.review.as_deref().filter(|r| !r.trim().is_empty())
    }
}

// Document shape as exported from the collection.
#[derive(Debug, Deserialize)]
struct RawReview {
    #[serde(rename = "courseNameShort", default)]
    course_name_short: String,
    #[serde(default)]
    university: String,
    score: i32,
    #[serde(default)]
    review: Option<String>,
    #[serde(default)]
    upvotes: Option<u32>,
    #[serde(default)]
    downvotes: Option<u32>,
}

impl From<RawReview> for ReviewRecord {
    fn from(raw: RawReview) -> Self {
        let votes = match (raw.upvotes, raw.downvotes) {
            (Some(up), Some(down)) => Some(Votes { up, down }),
            _ => None,
        };
        Self {
            course_name_short: raw.course_name_short,
            university: raw.university,
            score: raw.score,
            review: raw.review.filter(|r| !r.is_empty()),
            votes,
        }
    }
}

/// Exact-match filter: `courseNameShort == name` and, when set, `university == uni`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewFilter {
    pub course_name_short: String,
    pub university: Option<String>,
}

impl ReviewFilter {
    pub fn new(course_name_short: impl Into<String>, university: Option<String>) -> Self {
        Self {
            course_name_short: course_name_short.into(),
            university,
        }
    }

    pub fn matches(&self, rec: &ReviewRecord) -> bool {
        rec.course_name_short == self.course_name_short
            && self
                .university
                .as_deref()
                .map_or(true, |u| rec.university == u)
    }
}

/// Read-only access to the review collection.
#[async_trait::async_trait]
pub trait ReviewStore: Send + Sync {
    /// Number of records matching `filter`, counting at most `cap`.
    async fn count_exact(&self, filter: &ReviewFilter, cap: usize) -> Result<usize>;

    /// `courseNameShort` values of up to `limit` text-search hits for `term`.
    async fn text_search_names(&self, term: &str, limit: usize) -> Result<Vec<String>>;

    /// All records matching `filter`, in store order.
    async fn find_reviews(&self, filter: &ReviewFilter) -> Result<Vec<ReviewRecord>>;

    fn name(&self) -> &'static str;
}

/// Open the backend named in the config.
pub async fn open(cfg: &StoreConfig) -> Result<Arc<dyn ReviewStore>> {
    match cfg.backend {
        StoreBackend::Json => {
            let store = memory::MemoryStore::load(&cfg.json_path)?;
            tracing::info!(
                path = %cfg.json_path.display(),
                records = store.len(),
                "json review store loaded"
            );
            Ok(Arc::new(store))
        }
        #[cfg(feature = "mongo")]
        StoreBackend::Mongo => {
            let store =
                mongo::MongoStore::connect(&cfg.mongo_uri, &cfg.database, &cfg.collection).await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "mongo"))]
        StoreBackend::Mongo => Err(anyhow::anyhow!(
            "store backend `mongo` needs the `mongo` cargo feature"
        )),
    }
}
