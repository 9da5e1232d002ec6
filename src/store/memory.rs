// src/store/memory.rs
use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use super::{ReviewFilter, ReviewRecord, ReviewStore};

/// In-memory review collection, loaded from the JSON array that
/// `mongoimport --jsonArray` consumes.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Vec<ReviewRecord>,
}

impl MemoryStore {
    pub fn from_records(records: Vec<ReviewRecord>) -> Self {
        Self { records }
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let records: Vec<ReviewRecord> =
            serde_json::from_str(s).context("parsing review export json")?;
        Ok(Self { records })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading review export from {}", path.display()))?;
        Self::from_json_str(&content)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Lowercased word tokens, the unit the text search matches on.
fn word_tokens(input: &str) -> HashSet<String> {
    static RE_WORD: OnceCell<Regex> = OnceCell::new();
    let re = RE_WORD.get_or_init(|| Regex::new(r"(?u)\b\w+\b").expect("word regex"));
    re.find_iter(input)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

#[async_trait::async_trait]
impl ReviewStore for MemoryStore {
    async fn count_exact(&self, filter: &ReviewFilter, cap: usize) -> Result<usize> {
        Ok(self
            .records
            .iter()
            .filter(|r| filter.matches(r))
            .take(cap)
            .count())
    }

    async fn text_search_names(&self, term: &str, limit: usize) -> Result<Vec<String>> {
        let terms = word_tokens(term);
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .records
            .iter()
            .filter(|r| !word_tokens(&r.course_name_short).is_disjoint(&terms))
            .take(limit)
            .map(|r| r.course_name_short.clone())
            .collect())
    }

    async fn find_reviews(&self, filter: &ReviewFilter) -> Result<Vec<ReviewRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
