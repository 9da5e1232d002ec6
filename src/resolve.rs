//! # Course Resolver
//! Maps a parsed query onto stored review records:
//! exact match first, then a text-search fallback that picks the most
//! frequent candidate shortname, then a university disambiguation check.

use anyhow::Result;
use metrics::{counter, histogram};
use std::collections::HashMap;

use crate::query::CourseQuery;
use crate::store::{ReviewFilter, ReviewRecord, ReviewStore};

pub const DEFAULT_EXACT_PROBE_LIMIT: usize = 100;
pub const DEFAULT_TEXT_SEARCH_LIMIT: usize = 500;

/// Result-count caps for the two store probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveLimits {
    pub exact_probe: usize,
    pub text_search: usize,
}

impl Default for ResolveLimits {
    fn default() -> Self {
        Self {
            exact_probe: DEFAULT_EXACT_PROBE_LIMIT,
            text_search: DEFAULT_TEXT_SEARCH_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCourse {
    pub shortname: String,
    /// The qualifier from the query, or the single university the records share.
    pub university: Option<String>,
    /// Original shortname when the text-search fallback replaced it.
    pub corrected_from: Option<String>,
    /// Store order, all from one university.
    pub records: Vec<ReviewRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    NotFound {
        shortname: String,
    },
    /// Records span several universities and the query named none.
    Ambiguous {
        shortname: String,
        universities: Vec<String>,
    },
    Found(ResolvedCourse),
}

impl Resolution {
    pub fn outcome_label(&self) -> &'static str {
        match self {
            Resolution::NotFound { .. } => "not_found",
            Resolution::Ambiguous { .. } => "ambiguous",
            Resolution::Found(_) => "found",
        }
    }
}

/// Most frequent value; ties go to the value seen first.
pub fn plurality(candidates: &[String]) -> Option<&str> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for c in candidates {
        *counts.entry(c.as_str()).or_default() += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for c in candidates {
        let n = counts[c.as_str()];
        match best {
            Some((_, bn)) if n <= bn => {}
            _ => best = Some((c.as_str(), n)),
        }
    }
    best.map(|(name, _)| name)
}

/// Distinct universities in first-seen order.
pub fn distinct_universities(records: &[ReviewRecord]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for r in records {
        if !out.iter().any(|u| u == &r.university) {
            out.push(r.university.clone());
        }
    }
    out
}

pub async fn resolve(
    store: &dyn ReviewStore,
    query: &CourseQuery,
    limits: ResolveLimits,
) -> Result<Resolution> {
    let t0 = std::time::Instant::now();
    let out = resolve_inner(store, query, limits).await;
    histogram!("resolve_duration_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    if let Ok(res) = &out {
        counter!("resolve_outcome_total", "outcome" => res.outcome_label()).increment(1);
    }
    out
}

async fn resolve_inner(
    store: &dyn ReviewStore,
    query: &CourseQuery,
    limits: ResolveLimits,
) -> Result<Resolution> {
    let mut filter = ReviewFilter::new(query.shortname.clone(), query.university.clone());
    let mut corrected_from = None;

    if store.count_exact(&filter, limits.exact_probe).await? == 0 {
        let candidates = store
            .text_search_names(&query.shortname, limits.text_search)
            .await?;
        counter!("resolve_text_fallback_total").increment(1);

        let Some(best) = plurality(&candidates) else {
            tracing::debug!(shortname = %query.shortname, "no exact match and no text-search candidates");
            return Ok(Resolution::NotFound {
                shortname: query.shortname.clone(),
            });
        };
        tracing::debug!(
            shortname = %query.shortname,
            resolved = best,
            candidates = candidates.len(),
            "text-search fallback"
        );
        if best != query.shortname {
            corrected_from = Some(query.shortname.clone());
        }
        filter.course_name_short = best.to_string();
    }

    let records = store.find_reviews(&filter).await?;
    if records.is_empty() {
        return Ok(Resolution::NotFound {
            shortname: filter.course_name_short,
        });
    }

    let universities = distinct_universities(&records);
    let university = match &query.university {
        Some(q) => Some(q.clone()),
        None if universities.len() == 1 => universities.into_iter().next(),
        None => {
            return Ok(Resolution::Ambiguous {
                shortname: filter.course_name_short,
                universities,
            })
        }
    };

    Ok(Resolution::Found(ResolvedCourse {
        shortname: filter.course_name_short,
        university,
        corrected_from,
        records,
    }))
}
