// src/reply.rs
//! Reply formatter. Every returned block is sent as its own chat message,
//! in order, with Telegram legacy Markdown parse mode.

use crate::aggregate::{compute_stats, star_bar, written_reviews, MAX_STARS};
use crate::resolve::{ResolvedCourse, Resolution};
use crate::store::ReviewRecord;

pub const USAGE_HINT: &str = "*Command not understood. Please try again.*\n\
Request format: `<course shortname>` or `<course shortname>, <university>`";

pub const NOT_FOUND: &str = "*No reviews found. Check the course name or deal with it.*";

/// Escape the characters legacy Markdown treats as entity delimiters.
/// Escapes only hold outside an entity, so the result must never be placed
/// between `*` or `_` delimiters.
pub fn escape_markdown(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if matches!(ch, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

// Code spans cannot escape a backtick, so drop it.
fn code_span(s: &str) -> String {
    format!("`{}`", s.replace('`', ""))
}

pub fn render(resolution: &Resolution) -> Vec<String> {
    match resolution {
        Resolution::NotFound { .. } => vec![NOT_FOUND.to_string()],
        Resolution::Ambiguous {
            shortname,
            universities,
        } => vec![disambiguation(shortname, universities)],
        Resolution::Found(course) => found(course),
    }
}

pub fn disambiguation(shortname: &str, universities: &[String]) -> String {
    let names = universities
        .iter()
        .map(|u| escape_markdown(u))
        .collect::<Vec<_>>()
        .join(" and ");
    let mut msg = format!(
        "{} exists at {names}. *Please specify the university:*",
        escape_markdown(shortname)
    );
    for u in universities {
        msg.push('\n');
        msg.push_str(&code_span(&format!("{shortname}, {u}")));
    }
    msg
}

fn found(course: &ResolvedCourse) -> Vec<String> {
    let Some(stats) = compute_stats(&course.records) else {
        return vec![NOT_FOUND.to_string()];
    };

    let mut summary = String::new();
    if let Some(orig) = &course.corrected_from {
        summary.push_str(&format!(
            "_No exact match for_ {}_, showing_ {} _instead._\n",
            escape_markdown(orig),
            escape_markdown(&course.shortname)
        ));
    }
    let title = match &course.university {
        Some(u) => format!("{} ({})", course.shortname, u),
        None => course.shortname.clone(),
    };
    summary.push_str(&format!(
        "*Here's the reviews for* {}:\n{} {} / 5 ({} {})\n",
        escape_markdown(&title),
        star_bar(stats.rounded_stars() as i64),
        stats.average_display(),
        stats.count,
        if stats.count == 1 { "review" } else { "reviews" }
    ));
    for stars in (1..=MAX_STARS).rev() {
        summary.push_str(&format!("\n{stars}★ {:>3}%", stats.percent_for(stars)));
    }

    let mut out = Vec::with_capacity(1 + course.records.len());
    out.push(summary);
    out.extend(written_reviews(&course.records).map(review_block));
    out
}

/// Star bar, optional vote suffix, then the review text.
pub fn review_block(rec: &ReviewRecord) -> String {
    let mut msg = star_bar(i64::from(rec.score));
    if let Some(v) = rec.votes {
        msg.push_str(&format!("\t\t\t{} 👍  {} 👎", v.up, v.down));
    }
    msg.push_str("\n\n");
    msg.push_str(&escape_markdown(rec.written_review().unwrap_or_default()));
    msg
}

pub fn fatal_notice(err: &anyhow::Error) -> String {
    format!(
        "I encountered an error. Shutting down. Error: {}",
        escape_markdown(&format!("{err:#}"))
    )
}
