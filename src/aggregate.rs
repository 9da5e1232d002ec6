//! # Aggregator
//! Pure score statistics over one course's review records. No I/O.

use crate::store::ReviewRecord;

pub const MAX_STARS: usize = 5;
pub const FILLED_STAR: char = '★';
pub const EMPTY_STAR: char = '☆';

#[derive(Debug, Clone, PartialEq)]
pub struct CourseStats {
    pub count: usize,
    pub average: f64,
    /// Rounded percentages, index 0 = one star .. index 4 = five stars.
    pub histogram: [u32; MAX_STARS],
}

impl CourseStats {
    /// Percentage for `stars` in 1..=5, 0 outside that range.
    pub fn percent_for(&self, stars: usize) -> u32 {
        match stars {
            1..=MAX_STARS => self.histogram[stars - 1],
            _ => 0,
        }
    }

    /// Average to one decimal, halves rounded away from zero ("4.25" -> "4.3").
    pub fn average_display(&self) -> String {
        format!("{:.1}", (self.average * 10.0).round() / 10.0)
    }

    /// Average rounded to whole stars.
    pub fn rounded_stars(&self) -> usize {
        (self.average.round().max(0.0) as usize).min(MAX_STARS)
    }
}

/// `None` for an empty record set.
pub fn compute_stats(records: &[ReviewRecord]) -> Option<CourseStats> {
    if records.is_empty() {
        return None;
    }
    let count = records.len();
    let sum: i64 = records.iter().map(|r| i64::from(r.score)).sum();
    let average = sum as f64 / count as f64;

    let mut tally = [0usize; MAX_STARS];
    for r in records {
        if let Some(slot) = usize::try_from(r.score)
            .ok()
            .filter(|s| (1..=MAX_STARS).contains(s))
        {
            tally[slot - 1] += 1;
        }
    }
    let histogram = tally.map(|n| (n as f64 * 100.0 / count as f64).round() as u32);

    Some(CourseStats {
        count,
        average,
        histogram,
    })
}

/// Five glyphs: `filled` filled ones, the rest empty. Clamped to 0..=5.
pub fn star_bar(filled: i64) -> String {
    let filled = filled.clamp(0, MAX_STARS as i64) as usize;
    let mut out = String::with_capacity(MAX_STARS * 3);
    out.extend(std::iter::repeat(FILLED_STAR).take(filled));
    out.extend(std::iter::repeat(EMPTY_STAR).take(MAX_STARS - filled));
    out
}

/// Records that carry written review text, in input order.
pub fn written_reviews(records: &[ReviewRecord]) -> impl Iterator<Item = &ReviewRecord> {
    records.iter().filter(|r| r.written_review().is_some())
}
