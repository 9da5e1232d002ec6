// src/cursor.rs

/// In-memory long-poll offset. Never persisted: a restart starts from zero
/// and the server redelivers anything not yet acknowledged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateCursor {
    next: Option<i64>,
}

impl UpdateCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offset for the next poll: one past the highest id seen, or 0 if none.
    pub fn offset(&self) -> i64 {
        self.next.unwrap_or(0)
    }

    /// Advance past `update_id`. Never moves backwards.
    pub fn observe(&mut self, update_id: i64) {
        let candidate = update_id.saturating_add(1);
        self.next = Some(self.next.map_or(candidate, |n| n.max(candidate)));
    }

    pub fn has_seen_any(&self) -> bool {
        self.next.is_some()
    }
}
