use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookmarkRecord {
    pub url: String,
    pub date_added: NaiveDateTime,
    /// Set when a bookmark was oversized or its summary failed. Never cleared by a run.
    pub too_large: bool,
}

impl BookmarkRecord {
    pub fn new(url: impl Into<String>, date_added: NaiveDateTime) -> Self {
        Self {
            url: url.into(),
            date_added,
            too_large: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    Duplicate,
}
