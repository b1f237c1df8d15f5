use serde::{Deserialize, Serialize};

pub const NO_SUMMARIES_MESSAGE: &str = "No summaries generated.";
const ENTRY_SEPARATOR_WIDTH: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContent {
    pub title: String,
    pub meta_description: String,
    pub content: String,
}

/// Formatted summaries of one run, in processing order.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    entries: Vec<String>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_summary(&mut self, title: &str, url: &str, summary: &str) {
        let separator = "-".repeat(ENTRY_SEPARATOR_WIDTH);
        self.entries
            .push(format!("[{title}]({url})\n\n{summary}\n{separator}"));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Text handed to the notifier: the joined entries, or the sentinel when nothing was summarized.
    pub fn render(&self) -> String {
        if self.entries.is_empty() {
            NO_SUMMARIES_MESSAGE.to_string()
        } else {
            self.entries.join("\n\n")
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub summarized: usize,
    pub oversized: usize,
    pub summary_failed: usize,
    pub fetch_failed: usize,
    pub errored: usize,
}
