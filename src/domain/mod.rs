pub mod bookmark;
pub mod types;

pub use bookmark::{AddOutcome, BookmarkRecord};
pub use types::{PageContent, RunReport, RunStats};
