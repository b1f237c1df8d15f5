pub mod bookmarks;
mod format;

use std::{io, path::PathBuf};

use thiserror::Error;

pub use bookmarks::BookmarkStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access bookmark store {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("corrupt bookmark store at line {line}: {content:?}")]
    Corrupt { line: usize, content: String },
    #[error("url contains a comma and cannot be stored: {0}")]
    UnsupportedUrl(String),
}
