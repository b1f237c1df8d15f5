//! Contracts of the services a run depends on. Implementations live in `web_content`,
//! `ai` and `telegram`; tests substitute in-memory stubs.

use futures::future::BoxFuture;
use thiserror::Error;

use crate::domain::PageContent;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("unsupported url: {0}")]
    UnsupportedUrl(String),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("server responded with status {0}")]
    Status(reqwest::StatusCode),
    #[error("could not extract readable content: {0}")]
    Extract(String),
}

#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("summarization request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("summarization response contained no summary")]
    EmptyResponse,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification channel is not configured: {0}")]
    NotConfigured(&'static str),
    #[error("failed to deliver chunk {chunk} of {total}: {source}")]
    Delivery {
        chunk: usize,
        total: usize,
        #[source]
        source: teloxide::RequestError,
    },
}

pub trait ContentFetcher: Send + Sync {
    /// Rendered title, meta description and plain-text body of the page at `url`.
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<PageContent, FetchError>>;
}

pub trait Summarizer: Send + Sync {
    fn summarize<'a>(&'a self, page: &'a PageContent) -> BoxFuture<'a, Result<String, SummarizeError>>;
}

pub trait Notifier: Send + Sync {
    /// Delivers plain text, applying whatever escaping and chunking the channel requires.
    fn deliver<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<(), NotifyError>>;
}
