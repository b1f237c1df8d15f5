use futures::{future::BoxFuture, FutureExt};
use reqwest::Client;

use crate::{
    config::SummarizerConfig,
    domain::PageContent,
    pipeline::{SummarizeError, Summarizer},
};

use super::inference::{build_request, extract_summary, ChatCompletionResponse};

/// Chat-completions client for an OpenAI-compatible endpoint.
#[derive(Clone)]
pub struct SummarizerClient {
    http: Client,
    config: SummarizerConfig,
}

impl SummarizerClient {
    pub fn new(http: Client, config: SummarizerConfig) -> Self {
        Self { http, config }
    }

    async fn request_summary(&self, page: &PageContent) -> Result<String, SummarizeError> {
        let request = build_request(self.config.model.clone(), self.config.temperature, page);
        let mut builder = self.http.post(&self.config.api_url).json(&request);
        if let Some(api_key) = &self.config.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let completion: ChatCompletionResponse = builder
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let summary = extract_summary(completion)?;
        tracing::debug!(
            target: "summarizer",
            title = %page.title,
            chars = summary.chars().count(),
            "summary received"
        );
        Ok(summary)
    }
}

impl Summarizer for SummarizerClient {
    fn summarize<'a>(
        &'a self,
        page: &'a PageContent,
    ) -> BoxFuture<'a, Result<String, SummarizeError>> {
        self.request_summary(page).boxed()
    }
}
