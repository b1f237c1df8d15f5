use std::{panic::AssertUnwindSafe, sync::Arc};

use anyhow::{Context, Result};
use futures::FutureExt;

use crate::{
    config::PipelineConfig,
    domain::{RunReport, RunStats},
    store::{BookmarkStore, StoreError},
};

use super::{
    classifier::SizeClassifier,
    ports::{ContentFetcher, Notifier, Summarizer},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemOutcome {
    Summarized,
    Oversized,
    SummaryFailed,
    FetchFailed,
}

pub struct PipelineRunner {
    store: Arc<BookmarkStore>,
    fetcher: Arc<dyn ContentFetcher>,
    summarizer: Arc<dyn Summarizer>,
    notifier: Arc<dyn Notifier>,
    classifier: SizeClassifier,
    article_limit: usize,
}

impl PipelineRunner {
    pub fn new(
        store: Arc<BookmarkStore>,
        fetcher: Arc<dyn ContentFetcher>,
        summarizer: Arc<dyn Summarizer>,
        notifier: Arc<dyn Notifier>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            store,
            fetcher,
            summarizer,
            notifier,
            classifier: SizeClassifier::new(config.token_limit),
            article_limit: config.article_limit,
        }
    }

    /// Drains eligible bookmarks until the article limit is reached, then delivers the report.
    ///
    /// Only a store that cannot be loaded fails the run; every per-bookmark failure is logged
    /// and the loop moves on.
    pub async fn run(&self) -> Result<RunStats, StoreError> {
        let bookmarks = self.store.load()?;
        if bookmarks.is_empty() {
            tracing::info!(target: "pipeline", "no bookmarks to process");
            return Ok(RunStats::default());
        }

        tracing::info!(
            target: "pipeline",
            total = bookmarks.len(),
            limit = self.article_limit,
            "starting run"
        );

        let mut report = RunReport::new();
        let mut stats = RunStats::default();

        for bookmark in bookmarks {
            if stats.summarized >= self.article_limit {
                break;
            }
            if bookmark.too_large {
                continue;
            }

            let url = bookmark.url.as_str();
            let result = AssertUnwindSafe(self.process(url, &mut report))
                .catch_unwind()
                .await;

            match result {
                Ok(Ok(outcome)) => record(&mut stats, outcome),
                Ok(Err(err)) => {
                    stats.errored += 1;
                    tracing::error!(target: "pipeline", url = %url, error = ?err, "error processing bookmark");
                }
                Err(_) => {
                    stats.errored += 1;
                    tracing::error!(target: "pipeline", url = %url, "bookmark processing panicked");
                }
            }
        }

        self.deliver(&report).await;

        tracing::info!(
            target: "pipeline",
            summarized = stats.summarized,
            oversized = stats.oversized,
            summary_failed = stats.summary_failed,
            fetch_failed = stats.fetch_failed,
            errored = stats.errored,
            "run finished"
        );
        Ok(stats)
    }

    async fn process(&self, url: &str, report: &mut RunReport) -> Result<ItemOutcome> {
        tracing::info!(target: "pipeline", url = %url, "fetching bookmark");
        let page = match self.fetcher.fetch(url).await {
            Ok(page) => page,
            Err(err) => {
                tracing::warn!(target: "pipeline", url = %url, error = %err, "fetch failed; will retry next run");
                return Ok(ItemOutcome::FetchFailed);
            }
        };

        if self.classifier.is_oversized(&page.content) {
            tracing::info!(
                target: "pipeline",
                url = %url,
                tokens = SizeClassifier::estimate_tokens(&page.content),
                "content over token budget; flagging"
            );
            self.store
                .set_flag(url, true)
                .with_context(|| format!("failed to flag oversized bookmark {url}"))?;
            return Ok(ItemOutcome::Oversized);
        }

        let summary = match self.summarizer.summarize(&page).await {
            Ok(summary) => summary,
            Err(err) => {
                tracing::warn!(target: "pipeline", url = %url, error = %err, "summarization failed; flagging");
                self.store
                    .set_flag(url, true)
                    .with_context(|| format!("failed to flag unsummarizable bookmark {url}"))?;
                return Ok(ItemOutcome::SummaryFailed);
            }
        };

        report.push_summary(&page.title, url, &summary);
        self.store
            .remove(url)
            .with_context(|| format!("failed to remove summarized bookmark {url}"))?;
        tracing::info!(target: "pipeline", url = %url, "bookmark summarized");
        Ok(ItemOutcome::Summarized)
    }

    async fn deliver(&self, report: &RunReport) {
        let text = report.render();
        if let Err(err) = self.notifier.deliver(&text).await {
            tracing::warn!(
                target: "pipeline",
                error = %err,
                entries = report.len(),
                "failed to deliver run report"
            );
        }
    }
}

fn record(stats: &mut RunStats, outcome: ItemOutcome) {
    match outcome {
        ItemOutcome::Summarized => stats.summarized += 1,
        ItemOutcome::Oversized => stats.oversized += 1,
        ItemOutcome::SummaryFailed => stats.summary_failed += 1,
        ItemOutcome::FetchFailed => stats.fetch_failed += 1,
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, fs};

    use futures::future::BoxFuture;
    use parking_lot::Mutex;
    use tempfile::TempDir;

    use super::*;
    use crate::{
        domain::{types::NO_SUMMARIES_MESSAGE, PageContent},
        pipeline::ports::{FetchError, NotifyError, SummarizeError},
    };

    #[derive(Default)]
    struct StubFetcher {
        bodies: HashMap<String, String>,
        panics_on: Option<String>,
        calls: Mutex<Vec<String>>,
    }

    impl StubFetcher {
        fn with(pages: &[(&str, String)]) -> Self {
            Self {
                bodies: pages
                    .iter()
                    .map(|(url, body)| (url.to_string(), body.clone()))
                    .collect(),
                ..Default::default()
            }
        }
    }

    impl ContentFetcher for StubFetcher {
        fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<PageContent, FetchError>> {
            self.calls.lock().push(url.to_string());
            async move {
                if self.panics_on.as_deref() == Some(url) {
                    panic!("renderer crashed");
                }
                match self.bodies.get(url) {
                    Some(body) => Ok(PageContent {
                        title: format!("Title of {url}"),
                        meta_description: "No Description".to_string(),
                        content: body.clone(),
                    }),
                    None => Err(FetchError::Extract("navigation timeout".to_string())),
                }
            }
            .boxed()
        }
    }

    struct StubSummarizer {
        reply: Option<String>,
        fails_for: Option<String>,
        calls: Mutex<Vec<String>>,
    }

    impl StubSummarizer {
        fn replying(reply: Option<&str>) -> Self {
            Self {
                reply: reply.map(str::to_string),
                fails_for: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing_for(mut self, url: &str) -> Self {
            self.fails_for = Some(format!("Title of {url}"));
            self
        }
    }

    impl Summarizer for StubSummarizer {
        fn summarize<'a>(
            &'a self,
            page: &'a PageContent,
        ) -> BoxFuture<'a, Result<String, SummarizeError>> {
            self.calls.lock().push(page.title.clone());
            let reply = if self.fails_for.as_deref() == Some(page.title.as_str()) {
                Err(SummarizeError::EmptyResponse)
            } else {
                self.reply.clone().ok_or(SummarizeError::EmptyResponse)
            };
            async move { reply }.boxed()
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        fail: bool,
        delivered: Mutex<Vec<String>>,
    }

    impl Notifier for RecordingNotifier {
        fn deliver<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<(), NotifyError>> {
            self.delivered.lock().push(text.to_string());
            let result = if self.fail {
                Err(NotifyError::NotConfigured("TELEGRAM_CHAT_ID"))
            } else {
                Ok(())
            };
            async move { result }.boxed()
        }
    }

    struct Harness {
        _dir: TempDir,
        store: Arc<BookmarkStore>,
        fetcher: Arc<StubFetcher>,
        summarizer: Arc<StubSummarizer>,
        notifier: Arc<RecordingNotifier>,
        runner: PipelineRunner,
    }

    fn harness(
        contents: &str,
        fetcher: StubFetcher,
        summarizer: StubSummarizer,
        notifier: RecordingNotifier,
        article_limit: usize,
    ) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bookmarks.txt");
        fs::write(&path, contents).unwrap();

        let store = Arc::new(BookmarkStore::new(path));
        let fetcher = Arc::new(fetcher);
        let summarizer = Arc::new(summarizer);
        let notifier = Arc::new(notifier);
        let config = PipelineConfig {
            article_limit,
            ..PipelineConfig::default()
        };
        let runner = PipelineRunner::new(
            store.clone(),
            fetcher.clone(),
            summarizer.clone(),
            notifier.clone(),
            &config,
        );

        Harness {
            _dir: dir,
            store,
            fetcher,
            summarizer,
            notifier,
            runner,
        }
    }

    fn words(n: usize) -> String {
        vec!["lorem"; n].join(" ")
    }

    fn line(url: &str, too_large: bool) -> String {
        format!("{url},2024-03-01 09:15:00,{too_large}\n")
    }

    #[tokio::test]
    async fn short_page_is_summarized_and_removed() {
        let h = harness(
            &line("http://a.example", false),
            StubFetcher::with(&[("http://a.example", words(40))]),
            StubSummarizer::replying(Some("Short summary.")),
            RecordingNotifier::default(),
            1,
        );

        let stats = h.runner.run().await.unwrap();

        assert_eq!(stats.summarized, 1);
        assert!(h.store.load().unwrap().is_empty());
        let delivered = h.notifier.delivered.lock();
        assert_eq!(delivered.len(), 1);
        assert!(delivered[0].contains("(http://a.example)"));
        assert!(delivered[0].contains("Short summary."));
    }

    #[tokio::test]
    async fn oversized_page_is_flagged_without_summarizing() {
        let h = harness(
            &line("http://a.example", false),
            StubFetcher::with(&[("http://a.example", words(35_000))]),
            StubSummarizer::replying(Some("unused")),
            RecordingNotifier::default(),
            1,
        );

        let stats = h.runner.run().await.unwrap();

        assert_eq!(stats.oversized, 1);
        assert!(h.summarizer.calls.lock().is_empty());
        let records = h.store.load().unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].too_large);
        assert_eq!(*h.notifier.delivered.lock(), vec![NO_SUMMARIES_MESSAGE]);
    }

    #[tokio::test]
    async fn summarizer_failure_flags_and_keeps_bookmark() {
        let h = harness(
            &line("http://a.example", false),
            StubFetcher::with(&[("http://a.example", words(10))]),
            StubSummarizer::replying(None),
            RecordingNotifier::default(),
            1,
        );

        let stats = h.runner.run().await.unwrap();

        assert_eq!(stats.summary_failed, 1);
        let records = h.store.load().unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].too_large);
        assert_eq!(*h.notifier.delivered.lock(), vec![NO_SUMMARIES_MESSAGE]);
    }

    #[tokio::test]
    async fn summarizer_failure_moves_on_to_next_bookmark() {
        let contents = [line("http://a.example", false), line("http://b.example", false)].concat();
        let h = harness(
            &contents,
            StubFetcher::with(&[
                ("http://a.example", words(10)),
                ("http://b.example", words(10)),
            ]),
            StubSummarizer::replying(Some("Second summary.")).failing_for("http://a.example"),
            RecordingNotifier::default(),
            1,
        );

        let stats = h.runner.run().await.unwrap();

        assert_eq!(stats.summary_failed, 1);
        assert_eq!(stats.summarized, 1);
        assert_eq!(
            *h.summarizer.calls.lock(),
            vec!["Title of http://a.example", "Title of http://b.example"]
        );
        let records = h.store.load().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].url, "http://a.example");
        assert!(records[0].too_large);
        let delivered = h.notifier.delivered.lock();
        assert_eq!(delivered.len(), 1);
        assert!(delivered[0].contains("(http://b.example)"));
        assert!(delivered[0].contains("Second summary."));
        assert!(!delivered[0].contains("(http://a.example)"));
    }

    #[tokio::test]
    async fn run_stops_at_article_limit() {
        let contents = [
            line("http://a.example", false),
            line("http://b.example", false),
            line("http://c.example", false),
        ]
        .concat();
        let pages = [
            ("http://a.example", words(5)),
            ("http://b.example", words(5)),
            ("http://c.example", words(5)),
        ];
        let h = harness(
            &contents,
            StubFetcher::with(&pages),
            StubSummarizer::replying(Some("ok")),
            RecordingNotifier::default(),
            2,
        );

        let stats = h.runner.run().await.unwrap();

        assert_eq!(stats.summarized, 2);
        assert_eq!(*h.fetcher.calls.lock(), vec!["http://a.example", "http://b.example"]);
        let remaining: Vec<_> = h.store.load().unwrap().into_iter().map(|r| r.url).collect();
        assert_eq!(remaining, vec!["http://c.example"]);
    }

    #[tokio::test]
    async fn flagged_bookmarks_are_never_selected() {
        let contents = [line("http://a.example", true), line("http://b.example", false)].concat();
        let h = harness(
            &contents,
            StubFetcher::with(&[
                ("http://a.example", words(5)),
                ("http://b.example", words(5)),
            ]),
            StubSummarizer::replying(Some("ok")),
            RecordingNotifier::default(),
            5,
        );

        h.runner.run().await.unwrap();

        assert_eq!(*h.fetcher.calls.lock(), vec!["http://b.example"]);
        let records = h.store.load().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].url, "http://a.example");
        assert!(records[0].too_large);
    }

    #[tokio::test]
    async fn fetch_failure_leaves_flag_and_moves_on() {
        let contents = [line("http://down.example", false), line("http://b.example", false)].concat();
        let h = harness(
            &contents,
            StubFetcher::with(&[("http://b.example", words(5))]),
            StubSummarizer::replying(Some("ok")),
            RecordingNotifier::default(),
            1,
        );

        let stats = h.runner.run().await.unwrap();

        assert_eq!(stats.fetch_failed, 1);
        assert_eq!(stats.summarized, 1);
        let records = h.store.load().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].url, "http://down.example");
        assert!(!records[0].too_large);
    }

    #[tokio::test]
    async fn panicking_item_does_not_abort_run() {
        let contents = [line("http://boom.example", false), line("http://b.example", false)].concat();
        let mut fetcher = StubFetcher::with(&[("http://b.example", words(5))]);
        fetcher.panics_on = Some("http://boom.example".to_string());
        let h = harness(
            &contents,
            fetcher,
            StubSummarizer::replying(Some("ok")),
            RecordingNotifier::default(),
            1,
        );

        let stats = h.runner.run().await.unwrap();

        assert_eq!(stats.errored, 1);
        assert_eq!(stats.summarized, 1);
        let records = h.store.load().unwrap();
        assert_eq!(records.len(), 1);
        assert!(!records[0].too_large);
    }

    #[tokio::test]
    async fn corrupt_store_aborts_before_any_work() {
        let h = harness(
            "http://a.example,not-a-date\n",
            StubFetcher::with(&[("http://a.example", words(5))]),
            StubSummarizer::replying(Some("ok")),
            RecordingNotifier::default(),
            1,
        );

        let err = h.runner.run().await.unwrap_err();

        assert!(matches!(err, StoreError::Corrupt { .. }));
        assert!(h.fetcher.calls.lock().is_empty());
        assert!(h.notifier.delivered.lock().is_empty());
    }

    #[tokio::test]
    async fn delivery_failure_is_not_fatal() {
        let h = harness(
            &line("http://a.example", false),
            StubFetcher::with(&[("http://a.example", words(5))]),
            StubSummarizer::replying(Some("ok")),
            RecordingNotifier {
                fail: true,
                ..Default::default()
            },
            1,
        );

        let stats = h.runner.run().await.unwrap();

        assert_eq!(stats.summarized, 1);
        assert_eq!(h.notifier.delivered.lock().len(), 1);
    }

    #[tokio::test]
    async fn empty_store_sends_nothing() {
        let h = harness(
            "",
            StubFetcher::default(),
            StubSummarizer::replying(Some("ok")),
            RecordingNotifier::default(),
            1,
        );

        let stats = h.runner.run().await.unwrap();

        assert_eq!(stats, RunStats::default());
        assert!(h.notifier.delivered.lock().is_empty());
    }
}
