use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use chrono::{NaiveDateTime, Utc};
use chrono_tz::Tz;
use futures::FutureExt;
use reqwest::Client;
use tokio::{sync::Mutex, time::timeout};

use crate::{
    ai::SummarizerClient,
    cli::{validate_bookmark_url, Command},
    config::AppConfig,
    domain::{AddOutcome, RunStats},
    infrastructure::{
        directories::ResolvedPaths,
        instance_guard::InstanceGuard,
        shutdown::{install_signal_handlers, Shutdown},
    },
    jobs::{PdfSummaryJob, PdfSummaryLauncher},
    pipeline::PipelineRunner,
    store::BookmarkStore,
    tasks::scheduler::{configure_run_jobs, RunCallback},
    telegram::TelegramNotifier,
    web_content::WebContentFetcher,
};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);
/// How long `serve` waits for an in-flight run to finish after the scheduler stops.
const RUN_DRAIN_TIMEOUT: Duration = Duration::from_secs(120);

pub struct BookmarkDigestApp {
    config: Arc<AppConfig>,
    paths: ResolvedPaths,
    store: Arc<BookmarkStore>,
}

impl BookmarkDigestApp {
    pub fn new(config: AppConfig, paths: ResolvedPaths) -> Self {
        let store = Arc::new(BookmarkStore::new(paths.bookmarks_path.clone()));
        Self {
            config: Arc::new(config),
            paths,
            store,
        }
    }

    pub async fn execute(&self, command: Command) -> Result<()> {
        match command {
            Command::Run => self.run_once().await.map(|_| ()),
            Command::Serve => self.serve().await,
            Command::Add { url } => self.add(&url),
            Command::Remove { url } => self.remove(&url),
            Command::List { json } => self.list(json),
            Command::SummarizePdf { path } => {
                let launcher = PdfSummaryLauncher::new(&self.config.jobs, &self.paths.logs_dir);
                let handle = launcher.submit(PdfSummaryJob { pdf_path: path })?;
                println!(
                    "started PDF summary job (pid {}), logging to {}",
                    handle.pid,
                    handle.log_path.display()
                );
                Ok(())
            }
        }
    }

    fn build_runner(&self) -> Result<PipelineRunner> {
        let http_client = Client::builder()
            .user_agent(format!("bookmark-digest/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        let fetcher = Arc::new(WebContentFetcher::new(
            http_client.clone(),
            self.config.web.clone(),
        ));
        let summarizer = Arc::new(SummarizerClient::new(
            http_client,
            self.config.summarizer.clone(),
        ));
        let notifier = Arc::new(TelegramNotifier::new(
            &self.config.telegram,
            self.config.pipeline.max_message_length,
        ));

        Ok(PipelineRunner::new(
            self.store.clone(),
            fetcher,
            summarizer,
            notifier,
            &self.config.pipeline,
        ))
    }

    async fn acquire_guard(&self) -> Result<InstanceGuard> {
        let data_dir = self.paths.data_dir.clone();
        tokio::task::spawn_blocking(move || InstanceGuard::acquire(&data_dir))
            .await
            .context("store lock task failed")?
    }

    async fn run_once(&self) -> Result<RunStats> {
        let _guard = self.acquire_guard().await?;
        let runner = self.build_runner()?;
        runner
            .run()
            .await
            .with_context(|| format!("run aborted: {}", self.store.path().display()))
    }

    async fn serve(&self) -> Result<()> {
        let _guard = self.acquire_guard().await?;
        let runner = Arc::new(self.build_runner()?);
        let in_progress = Arc::new(Mutex::new(()));
        let (shutdown, mut listener) = Shutdown::new();
        install_signal_handlers(&shutdown);

        let callback: RunCallback = {
            let in_progress = in_progress.clone();
            let stopping = shutdown.subscribe();
            Arc::new(move || {
                let runner = runner.clone();
                let in_progress = in_progress.clone();
                let stopping = stopping.clone();
                async move {
                    if stopping.is_triggered() {
                        tracing::debug!(target: "scheduler", "shutting down; run not started");
                        return;
                    }
                    let Ok(_running) = in_progress.try_lock() else {
                        tracing::warn!(target: "scheduler", "previous run still in progress; skipping");
                        return;
                    };
                    if let Err(err) = runner.run().await {
                        tracing::error!(target: "scheduler", error = %err, "scheduled run aborted");
                    }
                }
                .boxed()
            })
        };

        let mut scheduler = configure_run_jobs(&self.config.scheduler.cron_specs, callback).await?;
        tracing::info!(
            target: "lifecycle",
            store = %self.store.path().display(),
            "bookmark digest scheduler started"
        );

        listener.notified().await;

        match timeout(SHUTDOWN_TIMEOUT, scheduler.shutdown()).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                tracing::error!(target: "scheduler", ?err, "scheduler shutdown failed");
            }
            Err(_) => {
                tracing::warn!(
                    target: "scheduler",
                    "scheduler did not stop within {:?}",
                    SHUTDOWN_TIMEOUT
                );
            }
        }

        if timeout(RUN_DRAIN_TIMEOUT, in_progress.lock()).await.is_err() {
            tracing::warn!(
                target: "lifecycle",
                "in-flight run did not finish within {:?}; exiting anyway",
                RUN_DRAIN_TIMEOUT
            );
        }

        tracing::info!(target: "lifecycle", "bookmark digest stopped");
        Ok(())
    }

    fn add(&self, raw_url: &str) -> Result<()> {
        let url = validate_bookmark_url(raw_url)?;
        let date_added = local_now(&self.config.timezone);
        match self.store.add(&url, date_added)? {
            AddOutcome::Added => println!("added {url}"),
            AddOutcome::Duplicate => println!("{url} is already bookmarked"),
        }
        Ok(())
    }

    fn remove(&self, url: &str) -> Result<()> {
        if self.store.remove(url.trim())? {
            println!("removed {}", url.trim());
        } else {
            println!("{} was not bookmarked", url.trim());
        }
        Ok(())
    }

    fn list(&self, json: bool) -> Result<()> {
        let records = self.store.load()?;
        if json {
            println!("{}", serde_json::to_string_pretty(&records)?);
            return Ok(());
        }
        for record in records {
            let marker = if record.too_large { "too-large" } else { "pending" };
            println!(
                "{}  {:<9}  {}",
                record.date_added.format("%Y-%m-%d %H:%M:%S"),
                marker,
                record.url
            );
        }
        Ok(())
    }
}

fn local_now(timezone: &str) -> NaiveDateTime {
    let tz: Tz = timezone.parse().unwrap_or(chrono_tz::UTC);
    Utc::now().with_timezone(&tz).naive_local()
}
