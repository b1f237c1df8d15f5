use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use url::Url;

#[derive(Debug, Parser)]
#[command(
    name = "bookmark-digest",
    version,
    about = "Summarize saved bookmarks and deliver the digest to Telegram"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Process eligible bookmarks once and deliver the report
    Run,
    /// Run the pipeline on the RUN_CRONS schedule until interrupted
    Serve,
    /// Save a URL for a future run
    Add { url: String },
    /// Delete a saved URL
    Remove { url: String },
    /// Show saved bookmarks
    List {
        #[arg(long)]
        json: bool,
    },
    /// Start a background summarization job for a PDF
    SummarizePdf { path: PathBuf },
}

/// Accepts only absolute http(s) URLs that the line-based store can represent.
pub fn validate_bookmark_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let url = match Url::parse(trimmed) {
        Ok(url) => url,
        Err(err) => bail!("invalid url {trimmed:?}: {err}"),
    };
    if !matches!(url.scheme(), "http" | "https") {
        bail!("only http and https bookmarks are supported: {trimmed}");
    }
    if trimmed.contains(',') {
        bail!("urls containing commas cannot be stored: {trimmed}");
    }
    Ok(trimmed.to_string())
}
