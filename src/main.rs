mod ai;
mod app;
mod cli;
mod config;
mod domain;
mod infrastructure;
mod jobs;
mod pipeline;
mod store;
mod tasks;
mod telegram;
mod web_content;

use anyhow::Result;
use clap::Parser;
use infrastructure::{directories, logging};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = cli::Cli::parse();

    let config = config::load_config()?;
    let paths = directories::ensure_directories(&config.directories)?;
    logging::init_tracing(&config.logging, &paths.logs_dir)?;

    let app = app::BookmarkDigestApp::new(config, paths);
    app.execute(cli.command).await
}
