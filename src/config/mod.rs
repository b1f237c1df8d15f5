pub mod env;
mod loader;

pub use env::{
    AppConfig, DirectoryConfig, JobConfig, LogRotation, LoggingConfig, PipelineConfig,
    SummarizerConfig, TelegramConfig, WebContentConfig,
};
pub use loader::load_config;
