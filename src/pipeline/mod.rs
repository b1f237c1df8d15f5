pub mod classifier;
pub mod ports;
pub mod runner;

pub use classifier::SizeClassifier;
pub use ports::{ContentFetcher, FetchError, Notifier, NotifyError, SummarizeError, Summarizer};
pub use runner::PipelineRunner;
