pub mod markdown;
mod notifier;

pub use notifier::TelegramNotifier;
