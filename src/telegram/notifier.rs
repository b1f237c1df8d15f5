use futures::{future::BoxFuture, FutureExt};
use teloxide::{prelude::*, types::ParseMode};

use crate::{
    config::TelegramConfig,
    pipeline::{Notifier, NotifyError},
};

use super::markdown::{escape_markdown_v2, split_chunks};

/// Delivers run reports to a single Telegram chat as MarkdownV2 messages.
pub struct TelegramNotifier {
    bot: Option<Bot>,
    chat_id: Option<ChatId>,
    max_message_length: usize,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig, max_message_length: usize) -> Self {
        Self {
            bot: config.bot_token.as_deref().map(Bot::new),
            chat_id: config.chat_id.map(ChatId),
            max_message_length,
        }
    }

    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        let bot = self
            .bot
            .as_ref()
            .ok_or(NotifyError::NotConfigured("TELEGRAM_BOT_TOKEN"))?;
        let chat_id = self
            .chat_id
            .ok_or(NotifyError::NotConfigured("TELEGRAM_CHAT_ID"))?;

        let escaped = escape_markdown_v2(text);
        let chunks = split_chunks(&escaped, self.max_message_length);
        let total = chunks.len();

        for (idx, chunk) in chunks.into_iter().enumerate() {
            bot.send_message(chat_id, chunk)
                .parse_mode(ParseMode::MarkdownV2)
                .await
                .map_err(|source| NotifyError::Delivery {
                    chunk: idx + 1,
                    total,
                    source,
                })?;
        }

        tracing::info!(target: "telegram", chat_id = chat_id.0, chunks = total, "report delivered");
        Ok(())
    }
}

impl Notifier for TelegramNotifier {
    fn deliver<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<(), NotifyError>> {
        self.send(text).boxed()
    }
}
