use log::{error, info, warn};
use teloxide::{prelude::*, types::ChatId};
use tokio::sync::mpsc;

use crate::execution::config::{env_required, ConfigError};
use crate::execution::Notifier;

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: i64,
}

impl TelegramConfig {
    pub fn load_from_env() -> Result<Self, ConfigError> {
        let bot_token = env_required("TELEGRAM_BOT_TOKEN")?;
        let raw_chat_id = env_required("TELEGRAM_CHAT_ID")?;
        let chat_id = raw_chat_id.trim().parse().map_err(|_| ConfigError::Invalid {
            key: "TELEGRAM_CHAT_ID",
            value: raw_chat_id.clone(),
        })?;

        Ok(Self { bot_token, chat_id })
    }
}

/// Sends swap status messages to a Telegram chat.
///
/// Messages are queued to a background task, so `send` never waits on the
/// Telegram API and delivery failures are only logged.
pub struct TelegramNotifier {
    sender: mpsc::UnboundedSender<String>,
}

impl TelegramNotifier {
    /// Must be called from within a tokio runtime.
    pub fn new(config: TelegramConfig) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(telegram_worker(config, receiver));
        Self { sender }
    }
}

impl Notifier for TelegramNotifier {
    fn send(&self, message: String) {
        if self.sender.send(message).is_err() {
            warn!("Telegram notifier channel closed, dropping message");
        }
    }
}

async fn telegram_worker(config: TelegramConfig, mut receiver: mpsc::UnboundedReceiver<String>) {
    let bot = Bot::new(&config.bot_token);
    let chat_id = ChatId(config.chat_id);
    info!("Telegram notifier started for chat_id: {}", config.chat_id);

    while let Some(message) = receiver.recv().await {
        if let Err(e) = bot.send_message(chat_id, message).await {
            error!("Error sending message: {}", e);
        }
    }

    info!("Telegram notifier worker shutting down");
}

/// Fallback when no chat is configured: status lines go to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, message: String) {
        info!("[notify] {}", message.replace('\n', " | "));
    }
}
