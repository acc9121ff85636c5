use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::{ChatId, Recipient};
use tracing::{error, info, instrument};

use crate::error::WatchError;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, chat_id: &str, text: &str) -> Result<(), WatchError>;
}

#[derive(Clone)]
pub struct TelegramNotifier {
    bot: Bot,
}

impl fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramNotifier").finish_non_exhaustive()
    }
}

impl TelegramNotifier {
    pub fn new(token: &str, timeout: Duration) -> Result<Self, WatchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WatchError::Transport(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            bot: Bot::with_client(token, client),
        })
    }
}

/// Numeric ids address a chat directly; anything else (`@channel`) is a
/// public username.
pub fn recipient(chat_id: &str) -> Recipient {
    match chat_id.trim().parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) => Recipient::ChannelUsername(chat_id.trim().to_string()),
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, chat_id: &str, text: &str) -> Result<(), WatchError> {
        self.bot
            .send_message(recipient(chat_id), text)
            .await
            .map(|_| ())
            .map_err(|e| WatchError::NotificationSendFailure(e.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    Duplicate,
    Failed,
}

/// Remembers the last text that actually reached the chat and refuses to send
/// it again. A failed send leaves the memory untouched so the next cycle
/// retries.
#[derive(Debug, Default, Clone)]
pub struct NotifierGate {
    last_sent: Option<String>,
}

impl NotifierGate {
    pub fn last_sent(&self) -> Option<&str> {
        self.last_sent.as_deref()
    }

    #[instrument(skip_all)]
    pub async fn deliver(&mut self, notifier: &dyn Notifier, chat_id: &str, text: &str) -> Delivery {
        if self.last_sent.as_deref() == Some(text) {
            return Delivery::Duplicate;
        }
        match notifier.send(chat_id, text).await {
            Ok(()) => {
                info!("notification sent to telegram");
                self.last_sent = Some(text.to_string());
                Delivery::Sent
            }
            Err(err) => {
                error!(%err, "failed to send telegram notification");
                Delivery::Failed
            }
        }
    }
}
