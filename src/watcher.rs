//! The poll loop: fetch, extract, format, notify, sleep.
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{ErrorKey, WatchError};
use crate::notifier::{Delivery, Notifier, NotifierGate};
use crate::practicum::HomeworkApi;
use crate::status::{extract_homework, parse_status};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Notified,
    Duplicate,
    NoUpdates,
    UnknownStatus(String),
    DeliveryFailed,
}

pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Everything the loop carries between cycles.
pub struct Watcher<A, N> {
    api: A,
    notifier: N,
    chat_id: String,
    retry: Duration,
    cursor: i64,
    messages: NotifierGate,
    last_error: Option<ErrorKey>,
    clock: fn() -> i64,
}

impl<A: HomeworkApi, N: Notifier> Watcher<A, N> {
    pub fn new(api: A, notifier: N, chat_id: impl Into<String>, retry: Duration) -> Self {
        Self {
            api,
            notifier,
            chat_id: chat_id.into(),
            retry,
            cursor: unix_now(),
            messages: NotifierGate::default(),
            last_error: None,
            clock: unix_now,
        }
    }

    /// Replace the time source; the cursor restarts from the new clock.
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self.cursor = clock();
        self
    }

    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    pub fn last_sent(&self) -> Option<&str> {
        self.messages.last_sent()
    }

    pub fn last_error(&self) -> Option<&ErrorKey> {
        self.last_error.as_ref()
    }

    pub async fn run_cycle(&mut self) -> Result<CycleOutcome, WatchError> {
        let response = self.api.homework_statuses(self.cursor).await?;
        let Some(record) = extract_homework(&response)? else {
            return Ok(CycleOutcome::NoUpdates);
        };
        let message = match parse_status(&record) {
            Ok(message) => message,
            Err(WatchError::UnknownStatusCode(code)) => {
                warn!(status = %code, "homework has an unknown review status");
                return Ok(CycleOutcome::UnknownStatus(code));
            }
            Err(err) => return Err(err),
        };
        let outcome = match self
            .messages
            .deliver(&self.notifier, &self.chat_id, &message)
            .await
        {
            Delivery::Sent => CycleOutcome::Notified,
            Delivery::Duplicate => {
                debug!("status unchanged since last notification");
                CycleOutcome::Duplicate
            }
            Delivery::Failed => CycleOutcome::DeliveryFailed,
        };
        Ok(outcome)
    }

    /// One full iteration minus the sleep. Failures are logged and reported
    /// to the chat at most once per distinct error; the cursor always moves.
    #[instrument(skip_all, fields(cursor = self.cursor))]
    pub async fn tick(&mut self) -> Result<CycleOutcome, WatchError> {
        let result = self.run_cycle().await;
        self.cursor = (self.clock)();
        match &result {
            Ok(outcome) => {
                debug!(?outcome, "cycle finished");
                self.last_error = None;
            }
            Err(err) => {
                error!(kind = err.kind().as_str(), %err, "watcher cycle failed");
                self.report_error(err).await;
            }
        }
        result
    }

    async fn report_error(&mut self, err: &WatchError) {
        let key = err.key();
        if self.last_error.as_ref() == Some(&key) {
            debug!("error already reported");
            return;
        }
        let text = format!("Сбой в работе программы: {}", err);
        match self.notifier.send(&self.chat_id, &text).await {
            Ok(()) => self.last_error = Some(key),
            Err(send_err) => error!(%send_err, "failed to report error to telegram"),
        }
    }

    pub async fn run(mut self) {
        info!(retry_secs = self.retry.as_secs(), "starting homework watcher");
        loop {
            let _ = self.tick().await;
            tokio::time::sleep(self.retry).await;
        }
    }
}
