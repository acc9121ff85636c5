use anyhow::{Context, Result};
use clap::Parser;
use reqwest::Url;
use tracing::info;

use homework_watchbot::config::{self, Credentials, Settings};
use homework_watchbot::logging;
use homework_watchbot::notifier::TelegramNotifier;
use homework_watchbot::practicum::PracticumClient;
use homework_watchbot::watcher::Watcher;

#[tokio::main]
async fn main() -> Result<()> {
    // The env file has to be in place before clap reads its env fallbacks.
    let env_file = config::env_file_from_args(std::env::args_os());
    config::load_env_file(env_file.as_ref())?;
    let settings = Settings::parse();
    settings.validate()?;
    logging::init(&settings).context("failed to open log file")?;

    let credentials = Credentials::from_env();
    credentials.check_tokens();
    if settings.strict_credentials {
        credentials.require()?;
    }

    let endpoint = Url::parse(&settings.endpoint).context("invalid endpoint URL")?;
    let api = PracticumClient::with_base_url(
        credentials.practicum_token().to_string(),
        endpoint,
        settings.request_timeout(),
    )?;
    let notifier = TelegramNotifier::new(credentials.telegram_token(), settings.request_timeout())?;

    info!(endpoint = %settings.endpoint, "homework watcher configured");
    Watcher::new(
        api,
        notifier,
        credentials.telegram_chat_id(),
        settings.retry_interval(),
    )
    .run()
    .await;
    Ok(())
}
