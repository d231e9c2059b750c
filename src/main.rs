use std::sync::Arc;
use std::time::Instant;
use anyhow::{Result, Context};
use chrono::Utc;
use crate::bot::GameSaleBot;
use crate::config::load_config;
use crate::notifier::EmailNotifier;
use crate::reddit::RedditApiClient;
use tracing_subscriber::EnvFilter;
use tracing::info;

mod bot;
mod config;
mod matcher;
mod models;
mod notifier;
mod reddit;
mod seen;

#[cfg(test)]
mod tests;

#[tokio::main]
async fn main() -> Result<()> {
    let start_time = Instant::now();

    // Load Configuration
    let app_settings = load_config()
        .with_context(|| "Failed to load configuration")?;

    // RUST_LOG takes precedence over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(app_settings.log_level.clone()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    info!("Configuration loaded successfully.");

    let reddit_client = RedditApiClient::new(&app_settings)
        .with_context(|| "Failed to create Reddit client")?;
    let email_notifier = EmailNotifier::new(&app_settings)
        .with_context(|| "Failed to create email notifier")?;

    let bot = GameSaleBot::new(
        Arc::new(reddit_client),
        Arc::new(email_notifier),
        Arc::new(app_settings),
    );

    let summary = bot.run_once(Utc::now()).await?;

    info!(
        "Run complete: fetched {}, unseen {}, matched {}, tracking {}",
        summary.fetched, summary.unseen, summary.matched, summary.tracked
    );
    info!("Execution time: {:.2} seconds", start_time.elapsed().as_secs_f64());

    Ok(())
}
