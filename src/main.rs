mod config;
mod db;
mod feed;
#[cfg(test)]
mod http_stub;
mod ledger;
mod models;
mod notifier;
mod processor;

use anyhow::Context;
use config::AppConfig;
use db::{IncidentStore, MemoryStore, PgIncidentStore};
use feed::HttpFeed;
use notifier::{DiscordNotifier, LoggingNotifier, Notifier};
use processor::Reconciler;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load config
    let config = AppConfig::load()?;

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(&config.log_level)
        .init();

    info!("Starting NCDOT crash alert run...");

    let feed = HttpFeed::new(&config.feed_url, config.http_timeout(), &config.http_user_agent)?;
    let reconciler = Reconciler::new(&config.incident_category, &config.display_timezone);

    let (store, notifier): (Box<dyn IncidentStore>, Box<dyn Notifier>) = if config.dry_run {
        info!("Dry run: database and webhook are not touched");
        (Box::new(MemoryStore::new()), Box::new(LoggingNotifier))
    } else {
        let webhook_url = config
            .webhook_url
            .as_deref()
            .context("WEBHOOK_URL must be set unless DRY_RUN is enabled")?;

        // Init DB
        let pool = db::init_pool(&config.database_url)
            .await
            .context("connecting to database")?;
        db::ensure_schema(&pool).await?;
        info!("Successfully connected to the database.");

        let notifier =
            DiscordNotifier::new(webhook_url, config.http_timeout(), &config.http_user_agent)?;
        (Box::new(PgIncidentStore::new(pool)), Box::new(notifier))
    };

    processor::run_once(
        &feed,
        store.as_ref(),
        notifier.as_ref(),
        &reconciler,
        &config.state_file,
        !config.dry_run,
    )
    .await?;

    Ok(())
}
