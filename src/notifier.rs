use crate::models::{ActiveIncident, FeedTimestamp, Incident};
use anyhow::Context;
use async_trait::async_trait;
use chrono_tz::Tz;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Renders as e.g. `Mon, Jan 2, 3:04 PM EST`.
const START_FORMAT: &str = "%a, %b %-d, %-I:%M %p %Z";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("webhook request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("webhook returned http status {0}")]
    Status(u16),
}

#[derive(Debug, Error)]
pub enum TimezoneError {
    #[error("unknown timezone {0:?}")]
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    NewIncident { incident: Incident, started: String },
    Cleared(ActiveIncident),
}

impl Notification {
    pub fn incident_id(&self) -> i64 {
        match self {
            Notification::NewIncident { incident, .. } => incident.id,
            Notification::Cleared(cleared) => cleared.id,
        }
    }

    pub fn render(&self) -> String {
        match self {
            Notification::NewIncident { incident, started } => format!(
                "🚨 **Vehicle Crash Alert** 🚨\n\n\
                 **Road:** {}\n\
                 **City:** {}\n\
                 **Location:** {}\n\
                 **Reason:** {}\n\
                 **Started:** {}\n\
                 **Map Link:** [View on Google Maps](https://www.google.com/maps?q={:.6},{:.6}&z=12)",
                incident.road,
                incident.city,
                incident.location,
                incident.reason,
                started,
                incident.latitude,
                incident.longitude,
            ),
            Notification::Cleared(cleared) => format!(
                "✅ **Incident Cleared** ✅\n\n\
                 **Road:** {}\n\
                 **Location:** {}\n\
                 **City:** {}",
                cleared.road, cleared.location, cleared.city,
            ),
        }
    }
}

/// Chat sink. Callers treat failures as non-fatal.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

#[derive(Serialize)]
struct WebhookBody<'a> {
    content: &'a str,
}

pub struct DiscordNotifier {
    client: reqwest::Client,
    webhook_url: String,
}

impl DiscordNotifier {
    pub fn new(webhook_url: &str, timeout: Duration, user_agent: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("building webhook http client")?;
        Ok(Self {
            client,
            webhook_url: webhook_url.to_string(),
        })
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let content = notification.render();
        let resp = self
            .client
            .post(&self.webhook_url)
            .json(&WebhookBody { content: &content })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status.as_u16()));
        }
        Ok(())
    }
}

/// Dry-run sink: logs what would have been posted.
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        info!(
            "[dry run] notification for incident {}:\n{}",
            notification.incident_id(),
            notification.render()
        );
        Ok(())
    }
}

/// Localizes an incident start time for display. Unparsed feed strings pass through as-is.
pub fn display_start(start: &FeedTimestamp, timezone: &str) -> Result<String, TimezoneError> {
    let tz: Tz = timezone
        .parse()
        .map_err(|_| TimezoneError::Unknown(timezone.to_string()))?;

    Ok(match start {
        FeedTimestamp::Parsed { instant, .. } => {
            instant.with_timezone(&tz).format(START_FORMAT).to_string()
        }
        FeedTimestamp::Raw(raw) => raw.clone(),
    })
}
