use anyhow::Result;
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_FEED_URL: &str =
    "https://eapps.ncdot.gov/services/traffic-prod/v1/counties/92/incidents";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub feed_url: String,
    pub webhook_url: Option<String>,
    pub state_file: PathBuf,
    pub incident_category: String,
    pub display_timezone: String,
    pub http_timeout_secs: u64,
    pub http_user_agent: String,
    pub dry_run: bool,
    pub log_level: String,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        dotenv().ok();

        let db_host = env::var("DATABASE_HOST").unwrap_or_else(|_| "localhost".to_string());
        let db_port = env::var("DATABASE_PORT").unwrap_or_else(|_| "5432".to_string());
        let db_user = env::var("DATABASE_USERNAME").unwrap_or_else(|_| "postgres".to_string());
        let db_pwd = env::var("DATABASE_PASSWORD").unwrap_or_default();
        let db_name = env::var("DATABASE_NAME").unwrap_or_else(|_| "postgres".to_string());
        let db_sslmode = env::var("DATABASE_SSLMODE").unwrap_or_else(|_| "require".to_string());

        let database_url = format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            db_user, db_pwd, db_host, db_port, db_name, db_sslmode
        );

        let feed_url = env::var("FEED_URL").unwrap_or_else(|_| DEFAULT_FEED_URL.to_string());
        let webhook_url = env::var("WEBHOOK_URL").ok().filter(|v| !v.trim().is_empty());
        let state_file = env::var("STATE_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("sent_incidents_ncdot.json"));
        let incident_category =
            env::var("INCIDENT_CATEGORY").unwrap_or_else(|_| "Vehicle Crash".to_string());
        let display_timezone =
            env::var("DISPLAY_TIMEZONE").unwrap_or_else(|_| "America/New_York".to_string());
        let http_timeout_secs = env::var("HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .unwrap_or(30);
        let http_user_agent = env::var("HTTP_USER_AGENT").unwrap_or_else(|_| {
            format!("ncdot-crash-alerts/{}", env!("CARGO_PKG_VERSION"))
        });
        let dry_run = env::var("DRY_RUN")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            database_url,
            feed_url,
            webhook_url,
            state_file,
            incident_category,
            display_timezone,
            http_timeout_secs,
            http_user_agent,
            dry_run,
            log_level,
        })
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}
