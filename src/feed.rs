use crate::models::Incident;
use anyhow::Context;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("feed returned http status {status} for {url}")]
    Status { status: u16, url: String },
    #[error("feed payload is not a JSON incident array: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Source of the current incident snapshot.
#[async_trait]
pub trait IncidentFeed: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Incident>, FeedError>;
}

pub struct HttpFeed {
    client: reqwest::Client,
    url: String,
}

impl HttpFeed {
    pub fn new(url: &str, timeout: Duration, user_agent: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("building feed http client")?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl IncidentFeed for HttpFeed {
    async fn fetch(&self) -> Result<Vec<Incident>, FeedError> {
        info!("Fetching incidents from {}", self.url);

        let resp = self.client.get(&self.url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                status: status.as_u16(),
                url: resp.url().to_string(),
            });
        }

        let body = resp.bytes().await?;
        decode_incidents(&body)
    }
}

pub fn decode_incidents(body: &[u8]) -> Result<Vec<Incident>, FeedError> {
    Ok(serde_json::from_slice(body)?)
}
