//! In-process fakes for the feed, store and chat boundaries.

use crate::db::{IncidentStore, MemoryStore, StoreError};
use crate::feed::{FeedError, IncidentFeed};
use crate::models::{ActiveIncident, Incident, StoredIncident};
use crate::notifier::{Notification, Notifier, NotifyError};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

pub fn incident(id: i64, incident_type: &str) -> Incident {
    Incident {
        id,
        incident_type: incident_type.to_string(),
        road: format!("Road {id}"),
        location: format!("Location {id}"),
        city: "Raleigh".to_string(),
        reason: "Vehicle crash".to_string(),
        severity: 2,
        latitude: 35.78,
        longitude: -78.64,
        ..Default::default()
    }
}

pub fn crash(id: i64) -> Incident {
    incident(id, "Vehicle Crash")
}

/// Wraps a [`MemoryStore`], recording calls and failing upserts for chosen ids.
#[derive(Default)]
pub struct RecordingStore {
    pub inner: MemoryStore,
    pub fail_upsert: HashSet<i64>,
    pub fail_clear: HashSet<i64>,
    pub fail_query: bool,
    upserts: Mutex<Vec<i64>>,
    clears: Mutex<Vec<i64>>,
}

impl RecordingStore {
    pub fn with_rows(rows: impl IntoIterator<Item = StoredIncident>) -> Self {
        Self {
            inner: MemoryStore::with_rows(rows),
            ..Default::default()
        }
    }

    pub fn upserts(&self) -> Vec<i64> {
        self.upserts.lock().unwrap().clone()
    }

    pub fn clears(&self) -> Vec<i64> {
        self.clears.lock().unwrap().clone()
    }
}

fn injected() -> StoreError {
    StoreError::Database(sqlx::Error::Protocol("injected failure".to_string()))
}

#[async_trait]
impl IncidentStore for RecordingStore {
    async fn upsert(&self, incident: &Incident) -> Result<(), StoreError> {
        self.upserts.lock().unwrap().push(incident.id);
        if self.fail_upsert.contains(&incident.id) {
            return Err(injected());
        }
        self.inner.upsert(incident).await
    }

    async fn active_in_category(&self, category: &str) -> Result<Vec<ActiveIncident>, StoreError> {
        if self.fail_query {
            return Err(injected());
        }
        self.inner.active_in_category(category).await
    }

    async fn mark_cleared(&self, id: i64) -> Result<(), StoreError> {
        self.clears.lock().unwrap().push(id);
        if self.fail_clear.contains(&id) {
            return Err(injected());
        }
        self.inner.mark_cleared(id).await
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub fail_with_status: Option<u16>,
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn failing(status: u16) -> Self {
        Self {
            fail_with_status: Some(status),
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn new_ids(&self) -> Vec<i64> {
        self.sent()
            .iter()
            .filter(|n| matches!(n, Notification::NewIncident { .. }))
            .map(Notification::incident_id)
            .collect()
    }

    pub fn cleared_ids(&self) -> Vec<i64> {
        self.sent()
            .iter()
            .filter(|n| matches!(n, Notification::Cleared(_)))
            .map(Notification::incident_id)
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(notification.clone());
        match self.fail_with_status {
            Some(status) => Err(NotifyError::Status(status)),
            None => Ok(()),
        }
    }
}

pub struct StaticFeed(pub Vec<Incident>);

#[async_trait]
impl IncidentFeed for StaticFeed {
    async fn fetch(&self) -> Result<Vec<Incident>, FeedError> {
        Ok(self.0.clone())
    }
}

/// Stands in for a feed that timed out at the gateway.
pub struct UnavailableFeed;

#[async_trait]
impl IncidentFeed for UnavailableFeed {
    async fn fetch(&self) -> Result<Vec<Incident>, FeedError> {
        Err(FeedError::Status {
            status: 504,
            url: "https://feed.invalid/incidents".to_string(),
        })
    }
}

pub struct GarbledFeed;

#[async_trait]
impl IncidentFeed for GarbledFeed {
    async fn fetch(&self) -> Result<Vec<Incident>, FeedError> {
        crate::feed::decode_incidents(b"<html>maintenance</html>")
    }
}
