use crate::db::{IncidentStore, StoreError};
use crate::models::{ActiveIncident, Incident, StoredIncident};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Process-local store with the same upsert/clear semantics as the Postgres table.
///
/// Backs dry runs, where nothing may be written to the real database.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<BTreeMap<i64, StoredIncident>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<i64, StoredIncident>> {
        // A poisoned map is still a consistent map: every mutation is a single assignment.
        self.rows.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
impl MemoryStore {
    pub fn with_rows(rows: impl IntoIterator<Item = StoredIncident>) -> Self {
        let rows = rows
            .into_iter()
            .map(|row| (row.incident.id, row))
            .collect();
        Self {
            rows: Mutex::new(rows),
        }
    }

    pub fn get(&self, id: i64) -> Option<StoredIncident> {
        self.lock().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }
}

#[async_trait]
impl IncidentStore for MemoryStore {
    async fn upsert(&self, incident: &Incident) -> Result<(), StoreError> {
        self.lock()
            .entry(incident.id)
            .and_modify(|existing| existing.refresh(incident))
            .or_insert_with(|| StoredIncident::new(incident.clone()));
        Ok(())
    }

    async fn active_in_category(&self, category: &str) -> Result<Vec<ActiveIncident>, StoreError> {
        Ok(self
            .lock()
            .values()
            .filter(|row| row.is_active() && row.incident.incident_type == category)
            .map(StoredIncident::identity)
            .collect())
    }

    async fn mark_cleared(&self, id: i64) -> Result<(), StoreError> {
        if let Some(row) = self.lock().get_mut(&id) {
            row.clear(Utc::now());
        }
        Ok(())
    }
}
