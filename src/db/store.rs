use crate::db::{queries, DbPool};
use crate::models::{ActiveIncident, Incident, IncidentStatus};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persistence boundary for incidents, keyed by feed identifier.
#[async_trait]
pub trait IncidentStore: Send + Sync {
    /// Inserts or refreshes the incident and forces it back to active.
    async fn upsert(&self, incident: &Incident) -> Result<(), StoreError>;

    async fn active_in_category(&self, category: &str) -> Result<Vec<ActiveIncident>, StoreError>;

    async fn mark_cleared(&self, id: i64) -> Result<(), StoreError>;
}

pub struct PgIncidentStore {
    pool: DbPool,
}

impl PgIncidentStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IncidentStore for PgIncidentStore {
    async fn upsert(&self, incident: &Incident) -> Result<(), StoreError> {
        sqlx::query(queries::UPSERT_INCIDENT)
            .bind(incident.id)
            .bind(incident.latitude)
            .bind(incident.longitude)
            .bind(&incident.common_name)
            .bind(&incident.reason)
            .bind(&incident.condition)
            .bind(&incident.incident_type)
            .bind(incident.severity)
            .bind(&incident.direction)
            .bind(&incident.location)
            .bind(incident.county_id)
            .bind(&incident.county_name)
            .bind(&incident.city)
            .bind(incident.start_time.to_feed_string())
            .bind(incident.end_time.to_feed_string())
            .bind(incident.last_update.to_feed_string())
            .bind(&incident.road)
            .bind(incident.route_id)
            .bind(incident.lanes_closed)
            .bind(incident.lanes_total)
            .bind(&incident.detour)
            .bind(&incident.cross_street_prefix)
            .bind(incident.cross_street_number)
            .bind(&incident.cross_street_suffix)
            .bind(&incident.cross_street_common_name)
            .bind(&incident.event)
            .bind(incident.created_from_concurrent)
            .bind(&incident.movable_construction)
            .bind(incident.work_zone_speed_limit)
            .bind(IncidentStatus::Active.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn active_in_category(&self, category: &str) -> Result<Vec<ActiveIncident>, StoreError> {
        let rows = sqlx::query_as::<_, ActiveIncident>(queries::SELECT_ACTIVE_BY_TYPE)
            .bind(IncidentStatus::Active.as_str())
            .bind(category)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn mark_cleared(&self, id: i64) -> Result<(), StoreError> {
        sqlx::query(queries::MARK_CLEARED)
            .bind(id)
            .bind(IncidentStatus::Cleared.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
