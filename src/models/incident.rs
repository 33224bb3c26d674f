use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Deserializer};
use std::fmt;

/// One record of the NCDOT incidents feed.
///
/// The feed omits or nulls fields freely, so every field decodes `null` to its default.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Incident {
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub latitude: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub longitude: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub common_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub reason: String,
    #[serde(deserialize_with = "null_as_default")]
    pub condition: String,
    #[serde(deserialize_with = "null_as_default")]
    pub incident_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub severity: i32,
    #[serde(deserialize_with = "null_as_default")]
    pub direction: String,
    #[serde(deserialize_with = "null_as_default")]
    pub location: String,
    #[serde(deserialize_with = "null_as_default")]
    pub county_id: i32,
    #[serde(deserialize_with = "null_as_default")]
    pub county_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub city: String,
    #[serde(rename = "start")]
    pub start_time: FeedTimestamp,
    #[serde(rename = "end")]
    pub end_time: FeedTimestamp,
    pub last_update: FeedTimestamp,
    #[serde(deserialize_with = "null_as_default")]
    pub road: String,
    #[serde(deserialize_with = "null_as_default")]
    pub route_id: i32,
    #[serde(deserialize_with = "null_as_default")]
    pub lanes_closed: i32,
    #[serde(deserialize_with = "null_as_default")]
    pub lanes_total: i32,
    #[serde(deserialize_with = "null_as_default")]
    pub detour: String,
    #[serde(deserialize_with = "null_as_default")]
    pub cross_street_prefix: String,
    #[serde(deserialize_with = "null_as_default")]
    pub cross_street_number: i32,
    #[serde(deserialize_with = "null_as_default")]
    pub cross_street_suffix: String,
    #[serde(deserialize_with = "null_as_default")]
    pub cross_street_common_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub event: String,
    #[serde(deserialize_with = "null_as_default")]
    pub created_from_concurrent: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub movable_construction: String,
    #[serde(deserialize_with = "null_as_default")]
    pub work_zone_speed_limit: i32,
}

/// A feed timestamp. The feed usually sends RFC 3339, but nothing guarantees it.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedTimestamp {
    Parsed {
        instant: DateTime<FixedOffset>,
        raw: String,
    },
    Raw(String),
}

impl FeedTimestamp {
    pub fn parse(raw: &str) -> Self {
        match DateTime::parse_from_rfc3339(raw.trim()) {
            Ok(instant) => FeedTimestamp::Parsed {
                instant,
                raw: raw.to_string(),
            },
            Err(_) => FeedTimestamp::Raw(raw.to_string()),
        }
    }

    /// The text exactly as the feed sent it; this is what the store keeps.
    pub fn to_feed_string(&self) -> String {
        match self {
            FeedTimestamp::Parsed { raw, .. } | FeedTimestamp::Raw(raw) => raw.clone(),
        }
    }
}

impl Default for FeedTimestamp {
    fn default() -> Self {
        FeedTimestamp::Raw(String::new())
    }
}

impl<'de> Deserialize<'de> for FeedTimestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.map(|s| FeedTimestamp::parse(&s)).unwrap_or_default())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    let v: Option<T> = Option::deserialize(deserializer)?;
    Ok(v.unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncidentStatus {
    Active,
    Cleared,
}

impl IncidentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentStatus::Active => "active",
            IncidentStatus::Cleared => "cleared",
        }
    }
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity projection of a stored incident, all a cleared alert can report.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ActiveIncident {
    pub id: i64,
    pub road: String,
    pub location: String,
    pub city: String,
}

/// An incident as persisted: the feed record plus its lifecycle.
///
/// `status == Cleared` iff `cleared_at` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredIncident {
    pub incident: Incident,
    pub status: IncidentStatus,
    pub cleared_at: Option<DateTime<Utc>>,
}

impl StoredIncident {
    pub fn new(incident: Incident) -> Self {
        Self {
            incident,
            status: IncidentStatus::Active,
            cleared_at: None,
        }
    }

    /// Applies a re-reported incident. Only the mutable columns are refreshed;
    /// identity and creation fields keep their first-seen values.
    pub fn refresh(&mut self, incoming: &Incident) {
        let stored = &mut self.incident;
        stored.latitude = incoming.latitude;
        stored.longitude = incoming.longitude;
        stored.reason = incoming.reason.clone();
        stored.condition = incoming.condition.clone();
        stored.incident_type = incoming.incident_type.clone();
        stored.severity = incoming.severity;
        stored.end_time = incoming.end_time.clone();
        stored.last_update = incoming.last_update.clone();
        stored.lanes_closed = incoming.lanes_closed;
        stored.detour = incoming.detour.clone();

        self.status = IncidentStatus::Active;
        self.cleared_at = None;
    }

    pub fn clear(&mut self, at: DateTime<Utc>) {
        self.status = IncidentStatus::Cleared;
        self.cleared_at = Some(at);
    }

    pub fn is_active(&self) -> bool {
        debug_assert_eq!(
            self.status == IncidentStatus::Cleared,
            self.cleared_at.is_some()
        );
        self.status == IncidentStatus::Active
    }

    pub fn identity(&self) -> ActiveIncident {
        ActiveIncident {
            id: self.incident.id,
            road: self.incident.road.clone(),
            location: self.incident.location.clone(),
            city: self.incident.city.clone(),
        }
    }
}
