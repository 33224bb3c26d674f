pub mod incident;

pub use incident::{ActiveIncident, FeedTimestamp, Incident, IncidentStatus, StoredIncident};
