use crate::db::IncidentStore;
use crate::ledger::NotifiedLedger;
use crate::models::Incident;
use crate::notifier::{display_start, Notification, Notifier};
use std::collections::HashSet;
use tracing::{error, info, warn};

/// Per-run counters, logged once the run completes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub matching: usize,
    pub upserted: usize,
    pub upsert_failures: usize,
    pub notified: usize,
    pub notify_failures: usize,
    pub notify_skipped: usize,
    pub cleared: usize,
    pub clear_failures: usize,
}

/// Diffs one feed snapshot against the store and the notified ledger.
#[derive(Debug, Clone)]
pub struct Reconciler {
    category: String,
    timezone: String,
}

impl Reconciler {
    pub fn new(category: impl Into<String>, timezone: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            timezone: timezone.into(),
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn filter<'a>(&self, snapshot: &'a [Incident]) -> Vec<&'a Incident> {
        snapshot
            .iter()
            .filter(|incident| incident.incident_type == self.category)
            .collect()
    }

    /// Runs the upsert, notify-new and clear passes in that order.
    ///
    /// Per-record failures are logged and counted; nothing here aborts the run.
    /// The ledger is returned with every newly announced id marked.
    pub async fn reconcile(
        &self,
        snapshot: &[Incident],
        mut ledger: NotifiedLedger,
        store: &dyn IncidentStore,
        notifier: &dyn Notifier,
    ) -> (NotifiedLedger, RunSummary) {
        let mut summary = RunSummary {
            total: snapshot.len(),
            ..Default::default()
        };

        // 1. Filter
        let current = self.filter(snapshot);
        summary.matching = current.len();
        info!(
            "Found {} total incidents, {} of which are {:?}.",
            summary.total, summary.matching, self.category
        );

        // 2. Upsert pass
        for incident in &current {
            match store.upsert(incident).await {
                Ok(()) => summary.upserted += 1,
                Err(e) => {
                    warn!("Error upserting incident {}: {}", incident.id, e);
                    summary.upsert_failures += 1;
                }
            }
        }
        info!(
            "Upserted {} incidents ({} failed).",
            summary.upserted, summary.upsert_failures
        );

        // 3. Notify-new pass
        for incident in &current {
            if ledger.contains(incident.id) {
                continue;
            }

            let started = match display_start(&incident.start_time, &self.timezone) {
                Ok(started) => started,
                Err(e) => {
                    // Left out of the ledger so the next run tries again.
                    warn!("Skipping alert for incident {}: {}", incident.id, e);
                    summary.notify_skipped += 1;
                    continue;
                }
            };

            info!("Found new incident (ID: {}). Sending notification...", incident.id);
            let notification = Notification::NewIncident {
                incident: (*incident).clone(),
                started,
            };
            // Delivery is best effort: the id is marked either way, so a failed
            // post is not repeated on the next run.
            match notifier.send(&notification).await {
                Ok(()) => summary.notified += 1,
                Err(e) => {
                    warn!("Notification for incident {} failed: {}", incident.id, e);
                    summary.notify_failures += 1;
                }
            }
            ledger.mark(incident.id);
        }

        // 4. Clear pass
        let current_ids: HashSet<i64> = current.iter().map(|incident| incident.id).collect();
        self.clear_missing(&current_ids, store, notifier, &mut summary)
            .await;

        (ledger, summary)
    }

    async fn clear_missing(
        &self,
        current_ids: &HashSet<i64>,
        store: &dyn IncidentStore,
        notifier: &dyn Notifier,
        summary: &mut RunSummary,
    ) {
        let active = match store.active_in_category(&self.category).await {
            Ok(active) => active,
            Err(e) => {
                error!("Could not query active incidents, skipping clear pass: {}", e);
                return;
            }
        };

        let to_clear: Vec<_> = active
            .into_iter()
            .filter(|stored| !current_ids.contains(&stored.id))
            .collect();

        if to_clear.is_empty() {
            info!("No old incidents to clear.");
            return;
        }

        info!("Found {} incidents to mark as cleared.", to_clear.len());
        for stored in to_clear {
            if let Err(e) = store.mark_cleared(stored.id).await {
                warn!("Error marking incident {} cleared: {}", stored.id, e);
                summary.clear_failures += 1;
                continue;
            }
            summary.cleared += 1;

            info!("Incident {} cleared. Sending notification...", stored.id);
            let id = stored.id;
            if let Err(e) = notifier.send(&Notification::Cleared(stored)).await {
                warn!("Cleared notification for incident {} failed: {}", id, e);
                summary.notify_failures += 1;
            }
        }
    }
}
