use crate::db::IncidentStore;
use crate::feed::IncidentFeed;
use crate::ledger::NotifiedLedger;
use crate::notifier::Notifier;
use crate::processor::{Reconciler, RunSummary};
use anyhow::Context;
use std::path::Path;
use tracing::{error, info};

/// One poll: load ledger, fetch, reconcile, persist ledger.
///
/// Ledger load and feed failures return before anything is written. A failed
/// ledger save is only logged; already-sent alerts repeat on the next run.
pub async fn run_once(
    feed: &dyn IncidentFeed,
    store: &dyn IncidentStore,
    notifier: &dyn Notifier,
    reconciler: &Reconciler,
    ledger_path: &Path,
    persist_ledger: bool,
) -> anyhow::Result<RunSummary> {
    let ledger = NotifiedLedger::load(ledger_path)
        .await
        .context("loading notified incidents")?;
    if ledger.is_empty() {
        info!("No notified incident ids recorded at {}", ledger_path.display());
    } else {
        info!(
            "Loaded {} notified incident ids from {}",
            ledger.len(),
            ledger_path.display()
        );
    }

    let snapshot = feed.fetch().await.context("fetching incident feed")?;

    let (ledger, summary) = reconciler
        .reconcile(&snapshot, ledger, store, notifier)
        .await;

    if persist_ledger {
        if let Err(e) = ledger.save(ledger_path).await {
            error!("Error saving notified incidents: {}", e);
        }
    } else {
        info!("Dry run: notified incidents not persisted");
    }

    info!(
        "Run complete: {} incidents, {} {:?}, {} upserted ({} failed), {} notified ({} failed, {} skipped), {} cleared ({} failed).",
        summary.total,
        summary.matching,
        reconciler.category(),
        summary.upserted,
        summary.upsert_failures,
        summary.notified,
        summary.notify_failures,
        summary.notify_skipped,
        summary.cleared,
        summary.clear_failures,
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::FeedError;
    use crate::models::StoredIncident;
    use crate::processor::testing::{
        crash, incident, GarbledFeed, RecordingNotifier, RecordingStore, StaticFeed,
        UnavailableFeed,
    };
    use tempfile::tempdir;

    fn reconciler() -> Reconciler {
        Reconciler::new("Vehicle Crash", "America/New_York")
    }

    #[tokio::test]
    async fn test_feed_failure_leaves_state_untouched() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("sent.json");
        std::fs::write(&path, "{\n  \"1\": true\n}").expect("write");
        let before = std::fs::read(&path).expect("read");

        let store = RecordingStore::with_rows([StoredIncident::new(crash(1))]);
        let notifier = RecordingNotifier::default();

        let err = run_once(&UnavailableFeed, &store, &notifier, &reconciler(), &path, true)
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<FeedError>(),
            Some(FeedError::Status { status: 504, .. })
        ));
        assert_eq!(std::fs::read(&path).expect("read"), before);
        assert!(store.upserts().is_empty());
        assert!(store.clears().is_empty());
        assert!(store.inner.get(1).unwrap().is_active());
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_undecodable_feed_is_fatal() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("sent.json");
        let store = RecordingStore::default();
        let notifier = RecordingNotifier::default();

        let err = run_once(&GarbledFeed, &store, &notifier, &reconciler(), &path, true)
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<FeedError>(),
            Some(FeedError::Decode(_))
        ));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_known_crash_is_refreshed_only() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("sent.json");
        std::fs::write(&path, r#"{"1": true}"#).expect("write");

        let store = RecordingStore::with_rows([StoredIncident::new(crash(1))]);
        let notifier = RecordingNotifier::default();
        let mut refreshed = crash(1);
        refreshed.lanes_closed = 2;
        let feed = StaticFeed(vec![refreshed, incident(2, "Road Closure")]);

        let summary = run_once(&feed, &store, &notifier, &reconciler(), &path, true)
            .await
            .expect("run");

        assert_eq!(store.upserts(), vec![1]);
        assert!(store.clears().is_empty());
        assert!(notifier.sent().is_empty());
        assert_eq!(store.inner.get(1).unwrap().incident.lanes_closed, 2);
        assert!(store.inner.get(2).is_none());
        assert_eq!(summary.total, 2);
        assert_eq!(summary.matching, 1);

        let ledger = NotifiedLedger::load(&path).await.expect("load");
        assert_eq!(ledger, [1].into_iter().collect::<NotifiedLedger>());
    }

    #[tokio::test]
    async fn test_ledger_persisted_between_runs() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("sent.json");
        let store = RecordingStore::default();
        let notifier = RecordingNotifier::default();
        let feed = StaticFeed(vec![crash(3), crash(9)]);

        for _ in 0..3 {
            run_once(&feed, &store, &notifier, &reconciler(), &path, true)
                .await
                .expect("run");
        }

        assert_eq!(notifier.new_ids(), vec![3, 9]);
        let ledger = NotifiedLedger::load(&path).await.expect("load");
        assert!(ledger.contains(3) && ledger.contains(9));
    }

    #[tokio::test]
    async fn test_dry_run_does_not_write_ledger() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("sent.json");
        let store = RecordingStore::default();
        let notifier = RecordingNotifier::default();

        run_once(&StaticFeed(vec![crash(3)]), &store, &notifier, &reconciler(), &path, false)
            .await
            .expect("run");

        assert_eq!(notifier.new_ids(), vec![3]);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_corrupt_ledger_is_fatal_before_fetch() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("sent.json");
        std::fs::write(&path, "not json").expect("write");
        let store = RecordingStore::default();
        let notifier = RecordingNotifier::default();

        let result = run_once(
            &StaticFeed(vec![crash(1)]),
            &store,
            &notifier,
            &reconciler(),
            &path,
            true,
        )
        .await;

        assert!(result.is_err());
        assert!(store.upserts().is_empty());
        assert_eq!(std::fs::read_to_string(&path).expect("read"), "not json");
    }
}
