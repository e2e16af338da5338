// src/pipeline/tick.rs

//! One fetch → parse → diff → notify pass.
//!
//! The snapshot is read once before it is replaced, so the diff is always
//! "stored state vs. this tick's parse". Fetch, parse and store failures end
//! the tick before `replace_all`, leaving the stored snapshot untouched. A
//! delivery failure ends the tick after `replace_all`; the new snapshot
//! stays.

use std::sync::Arc;

use serde::Serialize;

use crate::error::Result;
use crate::models::Config;
use crate::pipeline::diff::calculate_diff;
use crate::services::{
    DeliveryReceipt, Fetcher, LogNotifier, MessageComposer, MessengerNotifier, Notify, PageSource,
    SlotParser,
};
use crate::storage::SnapshotStore;
use crate::utils::http::create_client;

/// Summary of a completed tick.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct TickReport {
    /// Entries in the fresh parse
    pub total: usize,
    /// Entries not present in the previous snapshot
    pub new: usize,
    /// Previously stored entries missing from the fresh parse
    pub removed: usize,
    /// Whether a notification was delivered
    pub notified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<DeliveryReceipt>,
}

/// The assembled pipeline.
pub struct Watcher {
    source: Box<dyn PageSource>,
    parser: SlotParser,
    store: Arc<dyn SnapshotStore>,
    notifier: Box<dyn Notify>,
}

impl Watcher {
    pub fn new(
        source: Box<dyn PageSource>,
        parser: SlotParser,
        store: Arc<dyn SnapshotStore>,
        notifier: Box<dyn Notify>,
    ) -> Self {
        Self {
            source,
            parser,
            store,
            notifier,
        }
    }

    /// Wire the HTTP fetcher and Messenger notifier from configuration.
    ///
    /// With `dry_run` the composed message is logged instead of sent.
    pub fn from_config(config: &Config, store: Arc<dyn SnapshotStore>, dry_run: bool) -> Result<Self> {
        let client = create_client(&config.source)?;
        let parser = SlotParser::from_config(&config.selectors, &config.source.url)?;
        let composer = MessageComposer::new(config.messages.clone(), &config.source.url);

        let notifier: Box<dyn Notify> = if dry_run {
            Box::new(LogNotifier::new(composer))
        } else {
            Box::new(MessengerNotifier::new(
                client.clone(),
                config.messenger.clone(),
                composer,
            ))
        };
        let source = Box::new(Fetcher::with_client(client, &config.source.url));

        Ok(Self::new(source, parser, store, notifier))
    }

    pub fn store(&self) -> &Arc<dyn SnapshotStore> {
        &self.store
    }

    /// Run one tick, logging any failure with its stage.
    pub async fn tick(&self) -> Result<TickReport> {
        self.run().await.inspect_err(|e| {
            log::error!("Tick failed at {} stage: {}", e.stage(), e);
        })
    }

    async fn run(&self) -> Result<TickReport> {
        let html = self.source.fetch().await?;
        let fresh = self.parser.parse(&html)?;

        let previous = self.store.read_all().await?;
        let diff = calculate_diff(&previous, &fresh);
        self.store.replace_all(&fresh).await?;

        let mut report = TickReport {
            total: fresh.len(),
            new: diff.added.len(),
            removed: diff.removed.len(),
            ..TickReport::default()
        };
        log::info!(
            "Tick: {} listed, {} new, {} removed",
            report.total,
            report.new,
            report.removed
        );

        if diff.has_additions() {
            let receipt = self.notifier.notify(&diff.added).await?;
            log::info!(
                "Notified about {} new slots (message id: {})",
                report.new,
                receipt.message_id.as_deref().unwrap_or("-")
            );
            report.notified = true;
            report.receipt = Some(receipt);
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tempfile::TempDir;

    use crate::error::AppError;
    use crate::models::{ScheduleEntry, SelectorConfig, Snapshot};
    use crate::storage::{LocalStorage, MemoryStorage};

    const BASE: &str = "https://www.rezervujsi.sk/autino";
    const NO_SLOTS: &str = "<html><body><p>V najbližšom období nie sú zverejnené ďalšie termíny,\n      v prípade potreby nás prosím kontaktujte.</p></body></html>";
    const MALFORMED: &str = r#"<html><body><div class="terms"><span>Chyba</span></div></body></html>"#;

    type Slot = (&'static str, &'static str, &'static str);

    const E1: Slot = ("Pondelok 3. 3.", "08:00", "Ján Novák");
    const E2: Slot = ("Pondelok 3. 3.", "10:00", "Eva Malá");
    const E3: Slot = ("Utorok 4. 3.", "14:00", "Ján Novák");

    /// Render slots in the default layout, one day group per distinct date.
    fn page(slots: &[Slot]) -> String {
        let mut days: Vec<(&str, Vec<&Slot>)> = Vec::new();
        for slot in slots {
            match days.iter_mut().find(|(date, _)| *date == slot.0) {
                Some((_, group)) => group.push(slot),
                None => days.push((slot.0, vec![slot])),
            }
        }

        let mut html = String::from(r#"<html><body><div class="terms">"#);
        for (date, group) in days {
            html.push_str(&format!(r#"<div class="day"><h3 class="day-title">{date}</h3>"#));
            for (i, (_, start, instructor)) in group.iter().enumerate() {
                html.push_str(&format!(
                    r#"<div class="term"><span class="term-time">{start}{end}</span><span class="term-instructor">{instructor}</span><a href="/autino/r/{i}">Rezervovať</a></div>"#,
                    end = end_of(start),
                ));
            }
            html.push_str("</div>");
        }
        html.push_str("</div></body></html>");
        html
    }

    fn end_of(start: &str) -> String {
        let hour: u32 = start[..2].parse().unwrap();
        format!("{:02}:30", hour + 1)
    }

    fn id_of(slot: &Slot) -> String {
        ScheduleEntry::derive_id(slot.0, &format!("{} - {}", slot.1, end_of(slot.1)), slot.2)
    }

    /// Serves queued fetch results in order.
    struct ScriptedSource {
        pages: Mutex<VecDeque<Result<String>>>,
    }

    impl ScriptedSource {
        fn new(pages: Vec<Result<String>>) -> Self {
            Self {
                pages: Mutex::new(pages.into()),
            }
        }
    }

    #[async_trait]
    impl PageSource for ScriptedSource {
        async fn fetch(&self) -> Result<String> {
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AppError::network("script exhausted")))
        }
    }

    /// Records every delivered batch; optionally fails every send.
    #[derive(Default)]
    struct RecordingNotifier {
        sent: Arc<Mutex<Vec<Vec<ScheduleEntry>>>>,
        fail: bool,
    }

    #[async_trait]
    impl Notify for RecordingNotifier {
        async fn notify(&self, entries: &[ScheduleEntry]) -> Result<DeliveryReceipt> {
            self.sent.lock().unwrap().push(entries.to_vec());
            if self.fail {
                return Err(AppError::delivery(400, r#"{"error":{"code":190}}"#));
            }
            Ok(DeliveryReceipt {
                recipient_id: Some("42".into()),
                message_id: Some("m_1".into()),
            })
        }
    }

    /// Store whose reads always fail.
    struct BrokenStore;

    #[async_trait]
    impl SnapshotStore for BrokenStore {
        async fn read_all(&self) -> Result<Snapshot> {
            Err(AppError::store("backend unavailable"))
        }

        async fn replace_all(&self, _entries: &[ScheduleEntry]) -> Result<()> {
            panic!("replace_all must not run after a failed read");
        }
    }

    struct Harness {
        watcher: Watcher,
        store: Arc<dyn SnapshotStore>,
        sent: Arc<Mutex<Vec<Vec<ScheduleEntry>>>>,
    }

    fn harness(pages: Vec<Result<String>>, store: Arc<dyn SnapshotStore>, fail_delivery: bool) -> Harness {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let notifier = RecordingNotifier {
            sent: Arc::clone(&sent),
            fail: fail_delivery,
        };
        let parser = SlotParser::from_config(&SelectorConfig::default(), BASE).unwrap();
        let watcher = Watcher::new(
            Box::new(ScriptedSource::new(pages)),
            parser,
            Arc::clone(&store),
            Box::new(notifier),
        );
        Harness {
            watcher,
            store,
            sent,
        }
    }

    async fn stored_ids(store: &Arc<dyn SnapshotStore>) -> Vec<String> {
        let mut ids: Vec<String> = store.read_all().await.unwrap().entries.into_keys().collect();
        ids.sort();
        ids
    }

    fn sorted(mut ids: Vec<String>) -> Vec<String> {
        ids.sort();
        ids
    }

    async fn seeded(slots: &[Slot]) -> Arc<dyn SnapshotStore> {
        let store: Arc<dyn SnapshotStore> = Arc::new(MemoryStorage::new());
        if !slots.is_empty() {
            let parser = SlotParser::from_config(&SelectorConfig::default(), BASE).unwrap();
            store.replace_all(&parser.parse(&page(slots)).unwrap()).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_scenario_a_new_slot_is_notified() {
        let h = harness(vec![Ok(page(&[E1, E2]))], seeded(&[E1]).await, false);

        let report = h.watcher.tick().await.unwrap();
        assert_eq!(report.total, 2);
        assert_eq!(report.new, 1);
        assert!(report.notified);

        let sent = h.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].len(), 1);
        assert_eq!(sent[0][0].id, id_of(&E2));

        assert_eq!(stored_ids(&h.store).await, sorted(vec![id_of(&E1), id_of(&E2)]));
    }

    #[tokio::test]
    async fn test_scenario_b_removal_without_notification() {
        let h = harness(vec![Ok(page(&[E2]))], seeded(&[E1, E2]).await, false);

        let report = h.watcher.tick().await.unwrap();
        assert_eq!(report.new, 0);
        assert_eq!(report.removed, 1);
        assert!(!report.notified);
        assert!(h.sent.lock().unwrap().is_empty());
        assert_eq!(stored_ids(&h.store).await, vec![id_of(&E2)]);
    }

    #[tokio::test]
    async fn test_scenario_c_no_slots_on_empty_store() {
        let h = harness(vec![Ok(NO_SLOTS.to_string())], seeded(&[]).await, false);

        let report = h.watcher.tick().await.unwrap();
        assert_eq!(report, TickReport::default());
        assert!(h.sent.lock().unwrap().is_empty());
        assert!(stored_ids(&h.store).await.is_empty());
    }

    #[tokio::test]
    async fn test_no_slots_clears_stale_entries() {
        let h = harness(vec![Ok(NO_SLOTS.to_string())], seeded(&[E1, E3]).await, false);

        let report = h.watcher.tick().await.unwrap();
        assert_eq!(report.removed, 2);
        assert!(stored_ids(&h.store).await.is_empty());
    }

    #[tokio::test]
    async fn test_second_identical_tick_is_quiet() {
        let h = harness(
            vec![Ok(page(&[E1, E2])), Ok(page(&[E1, E2]))],
            seeded(&[]).await,
            false,
        );

        let first = h.watcher.tick().await.unwrap();
        let second = h.watcher.tick().await.unwrap();
        assert_eq!(first.new, 2);
        assert_eq!(second.new, 0);
        assert!(!second.notified);
        assert_eq!(h.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_removed_slot_only_returns_when_reparsed() {
        let h = harness(
            vec![Ok(page(&[E1, E2])), Ok(page(&[E2])), Ok(page(&[E2])), Ok(page(&[E1, E2]))],
            seeded(&[]).await,
            false,
        );

        h.watcher.tick().await.unwrap();
        assert_eq!(h.watcher.tick().await.unwrap().new, 0);
        assert_eq!(stored_ids(&h.store).await, vec![id_of(&E2)]);
        assert_eq!(h.watcher.tick().await.unwrap().new, 0);

        let report = h.watcher.tick().await.unwrap();
        assert_eq!(report.new, 1);
        let sent = h.sent.lock().unwrap().clone();
        assert_eq!(sent.last().unwrap()[0].id, id_of(&E1));
    }

    #[tokio::test]
    async fn test_parse_failure_leaves_snapshot_unchanged() {
        let h = harness(
            vec![Ok(MALFORMED.to_string()), Ok(page(&[E1, E2]))],
            seeded(&[E1, E2]).await,
            false,
        );

        let err = h.watcher.tick().await.unwrap_err();
        assert!(err.is_parse_failure());
        assert_eq!(stored_ids(&h.store).await, sorted(vec![id_of(&E1), id_of(&E2)]));

        // Nothing reappears as new once the page recovers.
        let report = h.watcher.tick().await.unwrap();
        assert_eq!(report.new, 0);
        assert!(h.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_snapshot_unchanged() {
        let h = harness(
            vec![Err(AppError::upstream(503, "Service Unavailable"))],
            seeded(&[E1]).await,
            false,
        );

        let err = h.watcher.tick().await.unwrap_err();
        assert_eq!(err.stage(), "fetch");
        assert_eq!(stored_ids(&h.store).await, vec![id_of(&E1)]);
    }

    #[tokio::test]
    async fn test_store_read_failure_aborts_before_replace() {
        let store: Arc<dyn SnapshotStore> = Arc::new(BrokenStore);
        let h = harness(vec![Ok(page(&[E1]))], store, false);

        let err = h.watcher.tick().await.unwrap_err();
        assert!(matches!(err, AppError::Store(_)));
        assert!(h.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delivery_failure_keeps_new_snapshot() {
        let tmp = TempDir::new().unwrap();
        let store: Arc<dyn SnapshotStore> = Arc::new(LocalStorage::new(tmp.path()));
        let h = harness(
            vec![Ok(page(&[E1, E3])), Ok(page(&[E1, E3]))],
            store,
            true,
        );

        let err = h.watcher.tick().await.unwrap_err();
        assert!(matches!(err, AppError::Delivery { status: 400, .. }));

        let reopened = LocalStorage::new(tmp.path());
        let snapshot = reopened.read_all().await.unwrap();
        assert!(snapshot.contains(&id_of(&E1)));
        assert!(snapshot.contains(&id_of(&E3)));

        // The missed notification is not repeated.
        let report = h.watcher.tick().await.unwrap();
        assert_eq!(report.new, 0);
        assert_eq!(h.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_from_config_dry_run_builds() {
        let store: Arc<dyn SnapshotStore> = Arc::new(MemoryStorage::new());
        let watcher = Watcher::from_config(&Config::default(), store, true).unwrap();
        assert!(watcher.store().read_all().await.unwrap().is_empty());
    }
}
