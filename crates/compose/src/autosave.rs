use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use leadline_core::DraftKey;
use leadline_state::StateError;

use crate::draft::{Draft, DraftFields, DraftStore};

/// In-memory reply fields shared between the flow and its autosave task.
///
/// Every edit bumps `revision`; a save records the revision it captured, so an
/// edit that lands while a save is in flight leaves the composer dirty.
#[derive(Debug, Default)]
pub(crate) struct Composer {
    fields: DraftFields,
    revision: u64,
    saved_revision: u64,
    last_saved: Option<DateTime<Utc>>,
}

pub(crate) type SharedComposer = Arc<Mutex<Composer>>;

impl Composer {
    /// A clean composer holding `fields`.
    pub(crate) fn new(fields: DraftFields, last_saved: Option<DateTime<Utc>>) -> Self {
        Self {
            fields,
            revision: 0,
            saved_revision: 0,
            last_saved,
        }
    }

    pub(crate) fn fields(&self) -> &DraftFields {
        &self.fields
    }

    pub(crate) fn edit(&mut self, f: impl FnOnce(&mut DraftFields)) {
        f(&mut self.fields);
        self.revision += 1;
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.revision != self.saved_revision
    }

    pub(crate) fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    fn snapshot(&self) -> (DraftFields, u64) {
        (self.fields.clone(), self.revision)
    }

    fn mark_saved(&mut self, revision: u64, at: DateTime<Utc>) {
        self.saved_revision = self.saved_revision.max(revision);
        self.last_saved = Some(at);
    }
}

/// Save the composer under `key` regardless of its dirty state.
pub(crate) async fn save_now(
    store: &DraftStore,
    key: &DraftKey,
    composer: &SharedComposer,
) -> Result<Draft, StateError> {
    let (fields, revision) = composer.lock().snapshot();
    let draft = store.save(key, &fields).await?;
    composer.lock().mark_saved(revision, draft.saved_at);
    Ok(draft)
}

/// Save the composer under `key` if it has unsaved edits.
pub(crate) async fn save_if_dirty(
    store: &DraftStore,
    key: &DraftKey,
    composer: &SharedComposer,
) -> Result<Option<Draft>, StateError> {
    if !composer.lock().is_dirty() {
        return Ok(None);
    }
    save_now(store, key, composer).await.map(Some)
}

/// Handle to a running autosave task.
///
/// [`stop`](Self::stop) signals the task and waits for an in-flight save to
/// finish. Dropping the handle aborts the task instead.
#[derive(Debug)]
pub struct AutosaveHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: Option<JoinHandle<()>>,
}

impl AutosaveHandle {
    /// Spawn a task that saves a dirty composer every `interval`.
    ///
    /// The first save happens one full interval after spawning. Failed saves
    /// are logged and retried on the next tick.
    pub(crate) fn spawn(
        store: DraftStore,
        key: DraftKey,
        composer: SharedComposer,
        interval: Duration,
    ) -> Self {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let task = tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately; skip it.
            timer.tick().await;
            debug!(key = %key, ?interval, "autosave armed");

            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        debug!(key = %key, "autosave stopped");
                        break;
                    }
                    _ = timer.tick() => {
                        match save_if_dirty(&store, &key, &composer).await {
                            Ok(Some(draft)) => {
                                info!(key = %key, saved_at = %draft.saved_at, "draft autosaved");
                            }
                            Ok(None) => {}
                            Err(e) => {
                                warn!(key = %key, error = %e, "autosave failed, retrying on next tick");
                            }
                        }
                    }
                }
            }
        });

        Self {
            shutdown_tx,
            task: Some(task),
        }
    }

    /// Stop the task and wait for it to exit.
    pub async fn stop(mut self) {
        let _ = self.shutdown_tx.try_send(());
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
            && e.is_panic()
        {
            warn!(error = %e, "autosave task panicked");
        }
    }
}

impl Drop for AutosaveHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::TimeZone;
    use leadline_core::ManualClock;
    use leadline_state::{KeyKind, StateKey, StateStore};
    use leadline_state_memory::MemoryStateStore;

    use super::*;

    /// Memory store whose first `failures` writes fail.
    #[derive(Debug)]
    struct FlakyStore {
        inner: MemoryStateStore,
        failures: AtomicUsize,
    }

    impl FlakyStore {
        fn failing(failures: usize) -> Self {
            Self {
                inner: MemoryStateStore::new(),
                failures: AtomicUsize::new(failures),
            }
        }
    }

    #[async_trait]
    impl StateStore for FlakyStore {
        async fn get(&self, key: &StateKey) -> Result<Option<String>, StateError> {
            self.inner.get(key).await
        }

        async fn set(
            &self,
            key: &StateKey,
            value: &str,
            ttl: Option<Duration>,
        ) -> Result<(), StateError> {
            let remaining = self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
            if remaining.is_ok() {
                return Err(StateError::Backend("quota exceeded".into()));
            }
            self.inner.set(key, value, ttl).await
        }

        async fn delete(&self, key: &StateKey) -> Result<bool, StateError> {
            self.inner.delete(key).await
        }

        async fn scan_keys(
            &self,
            namespace: &str,
            kind: KeyKind,
        ) -> Result<Vec<(String, String)>, StateError> {
            self.inner.scan_keys(namespace, kind).await
        }

        fn backend_name(&self) -> &'static str {
            "flaky"
        }
    }

    struct Harness {
        store: DraftStore,
        state: Arc<MemoryStateStore>,
        clock: ManualClock,
        composer: SharedComposer,
        key: DraftKey,
    }

    fn harness() -> Harness {
        let state = Arc::new(MemoryStateStore::new());
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap());
        Harness {
            store: DraftStore::new(state.clone(), "leadline", Arc::new(clock.clone())),
            state,
            clock,
            composer: Arc::new(Mutex::new(Composer::default())),
            key: DraftKey::new("req-0001"),
        }
    }

    impl Harness {
        fn spawn(&self) -> AutosaveHandle {
            AutosaveHandle::spawn(
                self.store.clone(),
                self.key.clone(),
                self.composer.clone(),
                Duration::from_secs(30),
            )
        }

        fn edit_body(&self, body: &str) {
            self.composer.lock().edit(|f| body.clone_into(&mut f.body));
        }

        async fn stored(&self) -> Option<Draft> {
            self.store.load(&self.key).await.unwrap()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn clean_composer_is_not_saved() {
        let h = harness();
        let handle = h.spawn();

        tokio::time::sleep(Duration::from_secs(95)).await;
        assert!(h.stored().await.is_none());
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn dirty_composer_is_saved_on_tick() {
        let h = harness();
        let handle = h.spawn();
        h.edit_body("Hello");

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert!(h.stored().await.is_none(), "no save before the interval");

        tokio::time::sleep(Duration::from_secs(2)).await;
        let draft = h.stored().await.expect("autosaved");
        assert_eq!(draft.fields.body, "Hello");
        assert!(!h.composer.lock().is_dirty());
        assert_eq!(h.composer.lock().last_saved(), Some(draft.saved_at));
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn saved_at_advances_only_when_dirty() {
        let h = harness();
        let handle = h.spawn();
        h.edit_body("one");
        tokio::time::sleep(Duration::from_secs(31)).await;
        let first = h.stored().await.unwrap().saved_at;

        h.clock.advance(chrono::Duration::seconds(30));
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(h.stored().await.unwrap().saved_at, first, "clean tick writes nothing");

        h.edit_body("two");
        h.clock.advance(chrono::Duration::seconds(30));
        tokio::time::sleep(Duration::from_secs(30)).await;
        let second = h.stored().await.unwrap();
        assert_eq!(second.fields.body, "two");
        assert!(second.saved_at > first);
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn no_save_after_stop() {
        let h = harness();
        let handle = h.spawn();
        handle.stop().await;

        h.edit_body("late edit");
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(h.stored().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn no_save_after_drop() {
        let h = harness();
        drop(h.spawn());

        h.edit_body("late edit");
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(h.stored().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_autosave_retries_on_next_tick() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap());
        let store = DraftStore::new(
            Arc::new(FlakyStore::failing(2)),
            "leadline",
            Arc::new(clock),
        );
        let key = DraftKey::new("req-0001");
        let composer: SharedComposer = Arc::new(Mutex::new(Composer::default()));
        let handle = AutosaveHandle::spawn(
            store.clone(),
            key.clone(),
            composer.clone(),
            Duration::from_secs(30),
        );
        composer.lock().edit(|f| "Hello".clone_into(&mut f.body));

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(store.load(&key).await.unwrap().is_none(), "both writes failed");
        assert!(composer.lock().is_dirty());
        assert!(composer.lock().last_saved().is_none());
        assert_eq!(composer.lock().fields().body, "Hello");

        tokio::time::sleep(Duration::from_secs(30)).await;
        let draft = store.load(&key).await.unwrap().expect("saved after retry");
        assert_eq!(draft.fields.body, "Hello");
        assert!(!composer.lock().is_dirty());
        handle.stop().await;
    }

    #[tokio::test]
    async fn edit_during_save_keeps_composer_dirty() {
        let h = harness();
        h.edit_body("v1");
        let (fields, revision) = h.composer.lock().snapshot();
        h.edit_body("v2");
        let draft = h.store.save(&h.key, &fields).await.unwrap();
        h.composer.lock().mark_saved(revision, draft.saved_at);

        assert!(h.composer.lock().is_dirty());
        let again = save_if_dirty(&h.store, &h.key, &h.composer).await.unwrap();
        assert_eq!(again.unwrap().fields.body, "v2");
        assert!(!h.composer.lock().is_dirty());
    }

    #[tokio::test]
    async fn save_now_writes_clean_composer() {
        let h = harness();
        let draft = save_now(&h.store, &h.key, &h.composer).await.unwrap();
        assert_eq!(draft.fields, DraftFields::default());
        let raw = h
            .state
            .get(&StateKey::new("leadline", KeyKind::Draft, "req-0001"))
            .await
            .unwrap();
        assert!(raw.is_some());
    }
}
