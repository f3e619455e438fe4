use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use leadline_core::{Clock, DraftKey, SendAs};
use leadline_state::{KeyKind, StateError, StateKey, StateStore};

/// Editable fields of a reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftFields {
    pub to: String,
    pub cc: String,
    pub bcc: String,
    /// Opaque editor output.
    pub body: String,
    #[serde(rename = "replyAs")]
    pub send_as: SendAs,
}

/// A persisted snapshot of an unsent reply.
///
/// Stored as `{"to","cc","bcc","body","replyAs","savedAt"}`. Unknown fields
/// are ignored when reading; a record missing any field is treated as absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    #[serde(flatten)]
    pub fields: DraftFields,
    #[serde(rename = "savedAt")]
    pub saved_at: DateTime<Utc>,
}

/// Keyed draft storage on top of a [`StateStore`].
#[derive(Clone)]
pub struct DraftStore {
    state: Arc<dyn StateStore>,
    namespace: String,
    clock: Arc<dyn Clock>,
    ttl: Option<Duration>,
}

impl std::fmt::Debug for DraftStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DraftStore")
            .field("backend", &self.state.backend_name())
            .field("namespace", &self.namespace)
            .field("clock", &self.clock)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl DraftStore {
    /// Create a draft store writing under `namespace`.
    pub fn new(
        state: Arc<dyn StateStore>,
        namespace: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            state,
            namespace: namespace.into(),
            clock,
            ttl: None,
        }
    }

    /// Expire every saved draft after `ttl`. `None` keeps drafts until cleared.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    fn state_key(&self, key: &DraftKey) -> StateKey {
        StateKey::new(self.namespace.as_str(), KeyKind::Draft, key.as_str())
    }

    /// Load the draft stored under `key`.
    ///
    /// A payload that cannot be decoded is logged and reported as absent.
    #[instrument(skip(self), fields(backend = self.state.backend_name()))]
    pub async fn load(&self, key: &DraftKey) -> Result<Option<Draft>, StateError> {
        let Some(raw) = self.state.get(&self.state_key(key)).await? else {
            return Ok(None);
        };
        Ok(decode(key, &raw))
    }

    /// Overwrite the draft under `key`, stamping it with the current time.
    #[instrument(skip(self, fields), fields(backend = self.state.backend_name()))]
    pub async fn save(&self, key: &DraftKey, fields: &DraftFields) -> Result<Draft, StateError> {
        let draft = Draft {
            fields: fields.clone(),
            saved_at: self.clock.now(),
        };
        let payload =
            serde_json::to_string(&draft).map_err(|e| StateError::Serialization(e.to_string()))?;
        self.state
            .set(&self.state_key(key), &payload, self.ttl)
            .await?;
        debug!(saved_at = %draft.saved_at, "draft saved");
        Ok(draft)
    }

    /// Delete the draft under `key`. Returns `true` if one existed.
    #[instrument(skip(self), fields(backend = self.state.backend_name()))]
    pub async fn clear(&self, key: &DraftKey) -> Result<bool, StateError> {
        let existed = self.state.delete(&self.state_key(key)).await?;
        debug!(existed, "draft cleared");
        Ok(existed)
    }

    /// All readable drafts, oldest first.
    pub async fn list(&self) -> Result<Vec<(DraftKey, Draft)>, StateError> {
        let prefix = StateKey::prefix(&self.namespace, &KeyKind::Draft);
        let entries = self.state.scan_keys(&self.namespace, KeyKind::Draft).await?;

        let mut drafts: Vec<_> = entries
            .into_iter()
            .filter_map(|(canonical, raw)| {
                let key = DraftKey::new(canonical.strip_prefix(&prefix)?);
                let draft = decode(&key, &raw)?;
                Some((key, draft))
            })
            .collect();
        drafts.sort_by(|a, b| a.1.saved_at.cmp(&b.1.saved_at).then_with(|| a.0.cmp(&b.0)));
        Ok(drafts)
    }

    /// Delete every draft saved before `cutoff`. Returns the removed keys.
    #[instrument(skip(self), fields(backend = self.state.backend_name()))]
    pub async fn purge_older_than(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<DraftKey>, StateError> {
        let mut removed = Vec::new();
        for (key, draft) in self.list().await? {
            if draft.saved_at < cutoff && self.clear(&key).await? {
                removed.push(key);
            }
        }
        if !removed.is_empty() {
            debug!(count = removed.len(), "stale drafts purged");
        }
        Ok(removed)
    }
}

fn decode(key: &DraftKey, raw: &str) -> Option<Draft> {
    match serde_json::from_str(raw) {
        Ok(draft) => Some(draft),
        Err(e) => {
            warn!(key = %key, error = %e, "ignoring unreadable draft");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use leadline_core::ManualClock;
    use leadline_state_memory::MemoryStateStore;

    use super::*;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
    }

    fn setup() -> (DraftStore, Arc<MemoryStateStore>, ManualClock) {
        let state = Arc::new(MemoryStateStore::new());
        let clock = ManualClock::new(start());
        let store = DraftStore::new(state.clone(), "leadline", Arc::new(clock.clone()));
        (store, state, clock)
    }

    fn fields(body: &str) -> DraftFields {
        DraftFields {
            to: "fatima@example.com".into(),
            body: body.into(),
            ..DraftFields::default()
        }
    }

    #[tokio::test]
    async fn save_then_load() {
        let (store, _, _) = setup();
        let key = DraftKey::new("req-0001");
        let saved = store.save(&key, &fields("Hello")).await.unwrap();
        assert_eq!(saved.saved_at, start());

        let loaded = store.load(&key).await.unwrap().unwrap();
        assert_eq!(loaded, saved);
        assert!(store.load(&DraftKey::new("req-0002")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn record_uses_the_documented_field_names() {
        let (store, state, _) = setup();
        let key = DraftKey::new("req-0001");
        store.save(&key, &fields("Hi")).await.unwrap();

        let raw = state
            .get(&StateKey::new("leadline", KeyKind::Draft, "req-0001"))
            .await
            .unwrap()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["replyAs"], "company");
        assert_eq!(value["savedAt"], "2025-03-01T09:00:00Z");
        assert_eq!(value["body"], "Hi");
        assert_eq!(value["cc"], "");
    }

    #[tokio::test]
    async fn unknown_fields_are_ignored() {
        let (store, state, _) = setup();
        let raw = r#"{"to":"a@b.c","cc":"","bcc":"","body":"x","replyAs":"personal",
            "savedAt":"2025-03-01T09:00:00Z","version":3}"#;
        state
            .set(&StateKey::new("leadline", KeyKind::Draft, "k"), raw, None)
            .await
            .unwrap();
        let draft = store.load(&DraftKey::new("k")).await.unwrap().unwrap();
        assert_eq!(draft.fields.send_as, SendAs::Personal);
    }

    #[tokio::test]
    async fn malformed_records_are_absent() {
        let (store, state, _) = setup();
        for (id, raw) in [
            ("garbage", "{not json"),
            ("missing-body", r#"{"to":"","cc":"","bcc":"","replyAs":"company","savedAt":"2025-03-01T09:00:00Z"}"#),
            ("bad-mode", r#"{"to":"","cc":"","bcc":"","body":"","replyAs":"robot","savedAt":"2025-03-01T09:00:00Z"}"#),
        ] {
            state
                .set(&StateKey::new("leadline", KeyKind::Draft, id), raw, None)
                .await
                .unwrap();
            assert!(store.load(&DraftKey::new(id)).await.unwrap().is_none(), "{id}");
        }
    }

    #[tokio::test]
    async fn save_overwrites_and_restamps() {
        let (store, _, clock) = setup();
        let key = DraftKey::new("req-0001");
        store.save(&key, &fields("one")).await.unwrap();
        clock.advance(chrono::Duration::seconds(30));
        store.save(&key, &fields("two")).await.unwrap();

        let draft = store.load(&key).await.unwrap().unwrap();
        assert_eq!(draft.fields.body, "two");
        assert_eq!(draft.saved_at, start() + chrono::Duration::seconds(30));
    }

    #[tokio::test]
    async fn clear_reports_existence() {
        let (store, _, _) = setup();
        let key = DraftKey::new("req-0001");
        store.save(&key, &fields("x")).await.unwrap();
        assert!(store.clear(&key).await.unwrap());
        assert!(!store.clear(&key).await.unwrap());
        assert!(store.load(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_and_purge_stale_drafts() {
        let (store, state, clock) = setup();
        store.save(&DraftKey::new("old"), &fields("a")).await.unwrap();
        clock.advance(chrono::Duration::days(10));
        store.save(&DraftKey::new("new"), &fields("b")).await.unwrap();
        state
            .set(&StateKey::new("leadline", KeyKind::Draft, "junk"), "nope", None)
            .await
            .unwrap();

        let keys: Vec<_> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|(k, _)| k.to_string())
            .collect();
        assert_eq!(keys, ["old", "new"]);

        let removed = store
            .purge_older_than(clock.now() - chrono::Duration::days(7))
            .await
            .unwrap();
        assert_eq!(removed, [DraftKey::new("old")]);
        assert!(store.load(&DraftKey::new("new")).await.unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn ttl_expires_drafts() {
        let (store, _, _) = setup();
        let store = store.with_ttl(Some(Duration::from_secs(60)));
        let key = DraftKey::new("req-0001");
        store.save(&key, &fields("x")).await.unwrap();

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(store.load(&key).await.unwrap().is_none());
    }
}
