use std::sync::Arc;

use anyhow::{Context, bail};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use leadline_compose::{ComposeConfig, DraftStore};
use leadline_core::{Clock, RequestStore, load_snapshot, sample_requests};
use leadline_state::StateStore;
use leadline_state_file::{FileConfig, FileStateStore};
use leadline_state_memory::MemoryStateStore;

use crate::config::{DataConfig, StateConfig};

/// Construct a `StateStore` from configuration.
pub fn create_state(config: &StateConfig) -> anyhow::Result<Arc<dyn StateStore>> {
    let store: Arc<dyn StateStore> = match config.backend.as_str() {
        "memory" => Arc::new(MemoryStateStore::new()),
        "file" => Arc::new(FileStateStore::new(FileConfig::new(&config.path))),
        other => bail!("unsupported state backend: {other}"),
    };
    info!(backend = store.backend_name(), "state store initialized");
    Ok(store)
}

/// Construct the draft store on top of the configured backend.
pub fn create_drafts(
    state: &StateConfig,
    compose: &ComposeConfig,
    clock: Arc<dyn Clock>,
) -> anyhow::Result<DraftStore> {
    Ok(DraftStore::new(create_state(state)?, state.namespace.as_str(), clock)
        .with_ttl(compose.draft_ttl))
}

/// Load requests from the configured snapshot, or generate sample data.
pub fn load_requests(config: &DataConfig, now: DateTime<Utc>) -> anyhow::Result<RequestStore> {
    let requests = match &config.snapshot {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let snapshot = load_snapshot(&contents)
                .with_context(|| format!("parsing {}", path.display()))?;
            if !snapshot.dropped.is_empty() {
                warn!(
                    count = snapshot.dropped.len(),
                    dropped = ?snapshot.dropped,
                    "skipped requests with an unknown stage"
                );
            }
            snapshot.requests
        }
        None => sample_requests(config.sample_count, now),
    };
    Ok(RequestStore::new(requests)?)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use chrono::TimeZone;

    use super::*;

    #[test]
    fn unknown_backend_is_an_error() {
        let config = StateConfig {
            backend: "redis".into(),
            ..StateConfig::default()
        };
        let err = create_state(&config).err().unwrap();
        assert!(err.to_string().contains("unsupported state backend"));
    }

    #[test]
    fn file_backend_is_selected() {
        let dir = tempfile::tempdir().unwrap();
        let config = StateConfig {
            backend: "file".into(),
            path: dir.path().join("drafts.json"),
            ..StateConfig::default()
        };
        assert_eq!(create_state(&config).unwrap().backend_name(), "file");
    }

    #[test]
    fn sample_data_when_no_snapshot() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let config = DataConfig {
            snapshot: None,
            sample_count: 7,
        };
        assert_eq!(load_requests(&config, now).unwrap().len(), 7);
    }

    #[test]
    fn snapshot_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("requests.json");
        std::fs::write(
            &path,
            r#"[
                {"id":"r1","sender_name":"Ahmed","sender_email":"a@x.sa","subject":"Quote",
                 "body":"","received_at":"2025-02-27T10:00:00Z","stage":"contacted","category":"customer"},
                {"id":"r2","sender_name":"Sara","sender_email":"s@x.sa","subject":"Hi",
                 "body":"","received_at":"2025-02-27T10:00:00Z","stage":"archived","category":"customer"}
            ]"#,
        )
        .unwrap();
        let config = DataConfig {
            snapshot: Some(path),
            sample_count: 0,
        };
        let store = load_requests(&config, Utc::now()).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn missing_snapshot_is_an_error() {
        let config = DataConfig {
            snapshot: Some(PathBuf::from("/nonexistent/requests.json")),
            sample_count: 0,
        };
        assert!(load_requests(&config, Utc::now()).is_err());
    }
}
