use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use leadline_state::error::StateError;
use leadline_state::key::{KeyKind, StateKey};
use leadline_state::store::StateStore;

use crate::config::FileConfig;

/// A single persisted entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Entry {
    value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }
}

type Image = BTreeMap<String, Entry>;

/// [`StateStore`] that keeps every entry in one JSON document on disk.
///
/// The document is read once on first use and rewritten (via a temporary file
/// and rename) after every mutation. A missing file is an empty store; an
/// unreadable or corrupt file is also treated as empty and replaced on the next
/// write, matching the "storage may be lost or corrupted" contract of drafts.
///
/// TTLs are wall-clock based so they survive restarts.
#[derive(Debug)]
pub struct FileStateStore {
    config: FileConfig,
    image: Mutex<Option<Image>>,
}

impl FileStateStore {
    /// Create a store for `config.path`. No I/O happens until first use.
    pub fn new(config: FileConfig) -> Self {
        Self {
            config,
            image: Mutex::new(None),
        }
    }

    async fn read_image(&self) -> Image {
        match tokio::fs::read_to_string(&self.config.path).await {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(image) => image,
                Err(e) => {
                    warn!(
                        path = %self.config.path.display(),
                        error = %e,
                        "state file is corrupt, starting empty"
                    );
                    Image::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Image::new(),
            Err(e) => {
                warn!(
                    path = %self.config.path.display(),
                    error = %e,
                    "state file is unreadable, starting empty"
                );
                Image::new()
            }
        }
    }

    async fn write_image(&self, image: &Image) -> Result<(), StateError> {
        let contents = if self.config.pretty {
            serde_json::to_string_pretty(image)
        } else {
            serde_json::to_string(image)
        }
        .map_err(|e| StateError::Serialization(e.to_string()))?;

        if let Some(parent) = self.config.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let temp = self.config.temp_path();
        tokio::fs::write(&temp, contents).await?;
        tokio::fs::rename(&temp, &self.config.path).await?;
        debug!(path = %self.config.path.display(), entries = image.len(), "state file written");
        Ok(())
    }

    /// Run `f` against the loaded image, dropping expired entries first.
    ///
    /// `f` returns its result and whether the image must be written back.
    /// Changes are made on a copy that replaces the cached image only once the
    /// file write succeeds.
    async fn with_image<T>(
        &self,
        f: impl FnOnce(&mut Image) -> (T, bool),
    ) -> Result<T, StateError> {
        let mut guard = self.image.lock().await;
        let current = match guard.take() {
            Some(image) => image,
            None => self.read_image().await,
        };

        let now = Utc::now();
        let mut next = current.clone();
        next.retain(|_, entry| !entry.is_expired(now));
        let evicted = next.len() != current.len();

        let (result, changed) = f(&mut next);
        if (changed || evicted)
            && let Err(e) = self.write_image(&next).await
        {
            *guard = Some(current);
            return Err(e);
        }
        *guard = Some(next);
        Ok(result)
    }
}

fn expiry_from_ttl(ttl: Option<Duration>) -> Option<DateTime<Utc>> {
    ttl.and_then(|d| chrono::Duration::from_std(d).ok())
        .map(|d| Utc::now() + d)
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn get(&self, key: &StateKey) -> Result<Option<String>, StateError> {
        let rendered = key.canonical();
        self.with_image(|image| (image.get(&rendered).map(|e| e.value.clone()), false))
            .await
    }

    async fn set(
        &self,
        key: &StateKey,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), StateError> {
        let entry = Entry {
            value: value.to_owned(),
            expires_at: expiry_from_ttl(ttl),
        };
        let rendered = key.canonical();
        self.with_image(|image| {
            image.insert(rendered, entry);
            ((), true)
        })
        .await
    }

    async fn delete(&self, key: &StateKey) -> Result<bool, StateError> {
        let rendered = key.canonical();
        self.with_image(|image| {
            let existed = image.remove(&rendered).is_some();
            (existed, existed)
        })
        .await
    }

    async fn scan_keys(
        &self,
        namespace: &str,
        kind: KeyKind,
    ) -> Result<Vec<(String, String)>, StateError> {
        let prefix = StateKey::prefix(namespace, &kind);
        self.with_image(|image| {
            let entries = image
                .iter()
                .filter(|(k, _)| k.starts_with(&prefix))
                .map(|(k, e)| (k.clone(), e.value.clone()))
                .collect();
            (entries, false)
        })
        .await
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}
