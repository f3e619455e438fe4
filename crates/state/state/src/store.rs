use std::time::Duration;

use async_trait::async_trait;

use crate::error::StateError;
use crate::key::{KeyKind, StateKey};

/// Trait for persisting keyed state.
///
/// Implementations must be `Send + Sync`, and each operation must be atomic
/// with respect to a single key.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Get the value for a key. Returns `None` if not found or expired.
    async fn get(&self, key: &StateKey) -> Result<Option<String>, StateError>;

    /// Set a value with an optional TTL, overwriting any previous value.
    async fn set(
        &self,
        key: &StateKey,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), StateError>;

    /// Delete a key. Returns `true` if the key existed.
    async fn delete(&self, key: &StateKey) -> Result<bool, StateError>;

    /// Scan all live keys of `kind` in `namespace`.
    ///
    /// Returns `(canonical_key, value)` pairs in no particular order.
    async fn scan_keys(
        &self,
        namespace: &str,
        kind: KeyKind,
    ) -> Result<Vec<(String, String)>, StateError>;

    /// Return a short backend name for logging (e.g. `"memory"`).
    fn backend_name(&self) -> &'static str;
}
