//! Loading request snapshots from an external data source.
//!
//! A snapshot is a JSON array of request records. Records that name a stage
//! the registry does not know are dropped rather than failing the whole load,
//! so every `Request` that reaches the store carries a valid [`Stage`].

use serde_json::Value;

use crate::error::CoreError;
use crate::request::Request;
use crate::stage;

/// The result of ingesting a snapshot.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Requests with a known stage, in input order.
    pub requests: Vec<Request>,
    /// Ids (or positions, when a record has no id) of records dropped for an
    /// unknown stage.
    pub dropped: Vec<String>,
}

/// Parse a JSON array of request records.
pub fn load_snapshot(json: &str) -> Result<Snapshot, CoreError> {
    let records: Vec<Value> =
        serde_json::from_str(json).map_err(|e| CoreError::Serialization(e.to_string()))?;

    let mut snapshot = Snapshot::default();
    for (index, record) in records.into_iter().enumerate() {
        let stage_known = record
            .get("stage")
            .and_then(Value::as_str)
            .is_some_and(|s| stage::find(s).is_some());

        if !stage_known {
            let label = record
                .get("id")
                .and_then(Value::as_str)
                .map_or_else(|| format!("#{index}"), str::to_owned);
            snapshot.dropped.push(label);
            continue;
        }

        let request: Request = serde_json::from_value(record)
            .map_err(|e| CoreError::Serialization(format!("record #{index}: {e}")))?;
        snapshot.requests.push(request);
    }

    Ok(snapshot)
}
