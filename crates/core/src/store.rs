//! In-memory request collection.
//!
//! The store holds a snapshot supplied by a data source and never writes it
//! back. Views used by front ends (inbox search, kanban pipeline, recent
//! requests) are all pure reads over the snapshot.

use std::collections::{BTreeMap, HashSet};

use crate::error::CoreError;
use crate::request::{Category, Request};
use crate::stage::Stage;
use crate::types::RequestId;

/// Number of entries shown in the dashboard's recent-requests list.
pub const DEFAULT_RECENT_LIMIT: usize = 5;

/// An in-memory collection of [`Request`]s.
#[derive(Debug, Clone, Default)]
pub struct RequestStore {
    requests: Vec<Request>,
}

impl RequestStore {
    /// Build a store from a snapshot.
    ///
    /// Fails with [`CoreError::DuplicateRequestId`] if two requests share an id.
    pub fn new(requests: Vec<Request>) -> Result<Self, CoreError> {
        let mut seen = HashSet::with_capacity(requests.len());
        for request in &requests {
            if !seen.insert(&request.id) {
                return Err(CoreError::DuplicateRequestId(request.id.clone()));
            }
        }
        Ok(Self { requests })
    }

    /// All requests in store order.
    #[must_use]
    pub fn all(&self) -> &[Request] {
        &self.requests
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Look up a request by id.
    #[must_use]
    pub fn get(&self, id: &RequestId) -> Option<&Request> {
        self.requests.iter().find(|r| &r.id == id)
    }

    /// Return the requests matching `predicate`, in store order.
    pub fn filter<P>(&self, mut predicate: P) -> Vec<&Request>
    where
        P: FnMut(&Request) -> bool,
    {
        self.requests.iter().filter(|&r| predicate(r)).collect()
    }

    /// Move a request to `new_stage`, leaving every other field untouched.
    ///
    /// Setting the stage a request is already in is a successful no-op.
    pub fn change_stage(
        &mut self,
        id: &RequestId,
        new_stage: Stage,
    ) -> Result<&Request, CoreError> {
        let request = self
            .requests
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| CoreError::NotFound(id.clone()))?;
        request.stage = new_stage;
        Ok(request)
    }

    /// Inbox view: requests whose subject, sender name or sender email
    /// contains `query` (case-insensitive), newest first.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&Request> {
        let needle = query.to_lowercase();
        let mut matches = self.filter(|r| {
            needle.is_empty()
                || contains_folded(&r.subject, &needle)
                || contains_folded(&r.sender_name, &needle)
                || contains_folded(&r.sender_email, &needle)
        });
        matches.sort_by(|a, b| b.received_at.cmp(&a.received_at));
        matches
    }

    /// Pipeline view: customer requests whose subject or sender name
    /// contains `query` (case-insensitive), in store order.
    #[must_use]
    pub fn pipeline(&self, query: &str) -> Vec<&Request> {
        let needle = query.to_lowercase();
        self.filter(|r| {
            r.category == Category::Customer
                && (needle.is_empty()
                    || contains_folded(&r.subject, &needle)
                    || contains_folded(&r.sender_name, &needle))
        })
    }

    /// The `limit` most recently received requests, newest first.
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<&Request> {
        let mut all: Vec<&Request> = self.requests.iter().collect();
        all.sort_by(|a, b| b.received_at.cmp(&a.received_at));
        all.truncate(limit);
        all
    }
}

/// Group requests by stage.
///
/// Every registry stage is present in the result, with an empty list when no
/// request is in it. Keys iterate in registry order.
pub fn group_by_stage<'a, I>(requests: I) -> BTreeMap<Stage, Vec<&'a Request>>
where
    I: IntoIterator<Item = &'a Request>,
{
    let mut groups: BTreeMap<Stage, Vec<&'a Request>> =
        Stage::all().map(|s| (s, Vec::new())).collect();
    for request in requests {
        if let Some(bucket) = groups.get_mut(&request.stage) {
            bucket.push(request);
        }
    }
    groups
}

fn contains_folded(haystack: &str, folded_needle: &str) -> bool {
    haystack.to_lowercase().contains(folded_needle)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn request(id: &str, stage: Stage, days_ago: i64) -> Request {
        let base = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        Request::new(
            id,
            format!("Sender {id}"),
            format!("{id}@example.com"),
            format!("Subject {id}"),
            base - Duration::days(days_ago),
            stage,
        )
    }

    fn store() -> RequestStore {
        RequestStore::new(vec![
            request("a", Stage::New, 3),
            request("b", Stage::Won, 1),
            request("c", Stage::New, 10),
            request("d", Stage::Lost, 0).with_category(Category::JobApplication),
        ])
        .unwrap()
    }

    #[test]
    fn rejects_duplicate_ids() {
        let result = RequestStore::new(vec![
            request("x", Stage::New, 0),
            request("x", Stage::Won, 0),
        ]);
        assert!(matches!(result, Err(CoreError::DuplicateRequestId(id)) if id.as_str() == "x"));
    }

    #[test]
    fn filter_preserves_order() {
        let store = store();
        let ids: Vec<&str> = store
            .filter(|r| r.stage == Stage::New)
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert!(store.filter(|_| false).is_empty());
        assert_eq!(store.filter(|_| true).len(), store.len());
    }

    #[test]
    fn group_by_stage_has_every_stage() {
        let store = store();
        let groups = group_by_stage(store.all());
        assert_eq!(groups.len(), 7);
        assert_eq!(
            groups.keys().copied().collect::<Vec<_>>(),
            Stage::all().collect::<Vec<_>>()
        );
        assert_eq!(groups[&Stage::New].len(), 2);
        assert!(groups[&Stage::Negotiation].is_empty());
        let total: usize = groups.values().map(Vec::len).sum();
        assert_eq!(total, store.len());
    }

    #[test]
    fn group_by_stage_of_empty_input() {
        let groups = group_by_stage(std::iter::empty::<&Request>());
        assert_eq!(groups.len(), 7);
        assert!(groups.values().all(Vec::is_empty));
    }

    #[test]
    fn change_stage_updates_only_stage() {
        let mut store = store();
        let before = store.get(&RequestId::new("a")).unwrap().clone();
        let updated = store
            .change_stage(&RequestId::new("a"), Stage::Contacted)
            .unwrap();
        assert_eq!(updated.stage, Stage::Contacted);
        assert_eq!(updated.subject, before.subject);
        assert_eq!(updated.received_at, before.received_at);
        assert_eq!(
            store.get(&RequestId::new("a")).unwrap().stage,
            Stage::Contacted
        );
    }

    #[test]
    fn change_stage_is_idempotent() {
        let mut store = store();
        let id = RequestId::new("b");
        store.change_stage(&id, Stage::Won).unwrap();
        assert_eq!(store.get(&id).unwrap().stage, Stage::Won);
    }

    #[test]
    fn change_stage_unknown_id() {
        let mut store = store();
        let snapshot = store.all().to_vec();
        let err = store
            .change_stage(&RequestId::new("missing"), Stage::Won)
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(id) if id.as_str() == "missing"));
        assert_eq!(store.all(), snapshot.as_slice());
    }

    #[test]
    fn search_is_case_insensitive_and_newest_first() {
        let store = store();
        let ids: Vec<&str> = store.search("").iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["d", "b", "a", "c"]);

        let hits = store.search("C@EXAMPLE");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id.as_str(), "c");
    }

    #[test]
    fn pipeline_keeps_customers_only() {
        let store = store();
        let ids: Vec<&str> = store.pipeline("").iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(store.pipeline("sender b").len(), 1);
        // Pipeline search does not look at the email address.
        assert!(store.pipeline("b@example").is_empty());
    }

    #[test]
    fn recent_limits_and_orders() {
        let store = store();
        let ids: Vec<&str> = store.recent(2).iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["d", "b"]);
        assert_eq!(store.recent(DEFAULT_RECENT_LIMIT).len(), 4);
    }
}
