use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::request::Request;
use crate::stage::{Stage, pipeline_stages};

/// Aggregate metrics shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    /// Number of requests in the snapshot.
    pub total: usize,
    /// Request count per stage; every stage is present.
    pub by_stage: BTreeMap<Stage, usize>,
    pub won: usize,
    pub lost: usize,
    /// Percentage of closed requests that were won, rounded half-up.
    pub win_rate: u32,
    /// Requests received in the seven days up to the evaluation time.
    pub new_this_week: usize,
    /// Requests not yet won or lost.
    pub active: usize,
}

impl DashboardStats {
    /// Compute the dashboard metrics for `requests` as of `now`.
    #[must_use]
    pub fn compute(requests: &[Request], now: DateTime<Utc>) -> Self {
        let mut by_stage: BTreeMap<Stage, usize> = Stage::all().map(|s| (s, 0)).collect();
        for request in requests {
            *by_stage.entry(request.stage).or_default() += 1;
        }

        let won = by_stage[&Stage::Won];
        let lost = by_stage[&Stage::Lost];
        let week_ago = now - Duration::days(7);
        let new_this_week = requests
            .iter()
            .filter(|r| r.received_at >= week_ago)
            .count();
        let total = requests.len();

        Self {
            total,
            by_stage,
            won,
            lost,
            win_rate: win_rate(won, lost),
            new_this_week,
            active: total - won - lost,
        }
    }

    /// Counts for the non-terminal stages, in pipeline order.
    #[must_use]
    pub fn pipeline_counts(&self) -> Vec<(Stage, usize)> {
        pipeline_stages()
            .iter()
            .map(|s| (s.id, self.by_stage.get(&s.id).copied().unwrap_or(0)))
            .collect()
    }
}

/// `round(100 * won / (won + lost))`, or 0 when nothing is closed.
#[must_use]
pub fn win_rate(won: usize, lost: usize) -> u32 {
    let closed = won + lost;
    if closed == 0 {
        return 0;
    }
    // Integer half-up rounding of 100 * won / closed.
    let rate = (200 * won + closed) / (2 * closed);
    u32::try_from(rate).unwrap_or(100)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    fn request(id: &str, stage: Stage, received_at: DateTime<Utc>) -> Request {
        Request::new(id, "Name", "name@example.com", "Subject", received_at, stage)
    }

    #[test]
    fn empty_input_is_all_zero() {
        let stats = DashboardStats::compute(&[], now());
        assert_eq!(stats.total, 0);
        assert_eq!(stats.won, 0);
        assert_eq!(stats.lost, 0);
        assert_eq!(stats.win_rate, 0);
        assert_eq!(stats.new_this_week, 0);
        assert_eq!(stats.active, 0);
        assert_eq!(stats.by_stage.len(), 7);
        assert!(stats.by_stage.values().all(|&c| c == 0));
    }

    #[test]
    fn win_rate_edges() {
        assert_eq!(win_rate(0, 0), 0);
        assert_eq!(win_rate(4, 0), 100);
        assert_eq!(win_rate(0, 3), 0);
        assert_eq!(win_rate(3, 1), 75);
        assert_eq!(win_rate(1, 2), 33);
        assert_eq!(win_rate(2, 1), 67);
        assert_eq!(win_rate(1, 7), 13);
    }

    #[test]
    fn counts_and_active() {
        let t = now() - Duration::days(20);
        let requests = vec![
            request("1", Stage::Won, t),
            request("2", Stage::Won, t),
            request("3", Stage::Won, t),
            request("4", Stage::Lost, t),
            request("5", Stage::New, t),
            request("6", Stage::Negotiation, t),
        ];
        let stats = DashboardStats::compute(&requests, now());
        assert_eq!(stats.total, 6);
        assert_eq!(stats.won, 3);
        assert_eq!(stats.lost, 1);
        assert_eq!(stats.win_rate, 75);
        assert_eq!(stats.active, 2);
        assert_eq!(stats.by_stage[&Stage::Contacted], 0);
        assert_eq!(stats.by_stage[&Stage::Negotiation], 1);
    }

    #[test]
    fn new_this_week_uses_inclusive_bound() {
        let requests = vec![
            request("edge", Stage::New, now() - Duration::days(7)),
            request("inside", Stage::New, now() - Duration::hours(1)),
            request("outside", Stage::New, now() - Duration::days(7) - Duration::seconds(1)),
        ];
        let stats = DashboardStats::compute(&requests, now());
        assert_eq!(stats.new_this_week, 2);
    }

    #[test]
    fn pipeline_counts_skip_terminal_stages() {
        let requests = vec![
            request("1", Stage::New, now()),
            request("2", Stage::New, now()),
            request("3", Stage::Won, now()),
        ];
        let counts = DashboardStats::compute(&requests, now()).pipeline_counts();
        assert_eq!(counts.len(), 5);
        assert_eq!(counts[0], (Stage::New, 2));
        assert!(counts.iter().all(|(s, _)| !s.is_terminal()));
    }
}
