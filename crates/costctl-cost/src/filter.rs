//! Session filters applied between discovery and aggregation.

use chrono::{DateTime, TimeZone};
use costctl_core::Period;

use crate::models::Session;

/// Keep sessions whose timestamp falls inside `period` as seen from `now`.
///
/// [`Period::All`] keeps everything, including sessions without a timestamp.
pub fn filter_by_period<Tz: TimeZone>(
    sessions: Vec<Session>,
    period: Period,
    now: &DateTime<Tz>,
) -> Vec<Session> {
    match period.bounds_at(now) {
        Some(bounds) => sessions
            .into_iter()
            .filter(|s| bounds.contains(s.timestamp))
            .collect(),
        None => sessions,
    }
}

/// Keep sessions owned by `agent`, compared case-insensitively.
pub fn filter_by_agent(sessions: Vec<Session>, agent: &str) -> Vec<Session> {
    sessions
        .into_iter()
        .filter(|s| s.agent.to_lowercase() == agent.to_lowercase())
        .collect()
}
