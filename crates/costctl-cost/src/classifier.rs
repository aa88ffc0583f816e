//! Session classification from the index or the session identifier.
//!
//! Session identifiers follow the gateway's key format:
//!
//! - `agent:<name>:cron:<job>:run:<sid>` → cron session for `<job>`
//! - `agent:<name>:subagent:<sid>` → subagent session
//! - anything else → interactive
//!
//! An index entry always wins over the identifier.

use chrono::{DateTime, Utc};

use crate::models::{SessionInfo, SessionType};

const SEGMENT_DELIMITER: char = ':';
const CRON_SEGMENT: &str = "cron";
const SUBAGENT_SEGMENT: &str = "subagent";

/// Result of classifying one session.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Classification {
    pub session_type: SessionType,
    /// Empty unless `session_type` is cron
    pub cron_id: String,
    /// Start instant from the index, if any
    pub timestamp_hint: Option<DateTime<Utc>>,
}

/// Classify a session from its index entry, falling back to its identifier.
pub fn classify(session_id: &str, info: Option<&SessionInfo>) -> Classification {
    let classification = match info {
        Some(info) => from_index(info),
        None => infer_from_id(session_id),
    };

    enforce_cron_invariant(classification)
}

/// Classification taken from an index entry.
pub fn from_index(info: &SessionInfo) -> Classification {
    Classification {
        session_type: SessionType::from_index(&info.session_type),
        cron_id: info.label.clone().unwrap_or_default(),
        timestamp_hint: info.started_at,
    }
}

/// Structural inference over a colon-delimited session identifier.
///
/// Only interior segments count: `cron:x` at the start or a trailing `:cron`
/// do not mark a cron session.
pub fn infer_from_id(session_id: &str) -> Classification {
    let segments: Vec<&str> = session_id.split(SEGMENT_DELIMITER).collect();
    let interior = |name: &str| {
        segments.len() > 2 && segments[1..segments.len() - 1].contains(&name)
    };

    if interior(CRON_SEGMENT) {
        let cron_id = segments
            .windows(2)
            .find(|pair| pair[0] == CRON_SEGMENT)
            .map(|pair| pair[1].to_string())
            .unwrap_or_default();

        return Classification {
            session_type: SessionType::Cron,
            cron_id,
            timestamp_hint: None,
        };
    }

    if interior(SUBAGENT_SEGMENT) {
        return Classification {
            session_type: SessionType::Subagent,
            ..Default::default()
        };
    }

    Classification::default()
}

/// Resolve a session's start instant: index hint, then file modification time.
pub fn resolve_timestamp(
    hint: Option<DateTime<Utc>>,
    modified: Option<DateTime<Utc>>,
) -> Option<DateTime<Utc>> {
    hint.or(modified)
}

fn enforce_cron_invariant(mut classification: Classification) -> Classification {
    if !classification.session_type.is_cron() {
        classification.cron_id.clear();
    }
    classification
}
