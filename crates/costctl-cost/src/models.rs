//! Data models for session cost tracking.

use std::collections::BTreeMap;
use std::ops::AddAssign;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Logical type of a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum SessionType {
    /// Operator-driven session
    #[default]
    Interactive,
    /// Session spawned by a scheduled job
    Cron,
    /// Delegated child of another session
    Subagent,
    /// Any other type string carried by a session index
    Other(String),
}

impl SessionType {
    /// Interpret a type string from `sessions.json`.
    ///
    /// Empty strings map to [`SessionType::Interactive`].
    pub fn from_index(value: &str) -> Self {
        match value {
            "" | "interactive" => Self::Interactive,
            "cron" => Self::Cron,
            "subagent" => Self::Subagent,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Interactive => "interactive",
            Self::Cron => "cron",
            Self::Subagent => "subagent",
            Self::Other(name) => name,
        }
    }

    pub fn is_cron(&self) -> bool {
        matches!(self, Self::Cron)
    }
}

impl std::fmt::Display for SessionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SessionType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Input/output/total token counts as reported upstream.
///
/// `total` is carried independently and never derived from the other two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TokenCount {
    pub input: u64,
    pub output: u64,
    pub total: u64,
}

impl TokenCount {
    pub fn new(input: u64, output: u64, total: u64) -> Self {
        Self {
            input,
            output,
            total,
        }
    }
}

/// Counts saturate at `u64::MAX`.
impl AddAssign for TokenCount {
    fn add_assign(&mut self, rhs: Self) {
        self.input = self.input.saturating_add(rhs.input);
        self.output = self.output.saturating_add(rhs.output);
        self.total = self.total.saturating_add(rhs.total);
    }
}

/// One cost-bearing record decoded from a session log.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageEvent {
    /// Message role (e.g., "assistant")
    pub role: String,

    /// Model identifier, never empty
    pub model: String,

    /// Token counts for this message
    pub tokens: TokenCount,

    /// Cost of this message (`usage.cost.total`)
    pub cost: f64,
}

/// Entry from an agent's `sessions.json` index.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub id: String,

    #[serde(default, rename = "type", deserialize_with = "null_as_empty")]
    pub session_type: String,

    /// Scheduled job label, used as the cron id
    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
}

/// JSON `null` reads as an empty string.
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// On-disk shape of `sessions.json`.
///
/// Entries stay raw so that one undecodable entry does not discard the rest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionIndexFile {
    #[serde(default)]
    pub sessions: Option<Vec<Value>>,
}

/// A fully parsed session with folded totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    /// Session identifier (file name without suffix)
    pub id: String,

    /// Owning agent name
    pub agent: String,

    #[serde(rename = "type")]
    pub session_type: SessionType,

    /// Scheduled job id; empty unless `session_type` is cron
    pub cron_id: String,

    /// Start instant, if one could be resolved
    pub timestamp: Option<DateTime<Utc>>,

    /// Summed cost of all usage events
    pub cost: f64,

    /// Summed token counts
    pub tokens: TokenCount,

    /// Number of usage events
    pub message_count: usize,

    /// Cost per observed model
    pub model_costs: BTreeMap<String, f64>,

    /// Tokens per observed model
    pub model_tokens: BTreeMap<String, TokenCount>,
}

impl Session {
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            agent: self.agent.clone(),
            session_type: self.session_type.clone(),
            cost: self.cost,
            message_count: self.message_count,
        }
    }
}

/// Flat per-session line for detailed reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub id: String,
    pub agent: String,
    #[serde(rename = "type")]
    pub session_type: SessionType,
    pub cost: f64,
    #[serde(rename = "messages")]
    pub message_count: usize,
}
