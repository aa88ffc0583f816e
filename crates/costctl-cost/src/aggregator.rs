//! Aggregation engine: folds sessions into cost rollups.
//!
//! Four independent dimensions are summed in a single pass: agent, session
//! type, model (from each session's per-model costs) and cron job. Bucket
//! maps keep first-seen key order, which makes output deterministic for a
//! deterministic session order and gives ranking ties a stable order.

use std::collections::HashMap;
use std::ops::AddAssign;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::models::{Session, SessionSummary, TokenCount};

/// Bucket name for cron sessions without a resolved job id.
pub const UNNAMED_CRON: &str = "(unnamed)";

/// Key → accumulator map that remembers first-seen key order.
#[derive(Debug, Clone, PartialEq)]
pub struct Buckets<V> {
    entries: Vec<(String, V)>,
    positions: HashMap<String, usize>,
}

/// Cost per key.
pub type CostBuckets = Buckets<f64>;

impl<V> Default for Buckets<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            positions: HashMap::new(),
        }
    }
}

impl<V> Buckets<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.positions.get(key).map(|&i| &self.entries[i].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<V: AddAssign + Default> Buckets<V> {
    /// Add `value` to `key`, zero-initializing the bucket on first use.
    pub fn add(&mut self, key: &str, value: V) {
        match self.positions.get(key) {
            Some(&i) => self.entries[i].1 += value,
            None => {
                let mut initial = V::default();
                initial += value;
                self.positions.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), initial));
            }
        }
    }
}

impl Buckets<f64> {
    /// Buckets ordered by descending cost; ties keep first-seen order.
    pub fn ranked(&self, total: f64) -> Vec<RankedBucket> {
        let mut ranked: Vec<RankedBucket> = self
            .entries
            .iter()
            .map(|(name, cost)| RankedBucket {
                name: name.clone(),
                cost: *cost,
                percent: percent_of(*cost, total),
            })
            .collect();
        ranked.sort_by(|a, b| b.cost.total_cmp(&a.cost));
        ranked
    }
}

impl<V: Serialize> Serialize for Buckets<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// One line of a cost ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedBucket {
    pub name: String,
    pub cost: f64,
    /// Share of the ranking's total, 0 when the total is 0
    pub percent: f64,
}

/// Percentage of `total` represented by `part`, defined as 0 for a zero total.
pub fn percent_of(part: f64, total: f64) -> f64 {
    if total == 0.0 {
        0.0
    } else {
        part / total * 100.0
    }
}

/// Multi-dimensional rollup of a session list.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize)]
pub struct AggregationResult {
    pub total_cost: f64,
    pub total_sessions: usize,
    pub total_messages: usize,
    pub total_tokens: TokenCount,

    pub by_agent: CostBuckets,
    pub by_type: CostBuckets,
    pub by_model: CostBuckets,

    /// Cron sessions by job id, including the [`UNNAMED_CRON`] bucket
    #[serde(skip_serializing_if = "Buckets::is_empty")]
    pub by_cron: CostBuckets,

    #[serde(skip)]
    pub by_model_tokens: Buckets<TokenCount>,

    /// Cost of all cron sessions
    #[serde(skip)]
    pub total_cron_cost: f64,

    /// Per-session lines in input order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sessions: Vec<SessionSummary>,
}

impl AggregationResult {
    /// Models ranked by cost, as a share of the total cost.
    pub fn model_ranking(&self) -> Vec<RankedBucket> {
        self.by_model.ranked(self.total_cost)
    }

    /// Cron jobs ranked by cost, as a share of the total cron cost.
    pub fn cron_ranking(&self) -> Vec<RankedBucket> {
        self.by_cron.ranked(self.total_cron_cost)
    }

    /// Total tokens attributed to `model`.
    pub fn model_tokens(&self, model: &str) -> TokenCount {
        self.by_model_tokens.get(model).copied().unwrap_or_default()
    }
}

/// Fold a session list into an [`AggregationResult`].
pub fn aggregate(sessions: &[Session]) -> AggregationResult {
    let mut result = AggregationResult {
        sessions: Vec::with_capacity(sessions.len()),
        ..Default::default()
    };

    for session in sessions {
        result.total_cost += session.cost;
        result.total_sessions += 1;
        result.total_messages += session.message_count;
        result.total_tokens += session.tokens;

        result.by_agent.add(&session.agent, session.cost);
        result.by_type.add(session.session_type.as_str(), session.cost);

        for (model, cost) in &session.model_costs {
            result.by_model.add(model, *cost);
        }
        for (model, tokens) in &session.model_tokens {
            result.by_model_tokens.add(model, *tokens);
        }

        if session.session_type.is_cron() {
            result.total_cron_cost += session.cost;
            let job = if session.cron_id.is_empty() {
                UNNAMED_CRON
            } else {
                session.cron_id.as_str()
            };
            result.by_cron.add(job, session.cost);
        }

        result.sessions.push(session.summary());
    }

    result
}
