//! Record decoder for OpenClaw session logs.
//!
//! A session log is a sequence of JSON objects. Only records of the form
//!
//! ```json
//! {"type":"message","message":{"role":"assistant","model":"claude-sonnet-4-5",
//!  "usage":{"input":120,"output":40,"totalTokens":160,
//!           "cost":{"input":0.001,"output":0.002,"total":0.003,"cacheRead":0,"cacheWrite":0}}}}
//! ```
//!
//! carrying a non-empty model produce a [`UsageEvent`]. Everything else,
//! including malformed JSON and fields of the wrong type, yields nothing.

use serde::Deserialize;
use serde_json::Value;
use tracing::trace;

use crate::models::{TokenCount, UsageEvent};

/// Record kind that carries message payloads.
pub const MESSAGE_RECORD: &str = "message";

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    message: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct MessagePayload {
    role: Option<String>,
    model: Option<String>,
    usage: Option<RawUsage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawUsage {
    input: Option<u64>,
    output: Option<u64>,
    total_tokens: Option<u64>,
    cost: Option<RawCost>,
}

/// Cost components as logged. Cache components are informational only.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
struct RawCost {
    input: Option<f64>,
    output: Option<f64>,
    total: Option<f64>,
    cache_read: Option<f64>,
    cache_write: Option<f64>,
}

/// Decode a single JSON record.
pub fn decode_record(bytes: &[u8]) -> Option<UsageEvent> {
    match serde_json::from_slice::<RawRecord>(bytes) {
        Ok(record) => usage_from_record(record),
        Err(e) => {
            trace!(error = %e, "skipping undecodable record");
            None
        }
    }
}

/// Decode every record on one line of a session log.
///
/// A line may hold several concatenated objects. Decoding stops at the first
/// malformed object on the line; events decoded before it are kept.
pub fn decode_line(line: &[u8]) -> Vec<UsageEvent> {
    let mut events = Vec::new();
    let stream = serde_json::Deserializer::from_slice(line).into_iter::<RawRecord>();

    for record in stream {
        match record {
            Ok(record) => events.extend(usage_from_record(record)),
            Err(e) => {
                trace!(error = %e, "skipping rest of undecodable line");
                break;
            }
        }
    }

    events
}

fn usage_from_record(record: RawRecord) -> Option<UsageEvent> {
    if record.kind.as_deref() != Some(MESSAGE_RECORD) {
        return None;
    }

    let message = record.message.filter(|m| !m.is_null())?;
    let payload = match MessagePayload::deserialize(&message) {
        Ok(payload) => payload,
        Err(e) => {
            trace!(error = %e, "skipping message with invalid payload");
            return None;
        }
    };

    // Role-only and text records carry no model and are not usage events
    let model = payload.model.filter(|m| !m.is_empty())?;
    let usage = payload.usage.unwrap_or_default();

    Some(UsageEvent {
        role: payload.role.unwrap_or_default(),
        model,
        tokens: TokenCount::new(
            usage.input.unwrap_or(0),
            usage.output.unwrap_or(0),
            usage.total_tokens.unwrap_or(0),
        ),
        cost: usage.cost.and_then(|c| c.total).unwrap_or(0.0),
    })
}
