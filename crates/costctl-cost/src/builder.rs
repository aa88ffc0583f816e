//! Session builder: folds a session log into one [`Session`].

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::classifier::{Classification, classify, resolve_timestamp};
use crate::decoder::decode_line;
use crate::error::{CostError, Result};
use crate::models::{Session, SessionInfo, TokenCount, UsageEvent};

/// Accumulates usage events for one session.
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    session: Session,
}

impl SessionBuilder {
    /// Start a session with its identity and classification.
    pub fn new(
        id: impl Into<String>,
        agent: impl Into<String>,
        classification: Classification,
        timestamp: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            session: Session {
                id: id.into(),
                agent: agent.into(),
                session_type: classification.session_type,
                cron_id: classification.cron_id,
                timestamp,
                cost: 0.0,
                tokens: TokenCount::default(),
                message_count: 0,
                model_costs: Default::default(),
                model_tokens: Default::default(),
            },
        }
    }

    /// Fold one usage event into the running totals.
    ///
    /// Cost accumulates per model only; [`build`](Self::build) derives the
    /// session cost from those sums.
    pub fn push(&mut self, event: UsageEvent) {
        let session = &mut self.session;

        session.tokens += event.tokens;
        session.message_count += 1;

        *session.model_tokens.entry(event.model.clone()).or_default() += event.tokens;
        *session.model_costs.entry(event.model).or_insert(0.0) += event.cost;
    }

    /// Stream records from `reader`, one line at a time.
    ///
    /// Undecodable records are skipped. Only I/O failures of the reader
    /// itself are returned.
    pub fn consume<R: Read>(mut self, reader: R) -> std::io::Result<Self> {
        let mut reader = BufReader::new(reader);
        let mut line = Vec::new();

        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            for event in decode_line(&line) {
                self.push(event);
            }
        }

        Ok(self)
    }

    /// Finish the session.
    ///
    /// The session cost is settled from the per-model costs so that it is
    /// exactly the sum of `model_costs` in key order.
    pub fn build(mut self) -> Session {
        self.session.cost = self
            .session
            .model_costs
            .values()
            .fold(0.0, |acc, cost| acc + cost);
        self.session
    }
}

/// A session log discovered on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionFile {
    pub path: PathBuf,
    pub id: String,
    pub modified: Option<DateTime<Utc>>,
}

impl SessionFile {
    /// Describe a session file, reading its modification time.
    pub fn from_path(path: impl Into<PathBuf>, id: impl Into<String>) -> Self {
        let path = path.into();
        let modified = modified_time(&path);
        Self {
            path,
            id: id.into(),
            modified,
        }
    }
}

/// Modification time of a file, if the platform reports one.
pub fn modified_time(path: &Path) -> Option<DateTime<Utc>> {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .map(DateTime::<Utc>::from)
}

/// Parse one session file into a [`Session`].
pub fn parse_session_file(
    file: &SessionFile,
    agent: &str,
    info: Option<&SessionInfo>,
) -> Result<Session> {
    let classification = classify(&file.id, info);
    let timestamp = resolve_timestamp(classification.timestamp_hint, file.modified);

    let handle = File::open(&file.path).map_err(|e| CostError::SessionOpen {
        path: file.path.clone(),
        source: e,
    })?;

    let session = SessionBuilder::new(&file.id, agent, classification, timestamp)
        .consume(handle)
        .map_err(|e| CostError::SessionRead {
            path: file.path.clone(),
            source: e,
        })?
        .build();

    debug!(
        agent,
        session = %session.id,
        session_type = %session.session_type,
        messages = session.message_count,
        cost = session.cost,
        "parsed session"
    );

    Ok(session)
}
