//! Discovery walker over an OpenClaw data directory.
//!
//! ```text
//! <root>/agents/<agent>/sessions/<session-id>.jsonl
//! <root>/agents/<agent>/sessions/sessions.json
//! ```
//!
//! Agents and session files are visited in name order so that repeated runs
//! over an unchanged tree produce identical results. A failing agent or
//! session file is logged and skipped; only an unreadable `agents/`
//! directory aborts the walk.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::builder::{SessionFile, modified_time, parse_session_file};
use crate::error::{CostError, Result};
use crate::models::{Session, SessionIndexFile, SessionInfo};

/// Directory under the data root holding one directory per agent.
pub const AGENTS_DIR: &str = "agents";

/// Per-agent directory holding session logs.
pub const SESSIONS_DIR: &str = "sessions";

/// Per-agent session index file.
pub const SESSION_INDEX_FILE: &str = "sessions.json";

/// Suffix of session log files.
pub const SESSION_FILE_SUFFIX: &str = ".jsonl";

/// Session index keyed by session id.
pub type SessionIndex = HashMap<String, SessionInfo>;

/// Work discovered for one agent.
#[derive(Debug, Clone)]
pub struct AgentPlan {
    pub agent: String,
    pub index: SessionIndex,
    pub files: Vec<SessionFile>,
}

/// Walks `<root>/agents` and parses every session file.
#[derive(Debug, Clone)]
pub struct SessionWalker {
    root: PathBuf,
    not_before: Option<DateTime<Utc>>,
    concurrency: usize,
}

impl SessionWalker {
    /// Create a sequential walker over a data directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            not_before: None,
            concurrency: 1,
        }
    }

    /// Skip session files modified strictly before `instant` without opening them.
    pub fn with_not_before(mut self, instant: Option<DateTime<Utc>>) -> Self {
        self.not_before = instant;
        self
    }

    /// Maximum number of session files parsed at once by [`walk_parallel`](Self::walk_parallel).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Parse all sessions sequentially, in discovery order.
    pub fn walk(&self) -> Result<Vec<Session>> {
        let mut sessions = Vec::new();

        for plan in self.plan()? {
            for file in &plan.files {
                if let Some(session) = parse_or_warn(file, &plan.agent, &plan.index) {
                    sessions.push(session);
                }
            }
        }

        info!(count = sessions.len(), root = %self.root.display(), "walked sessions");
        Ok(sessions)
    }

    /// Parse all sessions on a bounded pool of blocking tasks.
    ///
    /// Results are returned in the same discovery order as [`walk`](Self::walk).
    pub async fn walk_parallel(&self) -> Result<Vec<Session>> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut handles = Vec::new();

        for plan in self.plan()? {
            let agent: Arc<str> = Arc::from(plan.agent);
            let index = Arc::new(plan.index);

            for file in plan.files {
                let permit = Arc::clone(&semaphore)
                    .acquire_owned()
                    .await
                    .map_err(|e| CostError::Task(e.to_string()))?;
                let agent = Arc::clone(&agent);
                let index = Arc::clone(&index);

                handles.push(tokio::task::spawn_blocking(move || {
                    let _permit = permit;
                    parse_or_warn(&file, &agent, &index)
                }));
            }
        }

        let mut sessions = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(Some(session)) => sessions.push(session),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "session parse task failed"),
            }
        }

        info!(
            count = sessions.len(),
            concurrency = self.concurrency,
            root = %self.root.display(),
            "walked sessions"
        );
        Ok(sessions)
    }

    /// Enumerate agents and their session files without parsing them.
    pub fn plan(&self) -> Result<Vec<AgentPlan>> {
        let mut plans = Vec::new();

        for (agent, agent_dir) in self.list_agents()? {
            match self.plan_agent(&agent, &agent_dir) {
                Ok(Some(plan)) => plans.push(plan),
                Ok(None) => debug!(agent = %agent, "no sessions directory"),
                Err(e) => warn!(agent = %agent, error = %e, "skipping agent"),
            }
        }

        Ok(plans)
    }

    fn list_agents(&self) -> Result<Vec<(String, PathBuf)>> {
        let agents_dir = self.root.join(AGENTS_DIR);
        let entries = fs::read_dir(&agents_dir).map_err(|e| CostError::AgentsDirUnreadable {
            path: agents_dir.clone(),
            source: e,
        })?;

        let mut agents = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(dir = %agents_dir.display(), error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_ok_and(|t| t.is_dir()) {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => agents.push((name, entry.path())),
                Err(name) => warn!(name = ?name, "skipping agent with non UTF-8 name"),
            }
        }

        agents.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(agents)
    }

    fn plan_agent(&self, agent: &str, agent_dir: &Path) -> Result<Option<AgentPlan>> {
        let sessions_dir = agent_dir.join(SESSIONS_DIR);
        let entries = match fs::read_dir(&sessions_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CostError::SessionsDirUnreadable {
                    path: sessions_dir,
                    source: e,
                });
            }
        };

        let index = load_session_index(&sessions_dir.join(SESSION_INDEX_FILE));

        let mut files = Vec::new();
        let mut skipped = 0usize;
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(agent, error = %e, "skipping unreadable session entry");
                    continue;
                }
            };
            if entry.file_type().is_ok_and(|t| t.is_dir()) {
                continue;
            }
            let Some(id) = session_id_from_name(&entry.file_name().to_string_lossy()) else {
                continue;
            };

            let path = entry.path();
            let modified = modified_time(&path);
            if self.is_before_cutoff(modified) {
                skipped += 1;
                continue;
            }

            files.push(SessionFile { path, id, modified });
        }

        files.sort_by(|a, b| a.id.cmp(&b.id));
        debug!(
            agent,
            files = files.len(),
            skipped,
            indexed = index.len(),
            "planned agent"
        );

        Ok(Some(AgentPlan {
            agent: agent.to_string(),
            index,
            files,
        }))
    }

    fn is_before_cutoff(&self, modified: Option<DateTime<Utc>>) -> bool {
        match (self.not_before, modified) {
            (Some(cutoff), Some(mtime)) => mtime < cutoff,
            _ => false,
        }
    }
}

/// Session id for a file name carrying the session suffix.
pub fn session_id_from_name(name: &str) -> Option<String> {
    name.strip_suffix(SESSION_FILE_SUFFIX).map(str::to_string)
}

/// Load an agent's `sessions.json`.
///
/// A missing or malformed index is an empty table. An entry that does not
/// decode, or has an empty id, is dropped on its own.
pub fn load_session_index(path: &Path) -> SessionIndex {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                debug!(path = %path.display(), error = %e, "session index unreadable");
            }
            return SessionIndex::new();
        }
    };

    match serde_json::from_slice::<SessionIndexFile>(&data) {
        Ok(file) => file
            .sessions
            .unwrap_or_default()
            .iter()
            .filter_map(|entry| match SessionInfo::deserialize(entry) {
                Ok(info) => Some(info),
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "ignoring malformed index entry");
                    None
                }
            })
            .filter(|info| !info.id.is_empty())
            .map(|info| (info.id.clone(), info))
            .collect(),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "ignoring malformed session index");
            SessionIndex::new()
        }
    }
}

fn parse_or_warn(file: &SessionFile, agent: &str, index: &SessionIndex) -> Option<Session> {
    match parse_session_file(file, agent, index.get(&file.id)) {
        Ok(session) => Some(session),
        Err(e) => {
            warn!(agent, session = %file.id, error = %e, "skipping session");
            None
        }
    }
}
