//! Integration tests for costctl-cost over mock OpenClaw data directories.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Local, Utc};
use costctl_core::logging::init_test_logging;
use costctl_core::{OutputFormat, Period};
use costctl_cost::{
    ReportView, Session, SessionType, SessionWalker, UNNAMED_CRON, aggregate, filter_by_agent,
    filter_by_period, render,
};
use tempfile::{TempDir, tempdir};

fn message(model: &str, input: u64, output: u64, total: u64, cost: f64) -> String {
    format!(
        r#"{{"type":"message","message":{{"role":"assistant","model":"{model}","usage":{{"input":{input},"output":{output},"totalTokens":{total},"cost":{{"input":0,"output":0,"total":{cost}}}}}}}}}"#
    )
}

fn sessions_dir(root: &Path, agent: &str) -> PathBuf {
    let dir = root.join("agents").join(agent).join("sessions");
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_session(root: &Path, agent: &str, id: &str, lines: &[String]) -> PathBuf {
    let path = sessions_dir(root, agent).join(format!("{id}.jsonl"));
    fs::write(&path, lines.join("\n") + "\n").unwrap();
    path
}

fn write_index(root: &Path, agent: &str, json: &str) {
    fs::write(sessions_dir(root, agent).join("sessions.json"), json).unwrap();
}

fn set_mtime(path: &Path, time: SystemTime) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(time)
        .unwrap();
}

/// Two agents: `main` with an index, `amos` relying on id inference.
fn mock_tree() -> TempDir {
    init_test_logging();
    let dir = tempdir().unwrap();
    let root = dir.path();

    write_session(
        root,
        "main",
        "abc123",
        &[
            r#"{"type":"session","version":3}"#.to_string(),
            message("claude-opus-4-6", 1000, 200, 1500, 0.5),
            r#"{"type":"message","message":{"role":"user","content":"thanks"}}"#.to_string(),
            message("claude-haiku-4-5", 100, 20, 150, 0.25),
        ],
    );
    write_session(
        root,
        "main",
        "def456",
        &[message("claude-haiku-4-5", 10, 10, 20, 0.125)],
    );
    write_index(
        root,
        "main",
        r#"{"sessions":[
            {"id":"abc123","type":"interactive","startedAt":"2026-02-01T10:00:00Z"},
            {"id":"def456","type":"cron","label":"daily-digest","startedAt":"2026-02-02T06:00:00Z"}
        ]}"#,
    );

    write_session(
        root,
        "amos",
        "agent:amos:cron:nightly-build:run:1",
        &[message("gpt-5", 500, 500, 1000, 1.0)],
    );
    write_session(
        root,
        "amos",
        "agent:amos:subagent:42",
        &[message("gpt-5", 50, 50, 100, 0.125)],
    );

    dir
}

fn find<'a>(sessions: &'a [Session], id: &str) -> &'a Session {
    sessions
        .iter()
        .find(|s| s.id == id)
        .unwrap_or_else(|| panic!("session {id} not found"))
}

#[test]
fn test_walk_discovers_all_agents() {
    let dir = mock_tree();
    let sessions = SessionWalker::new(dir.path()).walk().unwrap();

    assert_eq!(sessions.len(), 4);

    // Agents in name order, files in id order
    let ids: Vec<_> = sessions.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(
        ids,
        [
            "agent:amos:cron:nightly-build:run:1",
            "agent:amos:subagent:42",
            "abc123",
            "def456",
        ]
    );
}

#[test]
fn test_index_and_inferred_classification() {
    let dir = mock_tree();
    let sessions = SessionWalker::new(dir.path()).walk().unwrap();

    let indexed = find(&sessions, "abc123");
    assert_eq!(indexed.session_type, SessionType::Interactive);
    assert_eq!(
        indexed.timestamp,
        Some("2026-02-01T10:00:00Z".parse::<DateTime<Utc>>().unwrap())
    );
    assert_eq!(indexed.message_count, 2);
    assert_eq!(indexed.cost, 0.75);

    let labeled = find(&sessions, "def456");
    assert_eq!(labeled.session_type, SessionType::Cron);
    assert_eq!(labeled.cron_id, "daily-digest");

    let cron = find(&sessions, "agent:amos:cron:nightly-build:run:1");
    assert_eq!(cron.session_type, SessionType::Cron);
    assert_eq!(cron.cron_id, "nightly-build");
    // No index: timestamp comes from the file mtime
    assert!(cron.timestamp.is_some());

    let sub = find(&sessions, "agent:amos:subagent:42");
    assert_eq!(sub.session_type, SessionType::Subagent);
    assert!(sub.cron_id.is_empty());
}

#[test]
fn test_index_entry_overrides_id_inference() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write_session(
        root,
        "main",
        "agent:main:cron:x:run:1",
        &[message("m", 1, 1, 2, 0.5)],
    );
    write_index(
        root,
        "main",
        r#"{"sessions":[{"id":"agent:main:cron:x:run:1","type":"interactive","label":"x"}]}"#,
    );

    let sessions = SessionWalker::new(root).walk().unwrap();
    assert_eq!(sessions[0].session_type, SessionType::Interactive);
    assert!(sessions[0].cron_id.is_empty());
}

#[test]
fn test_null_index_fields_keep_other_entries() {
    init_test_logging();
    let dir = tempdir().unwrap();
    let root = dir.path();
    write_session(root, "main", "a", &[message("m", 1, 1, 2, 0.5)]);
    write_session(root, "main", "b", &[message("m", 1, 1, 2, 0.25)]);
    write_session(root, "main", "c", &[message("m", 1, 1, 2, 0.125)]);
    write_index(
        root,
        "main",
        r#"{"sessions":[
            {"id":"a","type":"cron","label":"nightly","startedAt":"2026-02-01T06:00:00Z"},
            {"id":"b","type":null,"label":null,"startedAt":null},
            {"id":null,"type":"cron"},
            {"id":"c","type":7,"label":"broken"}
        ]}"#,
    );

    let sessions = SessionWalker::new(root).walk().unwrap();
    assert_eq!(sessions.len(), 3);

    let a = find(&sessions, "a");
    assert_eq!(a.session_type, SessionType::Cron);
    assert_eq!(a.cron_id, "nightly");
    assert_eq!(
        a.timestamp,
        Some("2026-02-01T06:00:00Z".parse::<DateTime<Utc>>().unwrap())
    );

    // Null type reads as the interactive default
    let b = find(&sessions, "b");
    assert_eq!(b.session_type, SessionType::Interactive);

    // An entry with a wrong field type is dropped alone; the id decides
    let c = find(&sessions, "c");
    assert_eq!(c.session_type, SessionType::Interactive);
    assert!(c.cron_id.is_empty());
}

#[test]
fn test_aggregate_mock_tree() {
    let dir = mock_tree();
    let sessions = SessionWalker::new(dir.path()).walk().unwrap();
    let result = aggregate(&sessions);

    assert_eq!(result.total_sessions, 4);
    assert_eq!(result.total_messages, 5);
    assert_eq!(result.total_cost, 2.0);
    assert_eq!(result.total_tokens.total, 2770);

    assert_eq!(result.by_agent.get("main"), Some(&0.875));
    assert_eq!(result.by_agent.get("amos"), Some(&1.125));
    assert_eq!(result.by_type.get("cron"), Some(&1.125));
    assert_eq!(result.by_type.get("subagent"), Some(&0.125));
    assert_eq!(result.by_model.get("gpt-5"), Some(&1.125));
    assert_eq!(result.by_model.get("claude-haiku-4-5"), Some(&0.375));

    assert_eq!(result.total_cron_cost, 1.125);
    assert_eq!(result.by_cron.get("nightly-build"), Some(&1.0));
    assert_eq!(result.by_cron.get("daily-digest"), Some(&0.125));
    assert_eq!(result.by_cron.get(UNNAMED_CRON), None);

    let by_agent_sum: f64 = result.by_agent.iter().map(|(_, c)| c).sum();
    assert!((by_agent_sum - result.total_cost).abs() < 1e-12);
}

#[test]
fn test_garbage_and_missing_dirs_are_tolerated() {
    let dir = tempdir().unwrap();
    let root = dir.path();

    write_session(
        root,
        "main",
        "noisy",
        &[
            "not json at all".to_string(),
            "{\"type\":\"message\",\"message\":".to_string(),
            r#"{"type":"message","message":{"role":"assistant","model":"","usage":{"cost":{"total":9.0}}}}"#
                .to_string(),
            r#"{"type":"message","message":null}"#.to_string(),
            message("gpt-5", 1, 1, 2, 0.5),
        ],
    );
    write_index(root, "main", "{ this is not an index");

    // Agent without a sessions directory
    fs::create_dir_all(root.join("agents").join("idle")).unwrap();
    // Stray file at the agent level
    fs::write(root.join("agents").join("README"), "not an agent").unwrap();
    // Non-session files are ignored
    fs::write(sessions_dir(root, "main").join("notes.txt"), "ignored").unwrap();

    let sessions = SessionWalker::new(root).walk().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].message_count, 1);
    assert_eq!(sessions[0].cost, 0.5);
    assert_eq!(sessions[0].session_type, SessionType::Interactive);
}

#[test]
fn test_unlistable_sessions_dir_skips_only_that_agent() {
    let dir = mock_tree();
    let root = dir.path();

    // `sessions` exists but is not a directory
    let broken = root.join("agents").join("broken");
    fs::create_dir_all(&broken).unwrap();
    fs::write(broken.join("sessions"), "not a directory").unwrap();

    let sessions = SessionWalker::new(root).walk().unwrap();
    assert_eq!(sessions.len(), 4);
    assert!(sessions.iter().all(|s| s.agent != "broken"));
}

#[cfg(unix)]
#[test]
fn test_unreadable_session_files_are_skipped() {
    use std::os::unix::fs::symlink;

    init_test_logging();
    let dir = tempdir().unwrap();
    let root = dir.path();
    write_session(root, "main", "good", &[message("m", 1, 1, 2, 0.5)]);

    let sessions = sessions_dir(root, "main");
    // Cannot be opened
    symlink(root.join("nowhere.jsonl"), sessions.join("dangling.jsonl")).unwrap();
    // Opens, but fails on read
    let target = root.join("a-directory");
    fs::create_dir_all(&target).unwrap();
    symlink(&target, sessions.join("dir-link.jsonl")).unwrap();

    let sessions = SessionWalker::new(root).walk().unwrap();
    let ids: Vec<_> = sessions.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, ["good"]);
}

#[cfg(unix)]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_parallel_walk_skips_unreadable_session_files() {
    use std::os::unix::fs::symlink;

    let dir = mock_tree();
    let sessions = sessions_dir(dir.path(), "main");
    symlink(dir.path().join("nowhere.jsonl"), sessions.join("a-dangling.jsonl")).unwrap();

    let parallel = SessionWalker::new(dir.path())
        .with_concurrency(3)
        .walk_parallel()
        .await
        .unwrap();
    assert_eq!(parallel.len(), 4);
    assert_eq!(parallel, SessionWalker::new(dir.path()).walk().unwrap());
}

#[test]
fn test_empty_session_file_is_kept() {
    let dir = tempdir().unwrap();
    write_session(dir.path(), "main", "quiet", &[]);

    let sessions = SessionWalker::new(dir.path()).walk().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].message_count, 0);

    let result = aggregate(&sessions);
    assert_eq!(result.total_sessions, 1);
    assert!(result.by_model.is_empty());
}

#[test]
fn test_reports_are_idempotent() {
    let dir = mock_tree();
    let walker = SessionWalker::new(dir.path());

    let first = render(
        &aggregate(&walker.walk().unwrap()),
        ReportView::Full,
        OutputFormat::Json,
    )
    .unwrap();
    let second = render(
        &aggregate(&walker.walk().unwrap()),
        ReportView::Full,
        OutputFormat::Json,
    )
    .unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_mtime_prefilter_matches_post_filter() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    let now = SystemTime::now();

    let old = write_session(root, "main", "old", &[message("m", 1, 1, 2, 1.0)]);
    set_mtime(&old, now - Duration::from_secs(30 * 24 * 3600));
    let recent = write_session(root, "main", "recent", &[message("m", 1, 1, 2, 2.0)]);
    set_mtime(&recent, now - Duration::from_secs(3600));

    let local_now = Local::now();
    let period = Period::Week;

    let unfiltered = SessionWalker::new(root).walk().unwrap();
    assert_eq!(unfiltered.len(), 2);
    let post = filter_by_period(unfiltered, period, &local_now);

    let pre = SessionWalker::new(root)
        .with_not_before(period.not_before(&local_now))
        .walk()
        .unwrap();
    let pre = filter_by_period(pre, period, &local_now);

    assert_eq!(pre, post);
    assert_eq!(pre.len(), 1);
    assert_eq!(pre[0].id, "recent");
}

#[test]
fn test_mtime_prefilter_boundaries() {
    init_test_logging();
    let dir = tempdir().unwrap();
    let root = dir.path();

    let cutoff_time = SystemTime::UNIX_EPOCH + Duration::from_secs(1_770_000_000);
    let cutoff = DateTime::<Utc>::from(cutoff_time);

    let before = write_session(root, "main", "before", &[message("m", 1, 1, 2, 1.0)]);
    set_mtime(&before, cutoff_time - Duration::from_secs(1));

    let exact = write_session(root, "main", "exact", &[message("m", 1, 1, 2, 1.0)]);
    set_mtime(&exact, cutoff_time);

    // Touched after the cutoff, but everything in it is older
    let stale = write_session(
        root,
        "main",
        "stale",
        &[
            r#"{"type":"session","timestamp":"2025-01-01T00:00:00Z"}"#.to_string(),
            message("m", 1, 1, 2, 1.0),
        ],
    );
    set_mtime(&stale, cutoff_time + Duration::from_secs(60));
    write_index(
        root,
        "main",
        r#"{"sessions":[{"id":"stale","type":"interactive","startedAt":"2025-01-01T00:00:00Z"}]}"#,
    );

    let sessions = SessionWalker::new(root)
        .with_not_before(Some(cutoff))
        .walk()
        .unwrap();
    let ids: Vec<_> = sessions.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, ["exact", "stale"]);

    assert_eq!(find(&sessions, "exact").timestamp, Some(cutoff));
    assert_eq!(
        find(&sessions, "stale").timestamp,
        Some("2025-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap())
    );
}

#[test]
fn test_filter_by_agent_on_walk() {
    let dir = mock_tree();
    let sessions = SessionWalker::new(dir.path()).walk().unwrap();

    let amos = filter_by_agent(sessions, "AMOS");
    assert_eq!(amos.len(), 2);
    assert!(amos.iter().all(|s| s.agent == "amos"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_parallel_walk_matches_sequential() {
    let dir = mock_tree();
    for i in 0..20 {
        write_session(
            dir.path(),
            "bulk",
            &format!("s{i:02}"),
            &[message("gpt-5", i, i, 2 * i, 0.001 * i as f64)],
        );
    }

    let sequential = SessionWalker::new(dir.path()).walk().unwrap();
    let parallel = SessionWalker::new(dir.path())
        .with_concurrency(4)
        .walk_parallel()
        .await
        .unwrap();

    assert_eq!(sequential.len(), 24);
    assert_eq!(sequential, parallel);
    assert_eq!(aggregate(&sequential), aggregate(&parallel));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_parallel_walk_missing_root_is_fatal() {
    let dir = tempdir().unwrap();
    let err = SessionWalker::new(dir.path().join("missing"))
        .with_concurrency(4)
        .walk_parallel()
        .await
        .unwrap_err();
    assert!(err.is_fatal_to_run());
}

#[test]
fn test_text_reports_over_walk() {
    let dir = mock_tree();
    let result = aggregate(&SessionWalker::new(dir.path()).walk().unwrap());

    let crons = render(&result, ReportView::Crons, OutputFormat::Text).unwrap();
    assert!(crons.contains("Total Cron Cost: $1.1250"));
    assert!(crons.find("nightly-build").unwrap() < crons.find("daily-digest").unwrap());

    let models = render(&result, ReportView::Models, OutputFormat::Text).unwrap();
    assert!(models.find("gpt-5").unwrap() < models.find("claude-opus-4-6").unwrap());
}
