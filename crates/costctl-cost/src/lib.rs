//! # costctl-cost
//!
//! Session log ingestion and cost aggregation for OpenClaw agents.
//!
//! This crate provides:
//! - [`SessionWalker`] - Discover and parse every agent's session logs
//! - [`classify`] - Resolve a session's type and cron job id
//! - [`aggregate`] - Fold sessions into per-agent, per-type, per-model and per-cron rollups
//! - [`render`] - Text and JSON reports over an [`AggregationResult`]
//!
//! ## Example
//!
//! ```no_run
//! use chrono::Local;
//! use costctl_core::{OutputFormat, Period};
//! use costctl_cost::{ReportView, SessionWalker, aggregate, filter_by_period, render};
//!
//! fn main() -> anyhow::Result<()> {
//!     let now = Local::now();
//!     let period = Period::Week;
//!
//!     let sessions = SessionWalker::new("/home/me/.openclaw")
//!         .with_not_before(period.not_before(&now))
//!         .walk()?;
//!     let sessions = filter_by_period(sessions, period, &now);
//!
//!     let result = aggregate(&sessions);
//!     println!("{}", render(&result, ReportView::Models, OutputFormat::Text)?);
//!
//!     Ok(())
//! }
//! ```

pub mod aggregator;
pub mod builder;
pub mod classifier;
pub mod decoder;
pub mod error;
pub mod filter;
pub mod models;
pub mod report;
pub mod walker;

// Re-export main types
pub use aggregator::{
    AggregationResult, Buckets, CostBuckets, RankedBucket, UNNAMED_CRON, aggregate,
};
pub use builder::{SessionBuilder, SessionFile, parse_session_file};
pub use classifier::{Classification, classify};
pub use decoder::{decode_line, decode_record};
pub use error::{CostError, Result};
pub use filter::{filter_by_agent, filter_by_period};
pub use models::{Session, SessionInfo, SessionSummary, SessionType, TokenCount, UsageEvent};
pub use report::{ReportView, render};
pub use walker::{SessionIndex, SessionWalker};
