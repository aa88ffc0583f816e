//! # costctl-core
//!
//! Core types, errors, and utilities shared by the costctl crates.
//!
//! This crate provides:
//! - [`CostctlError`] - Error type for configuration, I/O and argument failures
//! - [`logging`] - Tracing setup for stderr and optional JSON log files
//! - [`types`] - Reporting [`Period`] and [`OutputFormat`] selections

pub mod error;
pub mod logging;
pub mod types;

// Re-export main types for convenience
pub use error::{CostctlError, Result};
pub use logging::{LogGuard, init_logging};
pub use types::{OutputFormat, Period, PeriodBounds};
