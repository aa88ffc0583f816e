//! costctl - OpenClaw cost observatory
//!
//! Reports what OpenClaw agents spent, from their on-disk session logs.
//!
//! ## Usage
//!
//! ```bash
//! # Full report over everything
//! costctl report
//!
//! # This week's cron jobs as JSON
//! costctl report --period week --crons --format json
//!
//! # One agent's model breakdown, parsing 8 files at a time
//! costctl report --agent amos --models --concurrency 8
//!
//! # With verbose logging to a directory
//! costctl -vv --log-dir /tmp/costctl report
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Local;
use clap::{Args, Parser, Subcommand};
use costctl_config::{Overrides, Settings};
use costctl_core::{CostctlError, LogGuard, OutputFormat, Period, init_logging};
use costctl_cost::{
    ReportView, Session, SessionWalker, aggregate, filter_by_agent, filter_by_period, render,
};
use tracing::{debug, error, info};

/// OpenClaw cost observatory
///
/// Walks the agents' session logs and breaks spend down by agent,
/// session type, model and cron job.
#[derive(Parser, Debug)]
#[command(name = "costctl")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Directory for JSON log files
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Aggregate session costs and print a report
    Report(ReportArgs),
}

#[derive(Args, Debug)]
struct ReportArgs {
    /// Time window: today, yesterday, week, month, all
    #[arg(long)]
    period: Option<Period>,

    /// Only include sessions of this agent (case-insensitive)
    #[arg(long)]
    agent: Option<String>,

    /// Cron job ranking
    #[arg(long, conflicts_with = "models")]
    crons: bool,

    /// Model ranking with token totals
    #[arg(long)]
    models: bool,

    /// Full report (default)
    #[arg(long, conflicts_with_all = ["crons", "models"])]
    full: bool,

    /// Output format: text or json
    #[arg(long)]
    format: Option<OutputFormat>,

    /// OpenClaw data directory (defaults to ~/.openclaw)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Configuration file (defaults to <data-dir>/costctl.yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Session files parsed in parallel
    #[arg(long)]
    concurrency: Option<usize>,
}

impl ReportArgs {
    fn view(&self) -> ReportView {
        if self.crons {
            ReportView::Crons
        } else if self.models {
            ReportView::Models
        } else {
            ReportView::Full
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("costctl failed: {:#}", e);
            eprintln!("Error: {:#}", e);
            if let Some(hint) = e.downcast_ref::<CostctlError>().and_then(|e| e.guidance()) {
                eprintln!("Hint: {}", hint);
            }
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Report(args) => {
            let settings = Settings::resolve(Overrides {
                data_dir: args.data_dir.clone(),
                config_path: args.config.clone(),
                format: args.format,
                period: args.period,
                concurrency: args.concurrency,
                log_dir: cli.log_dir,
            })?;

            let guard = setup_logging(&settings, cli.verbose)?;
            debug!(
                config_file = ?settings.config_file,
                log_file = guard.has_file_output(),
                format = %settings.format,
                "resolved settings"
            );
            report(&settings, &args)
        }
    }
}

/// Set up logging from resolved settings and the verbosity count.
fn setup_logging(settings: &Settings, verbosity: u8) -> costctl_core::Result<LogGuard> {
    init_logging(settings.log_dir.clone(), verbosity)
}

fn report(settings: &Settings, args: &ReportArgs) -> anyhow::Result<()> {
    let now = Local::now();
    let period = settings.period;

    let walker = SessionWalker::new(&settings.data_dir)
        .with_not_before(period.not_before(&now))
        .with_concurrency(settings.concurrency);

    info!(
        data_dir = %walker.root().display(),
        period = %period,
        concurrency = walker.concurrency(),
        "starting report"
    );

    let sessions = walk(&walker)?;
    let mut sessions = filter_by_period(sessions, period, &now);
    if let Some(agent) = &args.agent {
        sessions = filter_by_agent(sessions, agent);
    }

    let result = aggregate(&sessions);
    info!(
        sessions = result.total_sessions,
        cost = result.total_cost,
        "aggregated sessions"
    );

    println!("{}", render(&result, args.view(), settings.format)?);
    Ok(())
}

/// Walk sequentially, or on a Tokio runtime when parsing in parallel.
fn walk(walker: &SessionWalker) -> anyhow::Result<Vec<Session>> {
    if walker.concurrency() <= 1 {
        return Ok(walker.walk()?);
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    Ok(runtime.block_on(walker.walk_parallel())?)
}
