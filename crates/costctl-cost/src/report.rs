//! Report rendering for aggregation results.

use std::fmt::Write;

use costctl_core::OutputFormat;
use serde::Serialize;

use crate::aggregator::{AggregationResult, CostBuckets, RankedBucket};
use crate::error::Result;

/// Longest model name shown in text tables.
pub const MODEL_NAME_WIDTH: usize = 40;

/// Which report to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportView {
    /// Every dimension
    #[default]
    Full,
    /// Cron job ranking
    Crons,
    /// Model ranking with token totals
    Models,
}

#[derive(Serialize)]
struct CronReport<'a> {
    total_cron_cost: f64,
    by_cron: &'a CostBuckets,
}

#[derive(Serialize)]
struct ModelReport<'a> {
    total_cost: f64,
    by_model: &'a CostBuckets,
}

/// Render `result` as the requested view and format.
pub fn render(
    result: &AggregationResult,
    view: ReportView,
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Json => render_json(result, view),
        OutputFormat::Text => {
            let mut out = String::new();
            match view {
                ReportView::Full => write_full_text(&mut out, result)?,
                ReportView::Crons => write_cron_text(&mut out, result)?,
                ReportView::Models => write_model_text(&mut out, result)?,
            }
            Ok(out)
        }
    }
}

fn render_json(result: &AggregationResult, view: ReportView) -> Result<String> {
    let json = match view {
        ReportView::Full => serde_json::to_string_pretty(result)?,
        ReportView::Crons => serde_json::to_string_pretty(&CronReport {
            total_cron_cost: result.total_cron_cost,
            by_cron: &result.by_cron,
        })?,
        ReportView::Models => serde_json::to_string_pretty(&ModelReport {
            total_cost: result.total_cost,
            by_model: &result.by_model,
        })?,
    };
    Ok(json)
}

fn write_full_text(out: &mut String, r: &AggregationResult) -> std::fmt::Result {
    writeln!(out, "╔════════════════════════════════════════════════════════╗")?;
    writeln!(out, "║         OpenClaw Cost Observatory Report               ║")?;
    writeln!(out, "╚════════════════════════════════════════════════════════╝")?;
    writeln!(out)?;

    writeln!(out, "Total Cost:     ${:.4}", r.total_cost)?;
    writeln!(out, "Total Sessions: {}", r.total_sessions)?;
    writeln!(out, "Total Messages: {}", r.total_messages)?;
    writeln!(out)?;

    writeln!(out, "━╦━ By Agent ═╦━")?;
    write_ranking(out, &r.by_agent.ranked(r.total_cost), 15)?;
    writeln!(out)?;

    writeln!(out, "━╦━ By Session Type ═╦━")?;
    write_ranking(out, &r.by_type.ranked(r.total_cost), 15)?;
    writeln!(out)?;

    writeln!(out, "━╦━ By Model ═╦━")?;
    write_ranking(out, &r.model_ranking(), MODEL_NAME_WIDTH)?;

    if !r.by_cron.is_empty() {
        writeln!(out)?;
        writeln!(out, "━╦━ By Cron Job ═╦━")?;
        write_ranking(out, &r.by_cron.ranked(r.total_cost), 30)?;
    }

    Ok(())
}

fn write_cron_text(out: &mut String, r: &AggregationResult) -> std::fmt::Result {
    writeln!(out, "═╦═ Cron Cost Report ═╦═")?;
    writeln!(out)?;
    writeln!(out, "Total Cron Cost: ${:.4}", r.total_cron_cost)?;
    writeln!(out)?;
    writeln!(out, "Top Crons by Cost:")?;
    write_ranking(out, &r.cron_ranking(), 30)
}

fn write_model_text(out: &mut String, r: &AggregationResult) -> std::fmt::Result {
    writeln!(out, "═╦═ Model Cost Report ═╦═")?;
    writeln!(out)?;
    writeln!(out, "Total Cost: ${:.4}", r.total_cost)?;
    writeln!(out)?;
    writeln!(out, "Models by Cost:")?;
    writeln!(out, "  {:<40} {:>10} {:>12} {:>8}", "Model", "Cost", "Tokens", "%")?;
    writeln!(out, "{}", "-".repeat(75))?;

    for bucket in r.model_ranking() {
        writeln!(
            out,
            "  {:<40} ${:>8.4} {:>12} {:>7.1}%",
            truncate(&bucket.name, MODEL_NAME_WIDTH),
            bucket.cost,
            r.model_tokens(&bucket.name).total,
            bucket.percent
        )?;
    }

    Ok(())
}

fn write_ranking(out: &mut String, ranking: &[RankedBucket], width: usize) -> std::fmt::Result {
    for bucket in ranking {
        writeln!(
            out,
            "  {:<width$} ${:>8.4} ({:>5.1}%)",
            truncate(&bucket.name, width),
            bucket.cost,
            bucket.percent
        )?;
    }
    Ok(())
}

/// Shorten `s` to at most `max` characters, ending in `...` when cut.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = s.chars().take(keep).collect();
    out.push_str("...");
    out
}
