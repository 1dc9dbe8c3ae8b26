//! The `testaudit report` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use testaudit_core::model::ValidityStatus;
use testaudit_core::report::{direction_label, ValidityReport};
use testaudit_report::{generate_report_html, write_html_report};

use super::{emit, Context};

pub async fn execute(
    ctx: &Context,
    days: Option<u32>,
    status: Option<ValidityStatus>,
    format: String,
    output: Option<PathBuf>,
    fail_on_pending: bool,
) -> Result<()> {
    let (config, engine) = ctx.engine().await?;
    let days = days.unwrap_or(config.report_days);
    anyhow::ensure!(days >= 1, "days must be at least 1");

    let report = engine.get_validity_report(days, status).await?;

    match (format.as_str(), output.as_deref()) {
        ("json", Some(path)) => {
            report.save_json(path)?;
            eprintln!("Written to: {}", path.display());
        }
        ("html", Some(path)) => {
            write_html_report(&report, path)?;
            eprintln!("Written to: {}", path.display());
        }
        (format, output) => {
            let content = match format {
                "json" => serde_json::to_string_pretty(&report)?,
                "markdown" | "md" => report.to_markdown(),
                "html" => generate_report_html(&report),
                _ => render_text(&report),
            };
            emit(&content, output)?;
        }
    }

    if fail_on_pending && report.has_pending_reviews() {
        std::process::exit(1);
    }

    Ok(())
}

fn render_text(report: &ValidityReport) -> String {
    let s = &report.summary;
    let mut out = format!(
        "Validity report, last {} days: {} sessions, {} valid, {} suspect, {} invalid ({} overridden)\n",
        report.period_days, s.total, s.valid, s.suspect, s.invalid, s.overridden
    );
    out.push_str(&format!(
        "Average severity {:.2}, average confidence {:.2}\n",
        s.average_severity, s.average_confidence
    ));
    out.push_str(&format!(
        "Trend: {:.1}% flagged (7d) vs {:.1}% flagged (30d), {}\n",
        report.trend.flagged_rate_7d * 100.0,
        report.trend.flagged_rate_30d * 100.0,
        direction_label(report.trend.direction)
    ));

    if !report.by_flag_type.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Flag", "Sessions"]);
        for (flag, count) in &report.by_flag_type {
            table.add_row(vec![Cell::new(flag), Cell::new(count)]);
        }
        out.push_str(&format!("\n{table}\n"));
    }

    if report.action_needed.is_empty() {
        out.push_str("\nNo sessions waiting for review.");
    } else {
        let mut table = Table::new();
        table.set_header(vec!["Session", "Status", "Severity", "Flags"]);
        for item in &report.action_needed {
            table.add_row(vec![
                Cell::new(item.session_id),
                Cell::new(item.status),
                Cell::new(item.severity_score),
                Cell::new(item.flag_types.join(", ")),
            ]);
        }
        out.push_str(&format!("\nNeeds review:\n{table}"));
    }
    out
}
