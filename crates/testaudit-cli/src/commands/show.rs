//! The `testaudit show` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use testaudit_core::assessment::ValidityAssessment;
use testaudit_core::model::SessionId;
use testaudit_report::{generate_assessment_html, write_assessment_html};

use super::{emit, Context};

pub async fn execute(
    ctx: &Context,
    session: SessionId,
    format: String,
    output: Option<PathBuf>,
) -> Result<()> {
    let (_, engine) = ctx.engine().await?;
    let a = engine.get_validity(session).await?;

    if let ("html", Some(path)) = (format.as_str(), output.as_deref()) {
        write_assessment_html(&a, path)?;
        eprintln!("Written to: {}", path.display());
        return Ok(());
    }

    let content = match format.as_str() {
        "json" => serde_json::to_string_pretty(&a)?,
        "html" => generate_assessment_html(&a),
        _ => render_text(&a),
    };
    emit(&content, output.as_deref())
}

fn render_text(a: &ValidityAssessment) -> String {
    let mut out = format!(
        "Session {}: {} (computed {}, severity {}, confidence {:.2})\n",
        a.session_id, a.overall_status, a.computed_status, a.severity_score, a.confidence_score
    );
    out.push_str(&format!(
        "Computed at {}\n",
        a.computed_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    if a.is_overridden() {
        out.push_str(&format!(
            "Overridden by {} (was {}): {}\n",
            a.overridden_by.as_deref().unwrap_or("-"),
            a.previous_status.map(|s| s.to_string()).unwrap_or_else(|| "-".into()),
            a.override_reason.as_deref().unwrap_or("")
        ));
    }

    if a.flags.is_empty() {
        out.push_str("No flags raised.");
        return out;
    }

    let mut table = Table::new();
    table.set_header(vec!["Flag", "Severity", "Points"]);
    for flag in &a.flags {
        table.add_row(vec![
            Cell::new(flag.flag_type()),
            Cell::new(flag.severity),
            Cell::new(flag.severity_points()),
        ]);
    }
    out.push_str(&table.to_string());
    out
}
