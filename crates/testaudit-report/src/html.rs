//! HTML report generator.
//!
//! Produces self-contained HTML files with all CSS/JS inlined.

use anyhow::{Context, Result};
use std::path::Path;

use testaudit_core::assessment::ValidityAssessment;
use testaudit_core::flags::ValidityFlag;
use testaudit_core::model::ValidityStatus;
use testaudit_core::report::{direction_label, ValidityReport};

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn status_class(status: ValidityStatus) -> &'static str {
    match status {
        ValidityStatus::Valid => "valid",
        ValidityStatus::Suspect => "suspect",
        ValidityStatus::Invalid => "invalid",
        ValidityStatus::Incomplete => "incomplete",
    }
}

/// Flag payload without the type and severity, as `key=value` pairs.
fn flag_details(flag: &ValidityFlag) -> String {
    let Ok(serde_json::Value::Object(fields)) = serde_json::to_value(flag) else {
        return String::new();
    };
    fields
        .iter()
        .filter(|(k, _)| k.as_str() != "flag_type" && k.as_str() != "severity")
        .map(|(k, v)| match v {
            serde_json::Value::Number(n) if n.is_f64() => {
                format!("{k}={:.3}", n.as_f64().unwrap_or_default())
            }
            other => format!("{k}={other}"),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn push_head(html: &mut String, title: &str) {
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!("<title>{}</title>\n", html_escape(title)));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");
}

fn push_raw_json<T: serde::Serialize>(html: &mut String, value: &T) {
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(value).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");
}

/// Generate an HTML page from a validity report.
pub fn generate_report_html(report: &ValidityReport) -> String {
    let s = &report.summary;
    let mut html = String::new();

    push_head(
        &mut html,
        &format!("testaudit validity report, last {} days", report.period_days),
    );

    html.push_str("<header>\n");
    html.push_str("<h1>testaudit validity report</h1>\n");
    let filter = report
        .status_filter
        .map(|f| format!(" | status: {f}"))
        .unwrap_or_default();
    html.push_str(&format!(
        "<p class=\"meta\">Last {} days | {} sessions{} | generated {}</p>\n",
        report.period_days,
        s.total,
        html_escape(&filter),
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    // Summary dashboard
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Summary</h2>\n");
    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>Valid</th><th>Suspect</th><th>Invalid</th><th>Overridden</th><th>Avg severity</th><th>Avg confidence</th></tr></thead>\n");
    html.push_str(&format!(
        "<tbody><tr><td class=\"valid\">{}</td><td class=\"suspect\">{}</td><td class=\"invalid\">{}</td><td>{}</td><td>{:.2}</td><td>{:.2}</td></tr></tbody></table>\n",
        s.valid, s.suspect, s.invalid, s.overridden, s.average_severity, s.average_confidence
    ));
    if s.total > 0 {
        html.push_str(&generate_status_chart(report));
    }
    html.push_str(&format!(
        "<p class=\"trend\">Flagged rate: {:.1}% over 7 days ({} sessions) vs {:.1}% over 30 days ({} sessions), <strong>{}</strong></p>\n",
        report.trend.flagged_rate_7d * 100.0,
        report.trend.sessions_7d,
        report.trend.flagged_rate_30d * 100.0,
        report.trend.sessions_30d,
        direction_label(report.trend.direction)
    ));
    html.push_str("</section>\n");

    if !report.by_flag_type.is_empty() {
        html.push_str("<section class=\"flags\">\n<h2>Flags</h2>\n");
        html.push_str("<table>\n<thead><tr><th>Flag</th><th>Sessions</th></tr></thead>\n<tbody>\n");
        for (flag, count) in &report.by_flag_type {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{count}</td></tr>\n",
                html_escape(flag)
            ));
        }
        html.push_str("</tbody></table>\n</section>\n");
    }

    html.push_str("<section class=\"review\">\n<h2>Needs review</h2>\n");
    if report.action_needed.is_empty() {
        html.push_str("<p>No sessions waiting for review.</p>\n");
    } else {
        html.push_str("<table class=\"results-table\" id=\"results\">\n");
        html.push_str("<thead><tr><th onclick=\"sortTable(0)\">Session</th><th onclick=\"sortTable(1)\">Status</th><th onclick=\"sortTable(2)\">Severity</th><th onclick=\"sortTable(3)\">Flags</th><th onclick=\"sortTable(4)\">Computed</th></tr></thead>\n");
        html.push_str("<tbody>\n");
        for item in &report.action_needed {
            let class = status_class(item.status);
            html.push_str(&format!(
                "<tr class=\"{class}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                item.session_id,
                item.status,
                item.severity_score,
                html_escape(&item.flag_types.join(", ")),
                item.computed_at.format("%Y-%m-%d %H:%M")
            ));
        }
        html.push_str("</tbody></table>\n");
    }
    html.push_str("</section>\n");

    push_raw_json(&mut html, report);

    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Generate an HTML page for a single session's assessment.
pub fn generate_assessment_html(assessment: &ValidityAssessment) -> String {
    let a = assessment;
    let mut html = String::new();

    push_head(&mut html, &format!("testaudit session {}", a.session_id));

    html.push_str("<header>\n");
    html.push_str(&format!("<h1>Session {}</h1>\n", a.session_id));
    html.push_str(&format!(
        "<p class=\"meta\">Status: <strong class=\"{}\">{}</strong> | computed {} | severity {} | confidence {:.2}</p>\n",
        status_class(a.overall_status),
        a.overall_status,
        a.computed_status,
        a.severity_score,
        a.confidence_score
    ));
    html.push_str("</header>\n");

    if a.is_overridden() {
        html.push_str("<section class=\"override\">\n<h2>Override</h2>\n<ul>\n");
        if let Some(by) = &a.overridden_by {
            html.push_str(&format!("<li>By: {}</li>\n", html_escape(by)));
        }
        if let Some(at) = a.overridden_at {
            html.push_str(&format!("<li>At: {}</li>\n", at.format("%Y-%m-%d %H:%M:%S UTC")));
        }
        if let Some(previous) = a.previous_status {
            html.push_str(&format!("<li>Previous status: {previous}</li>\n"));
        }
        if let Some(reason) = &a.override_reason {
            html.push_str(&format!("<li>Reason: {}</li>\n", html_escape(reason)));
        }
        html.push_str("</ul>\n</section>\n");
    }

    html.push_str("<section class=\"flags\">\n<h2>Flags</h2>\n");
    if a.flags.is_empty() {
        html.push_str("<p>No flags raised.</p>\n");
    } else {
        html.push_str("<table>\n<thead><tr><th>Flag</th><th>Severity</th><th>Details</th></tr></thead>\n<tbody>\n");
        for flag in &a.flags {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                flag.flag_type(),
                flag.severity,
                html_escape(&flag_details(flag))
            ));
        }
        html.push_str("</tbody></table>\n");
    }
    html.push_str("</section>\n");

    push_raw_json(&mut html, a);

    html.push_str("</body>\n</html>");
    html
}

/// Write a report page to a file.
pub fn write_html_report(report: &ValidityReport, path: &Path) -> Result<()> {
    write_page(&generate_report_html(report), path)
}

/// Write a single-assessment page to a file.
pub fn write_assessment_html(assessment: &ValidityAssessment, path: &Path) -> Result<()> {
    write_page(&generate_assessment_html(assessment), path)
}

fn write_page(html: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html).with_context(|| format!("failed to write {}", path.display()))
}

fn generate_status_chart(report: &ValidityReport) -> String {
    let bar_height = 30;
    let max_width = 400;
    let padding = 10;
    let label_width = 100;

    let s = &report.summary;
    let rows = [
        (ValidityStatus::Valid, s.valid, "#22c55e"),
        (ValidityStatus::Suspect, s.suspect, "#eab308"),
        (ValidityStatus::Invalid, s.invalid, "#ef4444"),
    ];
    let total = s.total.max(1) as f64;
    let total_height = rows.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, (status, count, color)) in rows.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let share = *count as f64 / total;
        let width = (share * max_width as f64) as usize;

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            status
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{} ({:.1}%)</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            count,
            share * 100.0
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --valid: #dcfce7; --suspect: #fef9c3; --invalid: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --valid: #064e3b; --suspect: #713f12; --invalid: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta, .trend { color: #6b7280; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); cursor: pointer; }
.valid { background: var(--valid); }
.suspect { background: var(--suspect); }
.invalid { background: var(--invalid); }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('results');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = !(table.dataset.sortCol == col && table.dataset.sortDir == 'asc');
  const key = cell => isNaN(cell.textContent) ? cell.textContent : Number(cell.textContent);
  rows.sort((a, b) => {
    const va = key(a.cells[col]);
    const vb = key(b.cells[col]);
    const cmp = typeof va === 'number' && typeof vb === 'number' ? va - vb : String(va).localeCompare(String(vb));
    return asc ? cmp : -cmp;
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;
