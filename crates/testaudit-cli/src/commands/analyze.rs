//! The `testaudit analyze` command.

use std::time::Duration;

use anyhow::Result;
use comfy_table::{Cell, Table};

use testaudit_core::assessment::ValidityAssessment;
use testaudit_core::engine::{BatchOutcome, ProgressReporter};
use testaudit_core::model::SessionId;

use super::Context;

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_session_start(&self, session_id: SessionId) {
        eprintln!("  Analyzing session {session_id}");
    }

    fn on_session_complete(&self, a: &ValidityAssessment) {
        eprintln!(
            "  Done: session {} [{}] severity {} ({} flags)",
            a.session_id,
            a.overall_status,
            a.severity_score,
            a.flags.len()
        );
    }

    fn on_session_error(&self, session_id: SessionId, error: &str) {
        eprintln!("  ERROR: session {session_id}: {error}");
    }

    fn on_batch_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {completed}/{total} succeeded, {failed} failed ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

pub async fn execute(
    ctx: &Context,
    sessions: Vec<SessionId>,
    all: bool,
    force: bool,
    format: String,
) -> Result<()> {
    let (_, engine) = ctx.engine().await?;
    let reporter = ConsoleReporter;

    let outcome = if all {
        engine.compute_all_completed(force, &reporter).await?
    } else {
        anyhow::ensure!(!sessions.is_empty(), "no sessions given; use --session or --all");
        engine.compute_batch(&sessions, force, &reporter).await
    };

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&outcome.assessments)?),
        _ => print_summary(&outcome),
    }

    let failed = outcome.failures.len();
    anyhow::ensure!(failed == 0, "{failed} session(s) could not be analyzed");
    Ok(())
}

fn print_summary(outcome: &BatchOutcome) {
    let mut table = Table::new();
    table.set_header(vec![
        "Session",
        "Status",
        "Computed",
        "Severity",
        "Confidence",
        "Flags",
    ]);

    for a in &outcome.assessments {
        table.add_row(vec![
            Cell::new(a.session_id),
            Cell::new(a.overall_status),
            Cell::new(a.computed_status),
            Cell::new(a.severity_score),
            Cell::new(format!("{:.2}", a.confidence_score)),
            Cell::new(a.flag_types().join(", ")),
        ]);
    }

    println!("{table}");

    for f in &outcome.failures {
        let hint = if f.retryable { " (retryable)" } else { "" };
        println!("Failed: session {}: {}{hint}", f.session_id, f.error);
    }
}
