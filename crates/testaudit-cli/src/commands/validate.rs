//! The `testaudit validate` command.

use anyhow::Result;

use testaudit_core::model::SessionStatus;
use testaudit_store::Dataset;

use super::Context;

pub fn execute(ctx: &Context) -> Result<()> {
    let config = ctx.config()?;
    let dataset = Dataset::load_dir(&config.data_dir)?;

    let counts = dataset.status_counts();
    let count = |status: SessionStatus| counts.get(&status).copied().unwrap_or(0);
    println!(
        "Dataset: {} sessions ({} completed, {} in progress, {} abandoned), {} questions",
        dataset.sessions.len(),
        count(SessionStatus::Completed),
        count(SessionStatus::InProgress),
        count(SessionStatus::Abandoned),
        dataset.questions.len()
    );

    let warnings = dataset.validate();
    for w in &warnings {
        println!("  WARNING: {w}");
    }

    if warnings.is_empty() {
        println!("Dataset valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
