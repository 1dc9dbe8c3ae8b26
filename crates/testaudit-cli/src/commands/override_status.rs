//! The `testaudit override` command.

use anyhow::Result;

use testaudit_core::model::{SessionId, ValidityStatus};

use super::Context;

pub async fn execute(
    ctx: &Context,
    session: SessionId,
    status: ValidityStatus,
    reason: String,
    admin: String,
) -> Result<()> {
    let (_, engine) = ctx.engine().await?;
    let a = engine
        .override_validity(session, status, &reason, &admin)
        .await?;

    println!(
        "Session {}: {} -> {} (computed {}, overridden by {})",
        a.session_id,
        a.previous_status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".into()),
        a.overall_status,
        a.computed_status,
        admin
    );
    Ok(())
}
