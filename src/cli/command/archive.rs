use anyhow::{Context as _, Result};
use tracing::info;

use crate::archive::{archive_yesterday, ArchiveOutcome};

use super::Context;

/// Archives the final images of the day before the run date.
pub fn archive(ctx: &Context) -> Result<ArchiveOutcome> {
    let yesterday = ctx.date.yesterday();
    info!(%yesterday, "archiving yesterday's forecast");

    let outcome = archive_yesterday(&ctx.config.paths, yesterday)
        .context("Failed to archive yesterday's forecast")?;

    match &outcome {
        ArchiveOutcome::Archived { target, moved } => {
            info!(moved, target = %target.display(), "archiving yesterday's forecast complete")
        }
        ArchiveOutcome::AlreadyArchived { target } => {
            info!(target = %target.display(), "archive already populated, nothing moved")
        }
    }

    Ok(outcome)
}
