use std::sync::Arc;

use anyhow::{Context as _, Result};

use crate::{
    cli::create_spinner,
    feed::build_catalog,
    imaging::{
        process::{process_all, ProcessSummary},
        ImageTool, Magick,
    },
    promote::promote,
};

use super::{on_blocking_pool, Context};

/// Processes every switched-on feed and refreshes the final directory.
pub async fn process(ctx: &Context) -> Result<ProcessSummary> {
    on_blocking_pool(ctx, Arc::new(ctx.image_tool()), process_with::<Magick>).await
}

pub fn process_with<T: ImageTool + ?Sized>(ctx: &Context, tool: &T) -> Result<ProcessSummary> {
    let ledger = ctx.load_ledger()?;
    let catalog = build_catalog(ctx.date, &ctx.config.campaign);
    let paths = &ctx.config.paths;

    let bar = create_spinner("Processing images...".to_string());
    let summary = process_all(tool, &catalog, &ledger, paths, &ctx.config.campaign)
        .context("Failed to process images")?;
    bar.finish_with_message(format!("{} images processed", summary.processed));

    promote(
        &paths.figs_cropped(),
        &paths.figs_final(),
        &ctx.config.campaign,
        &paths.logo,
    )
    .context("Failed to copy final images")?;

    Ok(summary)
}
