use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::{
    cli::create_spinner,
    imaging::{
        animate::{animate_all, model_animations, AnimationOptions},
        ImageTool, Magick,
    },
};

use super::{on_blocking_pool, Context};

/// Animates the raw model frames in `figs`. Returns the number of movies.
pub async fn animate(ctx: &Context) -> Result<usize> {
    on_blocking_pool(ctx, Arc::new(ctx.image_tool()), animate_with::<Magick>).await
}

pub fn animate_with<T: ImageTool + ?Sized>(ctx: &Context, tool: &T) -> Result<usize> {
    let ledger = ctx.load_ledger()?;
    let campaign = &ctx.config.campaign;

    let bar = create_spinner("Creating animations...".to_string());
    let written = animate_all(
        tool,
        &ctx.config.paths.figs(),
        &model_animations(campaign),
        &ledger,
        AnimationOptions::from(campaign),
    )?;
    bar.finish_with_message(format!("{} animations created", written));
    info!(written, "creating animations complete");

    Ok(written)
}
