use std::fmt::Write;

use anyhow::Result;

use crate::feed::{build_catalog, FeedKind};

use super::Context;

/// One line per feed: name, kind, file count and download toggle.
pub fn catalog(ctx: &Context) -> Result<String> {
    let mut out = String::new();

    for feed in build_catalog(ctx.date, &ctx.config.campaign) {
        let kind = match feed.kind {
            FeedKind::Still => "still",
            FeedKind::Sequence => "sequence",
        };
        let toggle = if ctx.config.feed_enabled(feed.id) { "on" } else { "off" };
        writeln!(out, "{:<32} {:<8} {:>4} files  {}", feed.id, kind, feed.files.len(), toggle)?;
    }

    Ok(out)
}

// -- Tests -------------------------------------------------------------------
