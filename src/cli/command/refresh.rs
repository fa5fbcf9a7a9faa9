//! Mid-day refresh of the observed imagery.
//!
//! Backs up the observed slides in `figs_final`, downloads the observed feeds
//! again, lays them out and puts them back under their slide names. Forecast
//! model slides and the switch ledger on disk are left as the daily run wrote
//! them.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::{Context as _, Result};
use tracing::{info, warn};

use crate::{
    config::Campaign,
    download::{Fetch, HttpFetcher},
    feed::{build_catalog, Conversion, Feed, FeedId},
    imaging::{
        animate::numbered_frames,
        composite::{merge_infrared, MERGED_INFRARED},
        layout::Layout,
        process::{outputs, process_feeds},
        ImageTool,
    },
    ledger::SwitchLedger,
    promote::slide_images,
};

use super::{
    download::{download_all, DownloadSummary},
    on_blocking_pool, Context,
};

/// Feeds carrying observations rather than model forecasts.
pub const OBSERVED_FEEDS: [FeedId; 6] = [
    FeedId::NhcAnalysis,
    FeedId::MimicTpw,
    FeedId::Goes16Sat,
    FeedId::MeteosatSat,
    FeedId::SalSplit,
    FeedId::IcapAerosolEnsemble,
];

/// A final slide fed by observed imagery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedSlide {
    /// Feeds that must all be available for the slide to be replaced.
    pub feeds: Vec<FeedId>,
    /// Name in `figs_cropped`.
    pub name: String,
    /// Name in `figs_final`.
    pub slide: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub backed_up: usize,
    pub download: DownloadSummary,
    pub replaced: usize,
}

/// Slides produced by `catalog`'s observed feeds, in feed order.
pub fn observed_slides(
    catalog: &[Feed],
    figs: &Path,
    campaign: &Campaign,
    logo: &str,
) -> Result<Vec<ObservedSlide>> {
    let slides = slide_images(campaign, logo);
    let slide_name = |name: &str| {
        slides
            .iter()
            .find(|(processed, _)| processed == name)
            .map(|(_, slide)| slide.clone())
    };

    let mut observed = Vec::new();
    for feed in catalog.iter().filter(|f| OBSERVED_FEEDS.contains(&f.id)) {
        for file in feed.files.iter().filter(|f| f.layout != Layout::Raw) {
            for (_, name) in outputs(figs, file)? {
                if let Some(slide) = slide_name(&name) {
                    observed.push(ObservedSlide {
                        feeds: vec![feed.id],
                        name,
                        slide,
                    });
                }
            }
        }
    }

    if let Some(slide) = slide_name(MERGED_INFRARED) {
        observed.push(ObservedSlide {
            feeds: vec![FeedId::Goes16Sat, FeedId::MeteosatSat],
            name: MERGED_INFRARED.to_string(),
            slide,
        });
    }

    Ok(observed)
}

/// First free `<stem>_backup_NN.<ext>` beside `path`.
pub fn backup_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut n = 0;
    loop {
        let candidate = path.with_file_name(format!("{}_backup_{:02}{}", stem, n, ext));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

/// Copies every existing slide in `fin` to its next backup name.
pub fn back_up_slides(fin: &Path, slides: &[ObservedSlide]) -> Result<usize> {
    let mut backed_up = 0;

    for slide in slides {
        let current = fin.join(&slide.slide);
        if !current.is_file() {
            warn!(file = %slide.slide, "not present and cannot be backed up");
            continue;
        }
        let backup = backup_path(&current);
        fs::copy(&current, &backup)
            .with_context(|| format!("Failed to back up `{}`", current.display()))?;
        info!(backup = %backup.display(), "slide backed up");
        backed_up += 1;
    }

    Ok(backed_up)
}

/// Removes frames extracted by an earlier download of the observed feeds.
fn clear_extracted_frames(catalog: &[Feed], figs: &Path) -> Result<()> {
    for file in catalog.iter().flat_map(|f| &f.files) {
        let Some(Conversion::Frames { stem, .. }) = &file.conversion else {
            continue;
        };
        for (_, path) in numbered_frames(figs, &format!("{}-", stem))? {
            fs::remove_file(&path)?;
        }
    }

    Ok(())
}

/// Lays out the fresh downloads and copies the slides of available feeds
/// back into `figs_final`. Returns the number of slides replaced.
fn replace_slides<T: ImageTool + ?Sized>(
    ctx: &Context,
    tool: &T,
    catalog: &[Feed],
    ledger: &SwitchLedger,
    slides: &[ObservedSlide],
) -> Result<usize> {
    let paths = &ctx.config.paths;
    let (figs, cropped, fin) = (paths.figs(), paths.figs_cropped(), paths.figs_final());

    process_feeds(tool, catalog, ledger, &figs, &cropped).context("Failed to process images")?;
    if let Err(e) = merge_infrared(tool, &cropped, ledger) {
        warn!(error = %e, "cannot merge infrared images");
    }

    let mut replaced = 0;
    for slide in slides
        .iter()
        .filter(|s| s.feeds.iter().all(|feed| ledger.is_enabled(*feed)))
    {
        let source = cropped.join(&slide.name);
        if !source.is_file() {
            warn!(file = %slide.name, "not present and cannot be copied over");
            continue;
        }
        fs::copy(&source, fin.join(&slide.slide))
            .with_context(|| format!("Failed to copy `{}`", source.display()))?;
        replaced += 1;
    }

    Ok(replaced)
}

pub async fn refresh(ctx: &Context) -> Result<RefreshSummary> {
    let timeout = Duration::from_secs(ctx.config.campaign.request_timeout_secs);
    let fetcher = HttpFetcher::new(timeout).context("Failed to build HTTP client")?;

    refresh_with(ctx, &fetcher, Arc::new(ctx.image_tool())).await
}

pub async fn refresh_with<F, T>(ctx: &Context, fetcher: &F, tool: Arc<T>) -> Result<RefreshSummary>
where
    F: Fetch + ?Sized,
    T: ImageTool + Send + Sync + 'static,
{
    let paths = &ctx.config.paths;
    let (figs, cropped, fin) = (paths.figs(), paths.figs_cropped(), paths.figs_final());
    for dir in [&figs, &cropped, &fin] {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create `{}`", dir.display()))?;
    }

    let catalog: Vec<Feed> = build_catalog(ctx.date, &ctx.config.campaign)
        .into_iter()
        .filter(|f| OBSERVED_FEEDS.contains(&f.id))
        .collect();
    let slides = observed_slides(&catalog, &figs, &ctx.config.campaign, &paths.logo)?;

    let mut summary = RefreshSummary {
        backed_up: back_up_slides(&fin, &slides)?,
        ..RefreshSummary::default()
    };

    clear_extracted_frames(&catalog, &figs).context("Failed to clear old frames")?;
    let (ledger, download) = download_all(&catalog, &ctx.config, &figs, fetcher, &*tool).await;
    summary.download = download;

    summary.replaced = on_blocking_pool(ctx, tool, move |ctx, tool: &T| {
        replace_slides(ctx, tool, &catalog, &ledger, &slides)
    })
    .await?;

    info!(
        backed_up = summary.backed_up,
        replaced = summary.replaced,
        "Refresh complete. There were a total of {}",
        summary.download
    );

    Ok(summary)
}

// -- Tests -------------------------------------------------------------------
