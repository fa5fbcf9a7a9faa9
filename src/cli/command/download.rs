use std::{fmt, path::Path, time::Duration};

use anyhow::{Context as _, Result};
use tracing::info;

use crate::{
    cli::create_progress_bar,
    config::Config,
    download::{Fetch, HttpFetcher},
    feed::{build_catalog, download_feed, Feed},
    imaging::ImageTool,
    ledger::SwitchLedger,
};

use super::Context;

/// Link counts summed over every feed report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    pub good: usize,
    pub bad: usize,
}

impl DownloadSummary {
    pub fn total(&self) -> usize {
        self.good + self.bad
    }
}

impl fmt::Display for DownloadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let percent = if self.total() == 0 {
            0.0
        } else {
            self.good as f64 / self.total() as f64 * 100.0
        };
        write!(f, "{}/{} good links ({:.1}%)", self.good, self.total(), percent)
    }
}

/// Downloads every feed and writes the switch ledger.
pub async fn download(ctx: &Context) -> Result<DownloadSummary> {
    let timeout = Duration::from_secs(ctx.config.campaign.request_timeout_secs);
    let fetcher = HttpFetcher::new(timeout).context("Failed to build HTTP client")?;

    download_with(ctx, &fetcher, &ctx.image_tool()).await
}

pub async fn download_with<F, T>(ctx: &Context, fetcher: &F, tool: &T) -> Result<DownloadSummary>
where
    F: Fetch + ?Sized,
    T: ImageTool + ?Sized,
{
    let figs = ctx.config.paths.figs();
    std::fs::create_dir_all(&figs)
        .with_context(|| format!("Failed to create `{}`", figs.display()))?;

    let catalog = build_catalog(ctx.date, &ctx.config.campaign);
    let (ledger, summary) = download_all(&catalog, &ctx.config, &figs, fetcher, tool).await;

    let path = ctx.config.paths.ledger();
    ledger
        .save(&path)
        .with_context(|| format!("Failed to write switch ledger `{}`", path.display()))?;
    info!(path = %path.display(), feeds = ledger.len(), "switch ledger written");
    info!("There were a total of {}", summary);

    Ok(summary)
}

/// Attempts every feed switched on in `config`, in catalog order. Every
/// catalog feed gets a switch; feeds switched off are recorded as off.
pub async fn download_all<F, T>(
    catalog: &[Feed],
    config: &Config,
    dir: &Path,
    fetcher: &F,
    tool: &T,
) -> (SwitchLedger, DownloadSummary)
where
    F: Fetch + ?Sized,
    T: ImageTool + ?Sized,
{
    let total: usize = catalog
        .iter()
        .filter(|f| config.feed_enabled(f.id))
        .map(|f| f.files.len())
        .sum();
    let pb = create_progress_bar(total as u64, "Downloading feeds...".to_string());

    let mut ledger = SwitchLedger::new();
    let mut summary = DownloadSummary::default();

    for feed in catalog {
        if !config.feed_enabled(feed.id) {
            info!(feed = %feed.id, "switched off, skipping");
            ledger.record(feed.id, false);
            continue;
        }

        pb.set_message(feed.id.to_string());
        let report = download_feed(feed, dir, fetcher, tool, &pb).await;
        summary.good += report.good();
        summary.bad += report.bad();
        ledger.record(feed.id, report.available());
    }
    pb.finish_with_message("Downloading feeds complete");

    (ledger, summary)
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use tempfile::TempDir;

    use super::*;
    use crate::{
        cli::command::testing::context,
        feed::{downloader::testing::FakeFetcher, FeedId, UrlSource},
        imaging::testing::RecordingTool,
    };

    #[test]
    fn should_format_summary() {
        let summary = DownloadSummary { good: 3, bad: 1 };
        assert_eq!(summary.to_string(), "3/4 good links (75.0%)");
        assert_eq!(DownloadSummary::default().to_string(), "0/0 good links (0.0%)");
    }

    #[tokio::test]
    async fn should_write_one_switch_per_feed_when_everything_fails() {
        let root = TempDir::new().unwrap();
        let ctx = context(root.path());

        let summary = download_with(&ctx, &FakeFetcher::default(), &RecordingTool::default())
            .await
            .unwrap();

        let ledger = SwitchLedger::load(&ctx.config.paths.ledger()).unwrap();
        assert_eq!(ledger.len(), FeedId::ALL.len());
        assert!(ledger.iter().all(|(_, on)| !on));
        assert_eq!(summary.good, 0);
        assert!(summary.bad > 0);
    }

    #[tokio::test]
    async fn should_switch_on_feeds_with_any_success() {
        let root = TempDir::new().unwrap();
        let ctx = context(root.path());
        let fetcher = FakeFetcher::serving([
            "http://tropic.ssec.wisc.edu/real-time/sal/g16split/g16split.jpg",
            "https://www.nhc.noaa.gov/xgtwo/two_atl_5d0.png",
        ]);

        let summary = download_with(&ctx, &fetcher, &RecordingTool::default()).await.unwrap();

        let ledger = SwitchLedger::load(&ctx.config.paths.ledger()).unwrap();
        assert!(ledger.is_enabled(FeedId::SalSplit));
        assert!(ledger.is_enabled(FeedId::NhcAnalysis));
        assert!(!ledger.is_enabled(FeedId::MimicTpw));
        assert_eq!(summary.good, 2);
        assert!(ctx.config.paths.figs().join("SAL_dryAir_split.jpg").exists());
    }

    #[tokio::test]
    async fn should_record_switched_off_feeds_without_fetching() {
        let root = TempDir::new().unwrap();
        let mut ctx = context(root.path());
        ctx.config = Config::from_toml_str("[feeds]\nsal_split = false\n").unwrap();
        ctx.config.paths.root = root.path().to_path_buf();
        let fetcher = FakeFetcher::serving(["http://tropic.ssec.wisc.edu/real-time/sal/g16split/g16split.jpg"]);

        download_with(&ctx, &fetcher, &RecordingTool::default()).await.unwrap();

        let ledger = SwitchLedger::load(&ctx.config.paths.ledger()).unwrap();
        assert_eq!(ledger.len(), FeedId::ALL.len());
        assert!(!ledger.is_enabled(FeedId::SalSplit));
        assert!(!fetcher.requests().iter().any(|u| u.contains("g16split")));
    }

    #[tokio::test]
    async fn should_write_true_line_for_partial_sequence() {
        let root = TempDir::new().unwrap();
        let ctx = context(root.path());
        let catalog = build_catalog(ctx.date, &ctx.config.campaign);
        let clouds = catalog
            .iter()
            .find(|f| f.id == FeedId::UwincmCloudsAnimation)
            .unwrap();
        // frames 0 to 4 of day one
        let urls: Vec<String> = clouds.files[..5]
            .iter()
            .filter_map(|f| match &f.source {
                UrlSource::Direct(url) => Some(url.clone()),
                UrlSource::Scraped { .. } => None,
            })
            .collect();
        assert_eq!(urls.len(), 5);

        download_with(&ctx, &FakeFetcher::serving(urls), &RecordingTool::default())
            .await
            .unwrap();

        let text = std::fs::read_to_string(ctx.config.paths.ledger()).unwrap();
        assert!(text.lines().any(|l| l == "uwincm_clouds_animation = True "));
        assert!(text.lines().any(|l| l == "mimic_tpw = False "));
    }
}
