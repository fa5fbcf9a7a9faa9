//! The daily run: archive, download, animate, process.

use std::{sync::Arc, time::Duration};

use anyhow::{Context as _, Result};
use tracing::info;

use crate::{
    archive::ArchiveOutcome,
    download::{Fetch, HttpFetcher},
    imaging::{process::ProcessSummary, ImageTool},
};

use super::{
    animate::animate_with, archive::archive, download::download_with, download::DownloadSummary,
    on_blocking_pool, process::process_with, Context,
};

/// Stages of a run, strictly in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Downloading,
    LedgerWritten,
    Processing,
    Done,
}

impl RunPhase {
    pub fn next(self) -> Option<RunPhase> {
        match self {
            RunPhase::Idle => Some(RunPhase::Downloading),
            RunPhase::Downloading => Some(RunPhase::LedgerWritten),
            RunPhase::LedgerWritten => Some(RunPhase::Processing),
            RunPhase::Processing => Some(RunPhase::Done),
            RunPhase::Done => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub phases: Vec<RunPhase>,
    pub archive: Option<ArchiveOutcome>,
    pub download: Option<DownloadSummary>,
    pub animations: Option<usize>,
    pub processed: Option<ProcessSummary>,
}

impl RunReport {
    fn new() -> Self {
        RunReport {
            phases: vec![RunPhase::Idle],
            archive: None,
            download: None,
            animations: None,
            processed: None,
        }
    }

    fn phase(&self) -> RunPhase {
        self.phases.last().copied().unwrap_or(RunPhase::Idle)
    }

    fn advance(&mut self) {
        if let Some(next) = self.phase().next() {
            info!(phase = ?next, "entering phase");
            self.phases.push(next);
        }
    }
}

pub async fn run(ctx: &Context) -> Result<RunReport> {
    let timeout = Duration::from_secs(ctx.config.campaign.request_timeout_secs);
    let fetcher = HttpFetcher::new(timeout).context("Failed to build HTTP client")?;

    run_with(ctx, &fetcher, Arc::new(ctx.image_tool())).await
}

pub async fn run_with<F, T>(ctx: &Context, fetcher: &F, tool: Arc<T>) -> Result<RunReport>
where
    F: Fetch + ?Sized,
    T: ImageTool + Send + Sync + 'static,
{
    let stages = ctx.config.stages;
    let mut report = RunReport::new();

    if stages.archive {
        report.archive = Some(archive(ctx)?);
    }

    report.advance();
    if stages.download {
        report.download = Some(download_with(ctx, fetcher, &*tool).await?);
    } else {
        info!("download stage off, reusing the switch ledger on disk");
    }

    report.advance();
    let ledger = ctx.load_ledger()?;
    info!(
        enabled = ledger.iter().filter(|(_, on)| *on).count(),
        feeds = ledger.len(),
        "switch ledger ready"
    );

    report.advance();
    if stages.animate {
        report.animations = Some(on_blocking_pool(ctx, Arc::clone(&tool), animate_with::<T>).await?);
    }
    if stages.process {
        report.processed = Some(on_blocking_pool(ctx, Arc::clone(&tool), process_with::<T>).await?);
    }

    report.advance();
    if let Some(summary) = report.download {
        info!("Run complete. There were a total of {}", summary);
    } else {
        info!("Run complete");
    }

    Ok(report)
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::{
        cli::command::testing::context,
        feed::{downloader::testing::FakeFetcher, FeedId},
        imaging::testing::RecordingTool,
        ledger::SwitchLedger,
    };

    #[test]
    fn should_walk_phases_linearly() {
        let mut phase = RunPhase::Idle;
        let mut seen = vec![phase];
        while let Some(next) = phase.next() {
            seen.push(next);
            phase = next;
        }

        assert_eq!(
            seen,
            vec![
                RunPhase::Idle,
                RunPhase::Downloading,
                RunPhase::LedgerWritten,
                RunPhase::Processing,
                RunPhase::Done
            ]
        );
    }

    #[tokio::test]
    async fn should_run_every_stage_even_if_all_feeds_fail() {
        let root = TempDir::new().unwrap();
        let ctx = context(root.path());
        let paths = &ctx.config.paths;
        fs::create_dir_all(paths.figs()).unwrap();
        fs::write(paths.figs().join("logo_cpexcv.png"), b"logo").unwrap();

        let report = run_with(&ctx, &FakeFetcher::default(), Arc::new(RecordingTool::default()))
            .await
            .unwrap();

        assert_eq!(report.phases.last(), Some(&RunPhase::Done));
        assert!(matches!(report.archive, Some(ArchiveOutcome::Archived { moved: 0, .. })));
        assert_eq!(report.download.unwrap().good, 0);
        assert_eq!(report.animations, Some(0));
        let ledger = SwitchLedger::load(&paths.ledger()).unwrap();
        assert_eq!(ledger.len(), FeedId::ALL.len());
        assert!(paths.figs_final().join("logo_cpexcv.png").exists());
    }

    #[tokio::test]
    async fn should_process_downloaded_feed() {
        let root = TempDir::new().unwrap();
        let ctx = context(root.path());
        let fetcher = FakeFetcher::serving(["https://www.nhc.noaa.gov/xgtwo/two_atl_2d0.png"]);

        let report = run_with(&ctx, &fetcher, Arc::new(RecordingTool::default())).await.unwrap();

        let paths = &ctx.config.paths;
        assert_eq!(report.processed.unwrap().processed, 1);
        assert!(paths.figs_cropped().join("NHC_2day_outlook.png").exists());
        assert!(paths.figs_final().join("05_NHC_2day_outlook.png").exists());
    }

    #[tokio::test]
    async fn should_reuse_ledger_when_download_is_off() {
        let root = TempDir::new().unwrap();
        let mut ctx = context(root.path());
        ctx.config.stages.download = false;
        ctx.config.stages.archive = false;

        let mut ledger = SwitchLedger::new();
        ledger.record(FeedId::NhcAnalysis, true);
        ledger.save(&ctx.config.paths.ledger()).unwrap();

        let fetcher = FakeFetcher::default();
        let report = run_with(&ctx, &fetcher, Arc::new(RecordingTool::default())).await.unwrap();

        assert!(fetcher.requests().is_empty());
        assert!(report.download.is_none());
        assert_eq!(report.phases.last(), Some(&RunPhase::Done));
    }

    #[tokio::test]
    async fn should_fail_without_ledger_when_download_is_off() {
        let root = TempDir::new().unwrap();
        let mut ctx = context(root.path());
        ctx.config.stages.download = false;

        let result = run_with(&ctx, &FakeFetcher::default(), Arc::new(RecordingTool::default())).await;

        assert!(result.is_err());
    }
}
