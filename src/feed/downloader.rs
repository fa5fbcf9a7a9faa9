//! Attempts every file of a feed and reduces the outcomes to one switch.

use std::path::Path;

use indicatif::ProgressBar;
use tracing::{debug, info, warn};

use crate::{
    download::Fetch,
    imaging::{apply_conversion, ImageTool},
};

use super::{Feed, FeedId, FileDescriptor, UrlSource};

/// Outcome of every attempt made for one feed, in attempt order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedReport {
    pub feed: FeedId,
    pub outcomes: Vec<bool>,
}

impl FeedReport {
    pub fn good(&self) -> usize {
        self.outcomes.iter().filter(|ok| **ok).count()
    }

    pub fn bad(&self) -> usize {
        self.outcomes.len() - self.good()
    }

    /// The feed's switch.
    pub fn available(&self) -> bool {
        resolve(&self.outcomes)
    }
}

/// A feed is available when at least one attempt succeeded.
pub fn resolve(outcomes: &[bool]) -> bool {
    outcomes.iter().any(|ok| *ok)
}

/// Downloads every file of `feed` into `dir`, in order, one attempt each
/// plus the descriptor's fallback when the first attempt fails.
pub async fn download_feed<F, T>(
    feed: &Feed,
    dir: &Path,
    fetcher: &F,
    tool: &T,
    progress: &ProgressBar,
) -> FeedReport
where
    F: Fetch + ?Sized,
    T: ImageTool + ?Sized,
{
    info!(feed = %feed.id, files = feed.files.len(), "downloading feed");
    let mut outcomes = Vec::with_capacity(feed.files.len());

    for file in &feed.files {
        let dest = dir.join(&file.file_name);

        let mut ok = attempt(fetcher, &file.source, &dest).await;
        outcomes.push(ok);

        if !ok {
            if let Some(fallback) = &file.fallback {
                info!(file = %file.file_name, "trying a different time");
                ok = attempt(fetcher, fallback, &dest).await;
                outcomes.push(ok);
            }
        }

        if ok {
            convert(tool, dir, file);
        }
        progress.inc(1);
    }

    let report = FeedReport {
        feed: feed.id,
        outcomes,
    };
    if !report.available() {
        warn!(feed = %feed.id, attempts = report.outcomes.len(), "feed unavailable");
    }

    report
}

async fn attempt<F: Fetch + ?Sized>(fetcher: &F, source: &UrlSource, dest: &Path) -> bool {
    debug!(%source, "attempting");
    match source {
        UrlSource::Direct(url) => fetcher.fetch(url, dest).await,
        UrlSource::Scraped { page, pattern } => match fetcher.resolve_image_url(page, pattern).await {
            Some(url) => fetcher.fetch(&url, dest).await,
            None => false,
        },
    }
}

fn convert<T: ImageTool + ?Sized>(tool: &T, dir: &Path, file: &FileDescriptor) {
    let Some(conversion) = &file.conversion else {
        return;
    };

    debug!(file = %file.file_name, ?conversion, "converting");
    if let Err(e) = apply_conversion(tool, dir, &file.file_name, conversion) {
        warn!(file = %file.file_name, error = %e, "conversion failed");
    }
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod testing {
    use std::{collections::HashSet, fs, path::Path, sync::Mutex};

    use async_trait::async_trait;

    use crate::download::Fetch;

    /// Serves a fixed set of URLs and records every request.
    #[derive(Default)]
    pub struct FakeFetcher {
        pub available: HashSet<String>,
        /// Scrape results keyed by page URL.
        pub pages: Vec<(String, String)>,
        pub requests: Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        pub fn serving<I, S>(urls: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            FakeFetcher {
                available: urls.into_iter().map(Into::into).collect(),
                ..Self::default()
            }
        }

        pub fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Fetch for FakeFetcher {
        async fn fetch(&self, url: &str, dest: &Path) -> bool {
            self.requests.lock().unwrap().push(url.to_string());
            if self.available.contains(url) {
                fs::write(dest, url).unwrap();
                true
            } else {
                false
            }
        }

        async fn resolve_image_url(&self, page: &str, _pattern: &str) -> Option<String> {
            self.pages
                .iter()
                .find(|(p, _)| p == page)
                .map(|(_, url)| url.clone())
        }
    }
}

#[cfg(test)]
mod test {
    use std::fs;

    use tempfile::TempDir;

    use super::{testing::FakeFetcher, *};
    use crate::{
        feed::Conversion,
        imaging::{layout::Layout, testing::RecordingTool},
    };

    fn frame_feed(frames: usize) -> Feed {
        let files = (0..frames)
            .map(|n| {
                FileDescriptor::new(
                    format!("http://host/frame_{}.jpg", n),
                    format!("uwincm_clouds_day1_anim_{:02}.jpg", n),
                    Layout::UwincmClouds,
                )
            })
            .collect();
        Feed::sequence(FeedId::UwincmCloudsAnimation, files)
    }

    fn waves_feed() -> Feed {
        Feed::still(
            FeedId::BrammerTropicalWaves,
            vec![FileDescriptor::new("http://host/83448.0.jpg", "AEW_Brammer.jpg", Layout::TropicalWaves)
                .with_fallback("http://host/83454.0.jpg")],
        )
    }

    #[test]
    fn should_resolve_true_iff_any_success() {
        assert!(!resolve(&[]));
        assert!(!resolve(&[false, false, false]));
        assert!(resolve(&[false, true, false]));
        assert!(resolve(&[true; 12]));
    }

    #[tokio::test]
    async fn should_retry_once_with_fallback() {
        let dir = TempDir::new().unwrap();
        let fetcher = FakeFetcher::serving(["http://host/83454.0.jpg"]);
        let tool = RecordingTool::default();

        let report = download_feed(&waves_feed(), dir.path(), &fetcher, &tool, &ProgressBar::hidden()).await;

        assert_eq!(report.outcomes, vec![false, true]);
        assert!(report.available());
        assert_eq!(fetcher.requests().len(), 2);
        assert!(dir.path().join("AEW_Brammer.jpg").exists());
    }

    #[tokio::test]
    async fn should_not_retry_after_first_success() {
        let dir = TempDir::new().unwrap();
        let fetcher = FakeFetcher::serving(["http://host/83448.0.jpg", "http://host/83454.0.jpg"]);
        let tool = RecordingTool::default();

        let report = download_feed(&waves_feed(), dir.path(), &fetcher, &tool, &ProgressBar::hidden()).await;

        assert_eq!(report.outcomes, vec![true]);
        assert_eq!(fetcher.requests(), vec!["http://host/83448.0.jpg".to_string()]);
    }

    #[tokio::test]
    async fn should_record_both_failed_attempts() {
        let dir = TempDir::new().unwrap();
        let fetcher = FakeFetcher::default();
        let tool = RecordingTool::default();

        let report = download_feed(&waves_feed(), dir.path(), &fetcher, &tool, &ProgressBar::hidden()).await;

        assert_eq!(report.outcomes, vec![false, false]);
        assert_eq!(report.bad(), 2);
        assert!(!report.available());
    }

    #[tokio::test]
    async fn should_enable_partial_sequence() {
        let dir = TempDir::new().unwrap();
        let fetcher = FakeFetcher::serving((0..5).map(|n| format!("http://host/frame_{}.jpg", n)));
        let tool = RecordingTool::default();

        let report = download_feed(&frame_feed(12), dir.path(), &fetcher, &tool, &ProgressBar::hidden()).await;

        assert_eq!(report.outcomes.len(), 12);
        assert_eq!(report.good(), 5);
        assert_eq!(report.bad(), 7);
        assert!(report.available());
        // frames attempted in index order
        let requests = fetcher.requests();
        assert_eq!(requests[0], "http://host/frame_0.jpg");
        assert_eq!(requests[11], "http://host/frame_11.jpg");
    }

    #[tokio::test]
    async fn should_disable_failed_single_image() {
        let dir = TempDir::new().unwrap();
        let feed = Feed::still(
            FeedId::SalSplit,
            vec![FileDescriptor::new("http://host/g16split.jpg", "SAL_dryAir_split.jpg", Layout::SalSplit)],
        );
        let tool = RecordingTool::default();

        let report =
            download_feed(&feed, dir.path(), &FakeFetcher::default(), &tool, &ProgressBar::hidden()).await;

        assert_eq!(report.outcomes, vec![false]);
        assert!(!report.available());
        assert!(!dir.path().join("SAL_dryAir_split.jpg").exists());
    }

    #[tokio::test]
    async fn should_count_failed_scrape_as_failed_attempt() {
        let dir = TempDir::new().unwrap();
        let feed = Feed::still(
            FeedId::NasaGeos,
            vec![
                FileDescriptor::scraped("http://geos/a", "/plots/", "GEOS_dust_aot.png", Layout::GeosDust),
                FileDescriptor::scraped("http://geos/b", "/plots/", "GEOS_total_aot.png", Layout::GeosTotal),
            ],
        );
        let fetcher = FakeFetcher {
            available: ["http://geos/plots/b.png".to_string()].into_iter().collect(),
            pages: vec![("http://geos/b".to_string(), "http://geos/plots/b.png".to_string())],
            ..FakeFetcher::default()
        };
        let tool = RecordingTool::default();

        let report = download_feed(&feed, dir.path(), &fetcher, &tool, &ProgressBar::hidden()).await;

        assert_eq!(report.outcomes, vec![false, true]);
        assert_eq!(fetcher.requests(), vec!["http://geos/plots/b.png".to_string()]);
    }

    #[tokio::test]
    async fn should_convert_only_fetched_files() {
        let dir = TempDir::new().unwrap();
        let feed = Feed::still(
            FeedId::NhcAnalysis,
            vec![
                FileDescriptor::new("http://nhc/USA_latest.gif", "NHC_surface_analysis.gif", Layout::NhcSurface)
                    .with_conversion(Conversion::Coalesce {
                        output: "NHC_surface_analysis.png".to_string(),
                    }),
                FileDescriptor::new("http://nhc/two_atl_2d0.png", "NHC_2day_outlook.png", Layout::NhcOutlook),
            ],
        );
        let fetcher = FakeFetcher::serving(["http://nhc/USA_latest.gif"]);
        let tool = RecordingTool::default();

        let report = download_feed(&feed, dir.path(), &fetcher, &tool, &ProgressBar::hidden()).await;

        assert_eq!(report.outcomes, vec![true, false]);
        assert_eq!(tool.commands().len(), 1);
        assert!(fs::metadata(dir.path().join("NHC_surface_analysis.png")).is_ok());
    }
}
