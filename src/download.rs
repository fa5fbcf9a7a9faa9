//! Fetches single images over HTTP.

use std::{
    io::Write,
    path::Path,
    time::Duration,
};

use async_trait::async_trait;
use futures::StreamExt;
use scraper::{Html, Selector};
use tempfile::NamedTempFile;
use tracing::{debug, warn};
use url::Url;

use crate::error::{PipelineError, Result};

const USER_AGENT: &str = concat!("forecast-imagery/", env!("CARGO_PKG_VERSION"));

/// One attempt at one URL. Failures are reported as data, never raised.
#[async_trait]
pub trait Fetch {
    /// Saves the body of `url` to `dest`. Returns `false` if anything went
    /// wrong, in which case `dest` is left untouched.
    async fn fetch(&self, url: &str, dest: &Path) -> bool;

    /// Finds the URL of the first image on `page` whose `src` contains
    /// `pattern`.
    async fn resolve_image_url(&self, page: &str, pattern: &str) -> Option<String>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(HttpFetcher { client })
    }

    async fn try_fetch(&self, url: &str, dest: &Path) -> Result<()> {
        let response = self.client.get(url).send().await?.error_for_status()?;

        let dir = match dest.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(dir)?;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            file.write_all(&chunk?)?;
        }
        file.flush()?;
        file.persist(dest).map_err(|e| PipelineError::Io(e.error))?;

        Ok(())
    }

    async fn try_resolve(&self, page: &str, pattern: &str) -> Result<Option<String>> {
        let response = self.client.get(page).send().await?.error_for_status()?;
        let html = response.text().await?;

        Ok(find_image_url(page, &html, pattern))
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> bool {
        debug!(url, dest = %dest.display(), "fetching");
        match self.try_fetch(url, dest).await {
            Ok(()) => true,
            Err(e) => {
                warn!(url, error = %e, "image currently not available");
                false
            }
        }
    }

    async fn resolve_image_url(&self, page: &str, pattern: &str) -> Option<String> {
        debug!(page, pattern, "scraping image url");
        match self.try_resolve(page, pattern).await {
            Ok(Some(url)) => Some(url),
            Ok(None) => {
                warn!(page, pattern, "no matching image on page");
                None
            }
            Err(e) => {
                warn!(page, error = %e, "page currently not available");
                None
            }
        }
    }
}

/// Picks the first `<img src>` in `html` containing `pattern`. A `src` that
/// starts with the pattern is site-relative and is joined onto the page's
/// origin; any other match is used as is.
pub fn find_image_url(page: &str, html: &str, pattern: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("img[src]").ok()?;

    let src = document
        .select(&selector)
        .filter_map(|img| img.value().attr("src"))
        .find(|src| src.contains(pattern))?;

    if src.starts_with(pattern) {
        let base = Url::parse(page).ok()?;
        Some(base.join(src).ok()?.to_string())
    } else {
        Some(src.to_string())
    }
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use std::fs;

    use httpmock::prelude::*;
    use tempfile::TempDir;

    use super::*;

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn should_save_image_on_success() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/xgtwo/two_atl_2d0.png");
            then.status(200).body("png bytes");
        });
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("NHC_2day_outlook.png");

        let ok = fetcher().fetch(&server.url("/xgtwo/two_atl_2d0.png"), &dest).await;

        mock.assert();
        assert!(ok);
        assert_eq!(fs::read_to_string(&dest).unwrap(), "png bytes");
    }

    #[tokio::test]
    async fn should_leave_nothing_behind_on_404() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/missing.jpg");
            then.status(404);
        });
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("AEW_Brammer.jpg");

        let ok = fetcher().fetch(&server.url("/missing.jpg"), &dest).await;

        assert!(!ok);
        assert!(!dest.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn should_keep_previous_file_on_failure() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/down.png");
            then.status(503);
        });
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("Goes16_VIS.png");
        fs::write(&dest, b"yesterday").unwrap();

        assert!(!fetcher().fetch(&server.url("/down.png"), &dest).await);
        assert_eq!(fs::read(&dest).unwrap(), b"yesterday");
    }

    #[tokio::test]
    async fn should_resolve_scraped_image() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/missions/chem2d_mission");
            then.status(200).body(
                r#"<html><body>
                <img src="/static/logo.png">
                <img src="/missions/static//plots/duaot_000.png">
                <img src="/missions/static//plots/duaot_024.png">
                </body></html>"#,
            );
        });

        let url = fetcher()
            .resolve_image_url(&server.url("/missions/chem2d_mission"), "/missions/static//plots/")
            .await;

        assert_eq!(url, Some(server.url("/missions/static//plots/duaot_000.png")));
    }

    #[tokio::test]
    async fn should_not_resolve_unavailable_page() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/page");
            then.status(500);
        });

        assert_eq!(fetcher().resolve_image_url(&server.url("/page"), "/plots/").await, None);
    }

    #[test]
    fn should_use_absolute_match_verbatim() {
        let html = r#"<img src="https://cdn.example.org/missions/static//plots/a.png">"#;
        let url = find_image_url("https://fluid.nccs.nasa.gov/missions/x", html, "/missions/static//plots/");

        assert_eq!(url.as_deref(), Some("https://cdn.example.org/missions/static//plots/a.png"));
    }

    #[test]
    fn should_join_relative_match_onto_origin() {
        let html = r#"<p>plot</p><img src="/missions/static//plots/b.png">"#;
        let url = find_image_url(
            "https://fluid.nccs.nasa.gov/missions/chem2d_mission%2BPRDUST/?one_click=1",
            html,
            "/missions/static//plots/",
        );

        assert_eq!(url.as_deref(), Some("https://fluid.nccs.nasa.gov/missions/static//plots/b.png"));
    }

    #[test]
    fn should_find_nothing_without_match() {
        let html = r#"<img src="/static/logo.png"><img alt="no source">"#;
        assert_eq!(find_image_url("https://example.org/", html, "/plots/"), None);
    }
}
