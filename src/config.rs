//! Run configuration, read from `forecast.toml`.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::info;

use crate::{
    error::{PipelineError, Result},
    feed::FeedId,
};

pub const DEFAULT_CONFIG_PATH: &str = "forecast.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub paths: Paths,

    #[serde(default)]
    pub campaign: Campaign,

    #[serde(default)]
    pub stages: Stages,

    /// Download toggles keyed by feed name.
    #[serde(default)]
    feeds: BTreeMap<String, bool>,
}

impl Config {
    /// Loads `path`, or `forecast.toml` when none is given.
    ///
    /// A missing default file yields the defaults; a missing explicit file is
    /// an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };

        if !explicit && !path.exists() {
            info!(path = %path.display(), "no configuration file, using defaults");
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&path).map_err(|source| PipelineError::ConfigRead {
            path: path.clone(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        for name in self.feeds.keys() {
            name.parse::<FeedId>()?;
        }
        if self.campaign.animation_frames == 0 {
            return Err(PipelineError::config("campaign.animation_frames must be > 0"));
        }
        if self.campaign.request_timeout_secs == 0 {
            return Err(PipelineError::config("campaign.request_timeout_secs must be > 0"));
        }
        if self.campaign.convert_binary.trim().is_empty() {
            return Err(PipelineError::config("campaign.convert_binary is empty"));
        }
        if self.campaign.still_image_forecast_hr > 23 {
            return Err(PipelineError::config(
                "campaign.still_image_forecast_hr must be an hour of the day",
            ));
        }
        Ok(())
    }

    /// Whether `feed` should be downloaded. Feeds not listed are enabled.
    pub fn feed_enabled(&self, feed: FeedId) -> bool {
        self.feeds.get(feed.name()).copied().unwrap_or(true)
    }
}

/// Working directories, all relative to `root`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Paths {
    pub root: PathBuf,
    pub figs: PathBuf,
    pub figs_cropped: PathBuf,
    pub figs_final: PathBuf,
    pub archive: PathBuf,
    pub ledger: PathBuf,
    /// Logo file name, kept in `figs` across runs.
    pub logo: String,
}

impl Default for Paths {
    fn default() -> Self {
        Paths {
            root: PathBuf::from("."),
            figs: PathBuf::from("figs"),
            figs_cropped: PathBuf::from("figs_cropped"),
            figs_final: PathBuf::from("figs_final"),
            archive: PathBuf::from("forecast_archive"),
            ledger: PathBuf::from("supplementary/switches_process.txt"),
            logo: "logo_cpexcv.png".to_string(),
        }
    }
}

impl Paths {
    pub fn figs(&self) -> PathBuf {
        self.root.join(&self.figs)
    }

    pub fn figs_cropped(&self) -> PathBuf {
        self.root.join(&self.figs_cropped)
    }

    pub fn figs_final(&self) -> PathBuf {
        self.root.join(&self.figs_final)
    }

    pub fn archive(&self) -> PathBuf {
        self.root.join(&self.archive)
    }

    pub fn ledger(&self) -> PathBuf {
        self.root.join(&self.ledger)
    }
}

/// Parameters of the field campaign the imagery is produced for.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Campaign {
    pub model_day1: bool,
    pub model_day2: bool,
    /// Valid hour (UTC) of the daily model still images.
    pub still_image_forecast_hr: u32,
    pub animation_frames: u32,
    /// Latitude (°N) labelled on the longitudinal dust cross section.
    pub dust_cross_lon: u32,
    /// Longitude (°W) labelled on the latitudinal dust cross section.
    pub dust_cross_lat: u32,
    pub duplicate_last_frames: u32,
    /// Hundredths of a second between animation frames.
    pub frame_delay: u32,
    pub request_timeout_secs: u64,
    pub convert_binary: String,
}

impl Default for Campaign {
    fn default() -> Self {
        Campaign {
            model_day1: true,
            model_day2: true,
            still_image_forecast_hr: 16,
            animation_frames: 12,
            dust_cross_lon: 15,
            dust_cross_lat: 20,
            duplicate_last_frames: 3,
            frame_delay: 50,
            request_timeout_secs: 300,
            convert_binary: "convert".to_string(),
        }
    }
}

impl Campaign {
    /// Model days switched on, in order.
    pub fn model_days(&self) -> Vec<u32> {
        [(1, self.model_day1), (2, self.model_day2)]
            .into_iter()
            .filter_map(|(day, on)| on.then_some(day))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Stages {
    pub archive: bool,
    pub download: bool,
    pub animate: bool,
    pub process: bool,
}

impl Default for Stages {
    fn default() -> Self {
        Stages {
            archive: true,
            download: true,
            animate: true,
            process: true,
        }
    }
}

// -- Tests -------------------------------------------------------------------
