//! Feeds, the files they attempt each run, and how those files are laid out.

pub mod catalog;
pub mod downloader;

use std::{fmt, str::FromStr};

use crate::{error::PipelineError, imaging::layout::Layout};

pub use catalog::{build_catalog, RunDate};
pub use downloader::download_feed;

/// Every feed the pipeline knows about, in catalog order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FeedId {
    NhcAnalysis,
    MimicTpw,
    Goes16Sat,
    MeteosatSat,
    BrammerTropicalWaves,
    SalSplit,
    UwincmCloudsCurrent,
    UwincmSurfaceWind,
    Uwincm650mbRh,
    UwincmClouds,
    UwincmPrecipitation,
    UwincmBoundaryLayer,
    UutahPrecipitation,
    UwincmSurfaceWindAnimation,
    Uwincm650mbRhAnimation,
    UwincmCloudsAnimation,
    UwincmPrecipitationAnimation,
    UwincmBoundaryLayerAnimation,
    UutahPrecipitationAnimation,
    IcapAerosolEnsemble,
    UtahDryrun,
    EcmwfPrediction,
    GfsPrediction,
    IconPrediction,
    NasaGeos,
}

impl FeedId {
    pub const ALL: [FeedId; 25] = [
        FeedId::NhcAnalysis,
        FeedId::MimicTpw,
        FeedId::Goes16Sat,
        FeedId::MeteosatSat,
        FeedId::BrammerTropicalWaves,
        FeedId::SalSplit,
        FeedId::UwincmCloudsCurrent,
        FeedId::UwincmSurfaceWind,
        FeedId::Uwincm650mbRh,
        FeedId::UwincmClouds,
        FeedId::UwincmPrecipitation,
        FeedId::UwincmBoundaryLayer,
        FeedId::UutahPrecipitation,
        FeedId::UwincmSurfaceWindAnimation,
        FeedId::Uwincm650mbRhAnimation,
        FeedId::UwincmCloudsAnimation,
        FeedId::UwincmPrecipitationAnimation,
        FeedId::UwincmBoundaryLayerAnimation,
        FeedId::UutahPrecipitationAnimation,
        FeedId::IcapAerosolEnsemble,
        FeedId::UtahDryrun,
        FeedId::EcmwfPrediction,
        FeedId::GfsPrediction,
        FeedId::IconPrediction,
        FeedId::NasaGeos,
    ];

    /// Name used in the switch ledger and in the `[feeds]` config table.
    pub fn name(self) -> &'static str {
        match self {
            FeedId::NhcAnalysis => "nhc_analysis",
            FeedId::MimicTpw => "mimic_tpw",
            FeedId::Goes16Sat => "GOES16_sat",
            FeedId::MeteosatSat => "meteosat_sat",
            FeedId::BrammerTropicalWaves => "brammer_tropical_waves",
            FeedId::SalSplit => "sal_split",
            FeedId::UwincmCloudsCurrent => "uwincm_clouds_current",
            FeedId::UwincmSurfaceWind => "uwincm_surfaceWind",
            FeedId::Uwincm650mbRh => "uwincm_650mbRH",
            FeedId::UwincmClouds => "uwincm_clouds",
            FeedId::UwincmPrecipitation => "uwincm_precipitation",
            FeedId::UwincmBoundaryLayer => "uwincm_boundaryLayer",
            FeedId::UutahPrecipitation => "uutah_precipitation",
            FeedId::UwincmSurfaceWindAnimation => "uwincm_surfaceWind_animation",
            FeedId::Uwincm650mbRhAnimation => "uwincm_650mbRH_animation",
            FeedId::UwincmCloudsAnimation => "uwincm_clouds_animation",
            FeedId::UwincmPrecipitationAnimation => "uwincm_precipitation_animation",
            FeedId::UwincmBoundaryLayerAnimation => "uwincm_boundaryLayer_animation",
            FeedId::UutahPrecipitationAnimation => "uutah_precipitation_animation",
            FeedId::IcapAerosolEnsemble => "icap_aerosol_ensemble",
            FeedId::UtahDryrun => "UTAH_dryrun",
            FeedId::EcmwfPrediction => "ECMWF_prediction",
            FeedId::GfsPrediction => "GFS_prediction",
            FeedId::IconPrediction => "ICON_prediction",
            FeedId::NasaGeos => "nasa_geos",
        }
    }
}

impl fmt::Display for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for FeedId {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeedId::ALL
            .into_iter()
            .find(|id| id.name() == s)
            .ok_or_else(|| PipelineError::UnknownFeed(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    /// One or a few unrelated still images.
    Still,
    /// Numbered animation frames.
    Sequence,
}

/// Where the bytes of one file come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlSource {
    Direct(String),
    /// The image URL is found by scraping `page` for an `<img>` whose `src`
    /// contains `pattern`.
    Scraped { page: String, pattern: String },
}

impl fmt::Display for UrlSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlSource::Direct(url) => f.write_str(url),
            UrlSource::Scraped { page, .. } => write!(f, "{} (scraped)", page),
        }
    }
}

/// Post-fetch conversion of a downloaded GIF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conversion {
    /// Flatten into a single PNG named `output`.
    Coalesce { output: String },
    /// Explode into `<stem>-<n>.png` frames and copy the newest to `latest`.
    Frames { stem: String, latest: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    pub source: UrlSource,
    /// File name inside the working directory.
    pub file_name: String,
    /// Tried once if `source` fails.
    pub fallback: Option<UrlSource>,
    pub conversion: Option<Conversion>,
    pub layout: Layout,
}

impl FileDescriptor {
    pub fn new(url: impl Into<String>, file_name: impl Into<String>, layout: Layout) -> Self {
        FileDescriptor {
            source: UrlSource::Direct(url.into()),
            file_name: file_name.into(),
            fallback: None,
            conversion: None,
            layout,
        }
    }

    pub fn scraped(
        page: impl Into<String>,
        pattern: impl Into<String>,
        file_name: impl Into<String>,
        layout: Layout,
    ) -> Self {
        FileDescriptor {
            source: UrlSource::Scraped {
                page: page.into(),
                pattern: pattern.into(),
            },
            file_name: file_name.into(),
            fallback: None,
            conversion: None,
            layout,
        }
    }

    pub fn with_fallback(mut self, url: impl Into<String>) -> Self {
        self.fallback = Some(UrlSource::Direct(url.into()));
        self
    }

    pub fn with_conversion(mut self, conversion: Conversion) -> Self {
        self.conversion = Some(conversion);
        self
    }
}

#[derive(Debug, Clone)]
pub struct Feed {
    pub id: FeedId,
    pub kind: FeedKind,
    pub files: Vec<FileDescriptor>,
}

impl Feed {
    pub fn still(id: FeedId, files: Vec<FileDescriptor>) -> Self {
        Feed {
            id,
            kind: FeedKind::Still,
            files,
        }
    }

    pub fn sequence(id: FeedId, files: Vec<FileDescriptor>) -> Self {
        Feed {
            id,
            kind: FeedKind::Sequence,
            files,
        }
    }
}

// -- Tests -------------------------------------------------------------------
