//! The feed catalog: every source, its URL rules and destination files,
//! resolved against one run date.

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};

use crate::{config::Campaign, imaging::layout::Layout};

use super::{Conversion, Feed, FeedId, FileDescriptor};

const NHC_BASE: &str = "https://www.nhc.noaa.gov";
const MIMIC_URL: &str =
    "http://tropic.ssec.wisc.edu/real-time/mtpw2/webAnims/tpw_nrl_colors/natl/mimictpw_natl_latest.gif";
const SATCORPS_BASE: &str = "https://satcorps.larc.nasa.gov/prod/exp/cpex-aw-2020/satpng";
const BRAMMER_BASE: &str =
    "http://www.atmos.albany.edu/student/abrammer/graphics/gfs_realtime/plots/prate_sf_mslp/ea_prate_sf_mslp_";
const SAL_SPLIT_URL: &str = "http://tropic.ssec.wisc.edu/real-time/sal/g16split/g16split.jpg";
const UWINCM_BASE: &str = "https://orca.atmos.washington.edu/model_images/atl/umcm_wmh/realtime";
const UUTAH_BASE: &str = "https://orca.atmos.washington.edu/model_images/atl/uutah/realtime";
const ICAP_BASE: &str = "https://www.nrlmry.navy.mil/aerosol/globaer/icap_01/subtropatl";
const UTAH_DRYRUN_BASE: &str = "https://home.chpc.utah.edu/~pu/cpexaw/png";
const TIDBITS_BASE: &str = "https://www.tropicaltidbits.com/analysis/models";
const GEOS_BASE: &str = "https://fluid.nccs.nasa.gov/missions";

/// `src` prefix of the rendered plot on a GEOS mission page.
pub const GEOS_IMAGE_PATTERN: &str = "/missions/static//plots/";

/// Hour (UTC) of the "current conditions" cloud map.
const CURRENT_CLOUDS_HOUR: i64 = 16;
/// Tropical-wave plots are indexed by hours since this instant.
const BRAMMER_EPOCH: (i32, u32, u32) = (2013, 1, 1);
/// Alternate index offset tried once when the first plot is missing.
const BRAMMER_RETRY_HOURS: i64 = 6;

pub(crate) struct UwincmField {
    pub still: FeedId,
    pub animation: FeedId,
    /// Path below `<run>/ecmwf/`, without the timestamp.
    pub path: &'static str,
    pub stem: &'static str,
    pub layout: Layout,
}

pub(crate) const UWINCM_FIELDS: [UwincmField; 5] = [
    UwincmField {
        still: FeedId::UwincmSurfaceWind,
        animation: FeedId::UwincmSurfaceWindAnimation,
        path: "large/windsfc/wspd.large",
        stem: "uwincm_surfaceWind",
        layout: Layout::UwincmWind,
    },
    UwincmField {
        still: FeedId::Uwincm650mbRh,
        animation: FeedId::Uwincm650mbRhAnimation,
        path: "large/rh650mb/650mb_rh.large",
        stem: "uwincm_650mbRH",
        layout: Layout::UwincmWind,
    },
    UwincmField {
        still: FeedId::UwincmClouds,
        animation: FeedId::UwincmCloudsAnimation,
        path: "storm/pw_olr/pw_olr.storm",
        stem: "uwincm_clouds",
        layout: Layout::UwincmClouds,
    },
    UwincmField {
        still: FeedId::UwincmPrecipitation,
        animation: FeedId::UwincmPrecipitationAnimation,
        path: "storm/rr_slp/rainr.storm",
        stem: "uwincm_precip",
        layout: Layout::UwincmPrecipitation,
    },
    UwincmField {
        still: FeedId::UwincmBoundaryLayer,
        animation: FeedId::UwincmBoundaryLayerAnimation,
        path: "storm/blh/blh.storm",
        stem: "uwincm_boundaryLayer",
        layout: Layout::UwincmBoundaryLayer,
    },
];

pub(crate) const UTAH_PRECIP_STEM: &str = "uutah_precip";

/// The single logical "today" every time-dependent URL is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunDate(NaiveDate);

impl RunDate {
    pub fn new(date: NaiveDate) -> Self {
        RunDate(date)
    }

    pub fn today() -> Self {
        RunDate(Local::now().date_naive())
    }

    pub fn date(self) -> NaiveDate {
        self.0
    }

    pub fn yesterday(self) -> NaiveDate {
        self.0 - Duration::days(1)
    }

    /// 00 UTC of the run date.
    pub fn midnight(self) -> NaiveDateTime {
        self.0.and_time(NaiveTime::MIN)
    }

    /// 00 UTC of forecast day `n` (1 = tomorrow).
    pub fn model_day(self, n: u32) -> NaiveDateTime {
        self.midnight() + Duration::days(i64::from(n))
    }
}

/// Builds every feed for `date`, in catalog order.
pub fn build_catalog(date: RunDate, campaign: &Campaign) -> Vec<Feed> {
    let mut feeds = vec![
        nhc_analysis(),
        mimic_tpw(),
        goes16(),
        meteosat(),
        tropical_waves(date),
        Feed::still(
            FeedId::SalSplit,
            vec![FileDescriptor::new(SAL_SPLIT_URL, "SAL_dryAir_split.jpg", Layout::SalSplit)],
        ),
        uwincm_clouds_current(date),
    ];

    for field in &UWINCM_FIELDS {
        feeds.push(uwincm_still(date, campaign, field));
    }
    feeds.push(uutah_still(date, campaign));

    for field in &UWINCM_FIELDS {
        feeds.push(uwincm_animation(date, campaign, field));
    }
    feeds.push(uutah_animation(date, campaign));

    feeds.push(icap(date));
    feeds.push(utah_dryrun(date, campaign));
    feeds.push(tidbits(
        date,
        FeedId::EcmwfPrediction,
        "ecmwf",
        "ECMWF",
        57,
        &["mslp_wind", "midRH", "mslp_pwat", "mslp_pcpn"],
    ));
    feeds.push(tidbits(
        date,
        FeedId::GfsPrediction,
        "gfs",
        "GFS",
        29,
        &["mslp_wind", "midRH", "mslp_pwat", "mslp_pcpn"],
    ));
    feeds.push(tidbits(
        date,
        FeedId::IconPrediction,
        "icon",
        "ICON",
        29,
        &["mslp_wind", "mslp_pcpn"],
    ));
    feeds.push(nasa_geos(date, campaign));

    feeds
}

fn nhc_analysis() -> Feed {
    Feed::still(
        FeedId::NhcAnalysis,
        vec![
            FileDescriptor::new(
                format!("{}/tafb_latest/USA_latest.gif", NHC_BASE),
                "NHC_surface_analysis.gif",
                Layout::NhcSurface,
            )
            .with_conversion(Conversion::Coalesce {
                output: "NHC_surface_analysis.png".to_string(),
            }),
            FileDescriptor::new(
                format!("{}/xgtwo/two_atl_2d0.png", NHC_BASE),
                "NHC_2day_outlook.png",
                Layout::NhcOutlook,
            ),
            FileDescriptor::new(
                format!("{}/xgtwo/two_atl_5d0.png", NHC_BASE),
                "NHC_5day_outlook.png",
                Layout::NhcOutlook,
            ),
        ],
    )
}

fn mimic_tpw() -> Feed {
    Feed::still(
        FeedId::MimicTpw,
        vec![
            FileDescriptor::new(MIMIC_URL, "MIMIC-TPW_24h_animation.gif", Layout::MimicTpw)
                .with_conversion(Conversion::Frames {
                    stem: "MIMIC-TPW_24h_animation".to_string(),
                    latest: "MIMIC-TPW_latest.png".to_string(),
                }),
        ],
    )
}

fn goes16() -> Feed {
    let base = format!("{}/g16/latest/G16.LATEST", SATCORPS_BASE);
    Feed::still(
        FeedId::Goes16Sat,
        vec![
            FileDescriptor::new(format!("{}.01KM.HVIS.PNG", base), "Goes16_VIS.png", Layout::Goes16Visible),
            FileDescriptor::new(format!("{}.02KM.RGB.PNG", base), "Goes16_RGB.png", Layout::Goes16Rgb),
            FileDescriptor::new(format!("{}.02KM.IRC.PNG", base), "Goes16_IRC.png", Layout::Goes16Infrared),
        ],
    )
}

fn meteosat() -> Feed {
    let base = format!("{}/met/latest/M11.LATEST", SATCORPS_BASE);
    Feed::still(
        FeedId::MeteosatSat,
        vec![
            FileDescriptor::new(
                format!("{}.03KM.VIS.PNG", base),
                "Meteosat11_VIS.png",
                Layout::MeteosatVisible,
            ),
            FileDescriptor::new(
                format!("{}.03KM.IRC.PNG", base),
                "Meteosat11_IRC.png",
                Layout::MeteosatInfrared,
            ),
        ],
    )
}

/// Hours since the tropical-wave plot epoch, rounded up.
pub fn brammer_index(date: RunDate) -> i64 {
    let (y, m, d) = BRAMMER_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(y, m, d)
        .unwrap_or_default()
        .and_time(NaiveTime::MIN);
    let seconds = (date.midnight() - epoch).num_seconds();
    (seconds + 3599).div_euclid(3600)
}

fn tropical_waves(date: RunDate) -> Feed {
    let hours = brammer_index(date);
    let url = |h: i64| format!("{}{}.0.jpg", BRAMMER_BASE, h);

    Feed::still(
        FeedId::BrammerTropicalWaves,
        vec![
            FileDescriptor::new(url(hours), "AEW_Brammer.jpg", Layout::TropicalWaves)
                .with_fallback(url(hours + BRAMMER_RETRY_HOURS)),
        ],
    )
}

fn uwincm_run(date: RunDate) -> String {
    format!("{}/{}00/ecmwf", UWINCM_BASE, date.date().format("%Y%m%d"))
}

fn uwincm_clouds_current(date: RunDate) -> Feed {
    let valid = date.midnight() + Duration::hours(CURRENT_CLOUDS_HOUR);
    let url = format!(
        "{}/storm/pw_olr/pw_olr.storm.{}.jpg",
        uwincm_run(date),
        valid.format("%Y%m%d%H")
    );

    Feed::still(
        FeedId::UwincmCloudsCurrent,
        vec![FileDescriptor::new(url, "uwincm_clouds_current.jpg", Layout::UwincmClouds)],
    )
}

fn uwincm_still(date: RunDate, campaign: &Campaign, field: &UwincmField) -> Feed {
    let files = campaign
        .model_days()
        .into_iter()
        .map(|day| {
            let valid = date.model_day(day) + Duration::hours(campaign.still_image_forecast_hr.into());
            FileDescriptor::new(
                format!("{}/{}.{}.jpg", uwincm_run(date), field.path, valid.format("%Y%m%d%H")),
                format!("{}_day{}.jpg", field.stem, day),
                field.layout,
            )
        })
        .collect();

    Feed::still(field.still, files)
}

/// Valid times of the animation frames of one model day: every other hour
/// starting at 01 UTC.
fn frame_times(date: RunDate, day: u32, frames: u32) -> impl Iterator<Item = (u32, NaiveDateTime)> {
    let start = date.model_day(day) + Duration::hours(1);
    (0..frames).map(move |frame| (frame, start + Duration::hours(2 * i64::from(frame))))
}

fn uwincm_animation(date: RunDate, campaign: &Campaign, field: &UwincmField) -> Feed {
    let mut files = Vec::new();
    for day in campaign.model_days() {
        for (frame, valid) in frame_times(date, day, campaign.animation_frames) {
            files.push(FileDescriptor::new(
                format!("{}/{}.{}.jpg", uwincm_run(date), field.path, valid.format("%Y%m%d%H")),
                format!("{}_day{}_anim_{:02}.jpg", field.stem, day, frame),
                field.layout,
            ));
        }
    }

    Feed::sequence(field.animation, files)
}

fn uutah_run(date: RunDate) -> String {
    format!("{}/{}00/gfs/storm/rr_slp", UUTAH_BASE, date.date().format("%Y%m%d"))
}

fn uutah_still(date: RunDate, campaign: &Campaign) -> Feed {
    let files = campaign
        .model_days()
        .into_iter()
        .map(|day| {
            let valid = date.model_day(day) + Duration::hours(campaign.still_image_forecast_hr.into());
            FileDescriptor::new(
                format!("{}/slp_rain-{}_d02.png", uutah_run(date), valid.format("%Y-%m-%d_%H:%M:%S")),
                format!("{}_day{}.jpg", UTAH_PRECIP_STEM, day),
                Layout::UutahPrecipitation,
            )
        })
        .collect();

    Feed::still(FeedId::UutahPrecipitation, files)
}

fn uutah_animation(date: RunDate, campaign: &Campaign) -> Feed {
    let mut files = Vec::new();
    for day in campaign.model_days() {
        for (frame, valid) in frame_times(date, day, campaign.animation_frames) {
            files.push(FileDescriptor::new(
                format!("{}/slp_rain-{}_d02.png", uutah_run(date), valid.format("%Y-%m-%d_%H:%M:%S")),
                format!("{}_day{}_anim_{:02}.png", UTAH_PRECIP_STEM, day, frame),
                Layout::UutahPrecipitation,
            ));
        }
    }

    Feed::sequence(FeedId::UutahPrecipitationAnimation, files)
}

/// ICAP ensemble mean AOT at 96 h and 120 h from yesterday's 00Z run.
fn icap(date: RunDate) -> Feed {
    let init = date.midnight() - Duration::days(1);
    let run = init.format("%Y%m%d%H");

    let files = [4i64, 5]
        .into_iter()
        .map(|days| {
            let lead = days * 24;
            let valid = init + Duration::days(days);
            FileDescriptor::new(
                format!(
                    "{}/{}/{}_{}_f{:03}_total_aod_550_subtropatl_icap.png",
                    ICAP_BASE,
                    run,
                    run,
                    valid.format("%Y%m%d%H"),
                    lead
                ),
                format!("ICAP_aerosol_ensemble_{}.png", lead),
                Layout::IcapAerosol,
            )
        })
        .collect();

    Feed::still(FeedId::IcapAerosolEnsemble, files)
}

fn utah_dryrun(date: RunDate, campaign: &Campaign) -> Feed {
    const VARIABLES: [(&str, &str); 5] = [
        ("sfcwind", "d01"),
        ("rhght650", "d01"),
        ("tpw_olr", "d01"),
        ("PBLH", "d02"),
        ("slp_rain", "d02"),
    ];

    let run = format!("{}/{}_00", UTAH_DRYRUN_BASE, date.date().format("%Y-%m-%d"));
    let mut files = Vec::new();

    for (variable, domain) in VARIABLES {
        for day in campaign.model_days() {
            // Rain is only written every three hours.
            let times: Vec<(u32, NaiveDateTime)> = if variable == "slp_rain" {
                let start = date.model_day(day) + Duration::hours(3);
                (0..7)
                    .map(|frame| (frame, start + Duration::hours(3 * i64::from(frame))))
                    .collect()
            } else {
                frame_times(date, day, campaign.animation_frames).collect()
            };

            for (frame, valid) in times {
                files.push(FileDescriptor::new(
                    format!(
                        "{}/{}-{}_{}.png",
                        run,
                        variable,
                        valid.format("%Y-%m-%d_%H:%M:%S"),
                        domain
                    ),
                    format!("uutah_{}_day{}_anim_{:02}.png", variable, day, frame),
                    Layout::Raw,
                ));
            }
        }
    }

    Feed::sequence(FeedId::UtahDryrun, files)
}

/// Tropical Tidbits model frames from the 00Z run. Precipitation has no
/// analysis frame, so its first frame is not attempted.
fn tidbits(
    date: RunDate,
    id: FeedId,
    model: &str,
    label: &str,
    frames: u32,
    variables: &[&str],
) -> Feed {
    let run = format!("{}/{}/{}00", TIDBITS_BASE, model, date.date().format("%Y%m%d"));
    let mut files = Vec::new();

    for variable in variables {
        for frame in 0..frames {
            let index = if *variable == "mslp_pcpn" {
                if frame == 0 {
                    continue;
                }
                frame
            } else {
                frame + 1
            };
            files.push(FileDescriptor::new(
                format!("{}/{}_{}_atl_{}.png", run, model, variable, index),
                format!("{}_{}_anim_{:02}.png", label, variable, frame),
                Layout::Raw,
            ));
        }
    }

    Feed::sequence(id, files)
}

fn geos_page(date: RunDate, mission: &str, level: u32, tau: &str, field: &str) -> String {
    format!(
        "{}/{}%2BPRDUST/?one_click=1&tau={}&stream=G5FPFC&level={}&region=prdust&fcst={}&field={}",
        GEOS_BASE,
        mission,
        tau,
        level,
        date.date().format("%Y%m%dT000000"),
        field
    )
}

fn nasa_geos(date: RunDate, campaign: &Campaign) -> Feed {
    const TAUS: [&str; 3] = ["000", "024", "048"];
    const SUFFIXES: [&str; 3] = ["", "_day1", "_day2"];

    let lon_section = format!("_vert_{}N", campaign.dust_cross_lon);
    let lat_section = format!("_vert_{}W", campaign.dust_cross_lat);

    // (mission, field, file stem, section label, layout)
    let products: [(&str, &str, &str, &str, Layout); 7] = [
        ("chem2d_mission", "duaot", "GEOS_dust_aot", "", Layout::GeosDust),
        ("chem2d_mission", "totaot", "GEOS_total_aot", "", Layout::GeosTotal),
        ("weather_mission", "cldlow", "GEOS_lowCloudFraction", "", Layout::GeosCloud),
        ("weather_mission", "cldmid", "GEOS_midCloudFraction", "", Layout::GeosCloud),
        ("weather_mission", "cldhgh", "GEOS_highCloudFraction", "", Layout::GeosCloud),
        ("custom_mission", "du_w2", "GEOS_dust_aot", &lon_section, Layout::GeosLonSection),
        ("custom_mission", "du_n1", "GEOS_dust_aot", &lat_section, Layout::GeosLatSection),
    ];

    let mut files = Vec::new();
    for (mission, field, stem, section, layout) in products {
        for (tau, suffix) in TAUS.into_iter().zip(SUFFIXES) {
            files.push(FileDescriptor::scraped(
                geos_page(date, mission, 0, tau, field),
                GEOS_IMAGE_PATTERN,
                format!("{}{}{}.png", stem, suffix, section),
                layout,
            ));
        }
    }

    for frame in 0..12u32 {
        let tau = format!("{:03}", 72 + 6 * frame);
        files.push(FileDescriptor::scraped(
            geos_page(date, "weather_mission", 700, &tau, "wspd"),
            GEOS_IMAGE_PATTERN,
            format!("GEOS_700mb_outlook_anim_{:02}.png", frame),
            Layout::GeosOutlook,
        ));
    }

    Feed::still(FeedId::NasaGeos, files)
}

// -- Tests -------------------------------------------------------------------
