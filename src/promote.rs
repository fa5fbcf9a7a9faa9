//! Copies the curated slide images into the final directory under their
//! slide-order names.

use std::{fs, path::Path};

use tracing::{info, warn};

use crate::{config::Campaign, error::Result};

/// Shown on two slides.
const DUST_AOT: (&str, &str) = ("04_GEOS_dust_aot.png", "12_GEOS_dust_aot.png");

/// `(processed name, final name)` in slide order.
pub fn slide_images(campaign: &Campaign, logo: &str) -> Vec<(String, String)> {
    let lon = format!("vert_{}N", campaign.dust_cross_lon);
    let lat = format!("vert_{}W", campaign.dust_cross_lat);

    let prefixed: Vec<(&str, String)> = vec![
        ("02", "NHC_surface_analysis.png".to_string()),
        ("03", "MIMIC-TPW_latest.png".to_string()),
        ("03", "uwincm_clouds_current.jpg".to_string()),
        ("03", "AEW_Brammer.jpg".to_string()),
        ("03", "Goes16_Meteosat11_IRC.png".to_string()),
        ("04", "SAL_dryAir_split.jpg".to_string()),
        ("04", "GEOS_dust_aot.png".to_string()),
        ("05", "NHC_2day_outlook.png".to_string()),
        ("05", "NHC_5day_outlook.png".to_string()),
        ("06", "uwincm_joint_surfaceWind_650mbRH_day1_movie.gif".to_string()),
        ("07", "uwincm_joint_clouds_boundaryLayer_day1_movie.gif".to_string()),
        ("08", "uwincm_joint_precip_day1_movie.gif".to_string()),
        ("09", "uwincm_joint_surfaceWind_650mbRH_day2_movie.gif".to_string()),
        ("10", "uwincm_joint_clouds_boundaryLayer_day2_movie.gif".to_string()),
        ("11", "uwincm_joint_precip_day2_movie.gif".to_string()),
        ("12", format!("GEOS_dust_aot_{}.png", lon)),
        ("12", format!("GEOS_dust_aot_{}.png", lat)),
        ("13", "GEOS_dust_aot_day1.png".to_string()),
        ("13", format!("GEOS_dust_aot_day1_{}.png", lon)),
        ("13", format!("GEOS_dust_aot_day1_{}.png", lat)),
        ("14", "GEOS_dust_aot_day2.png".to_string()),
        ("14", format!("GEOS_dust_aot_day2_{}.png", lon)),
        ("14", format!("GEOS_dust_aot_day2_{}.png", lat)),
        ("12", "GEOS_total_aot.png".to_string()),
        ("13", "GEOS_total_aot_day1.png".to_string()),
        ("14", "GEOS_total_aot_day2.png".to_string()),
        ("15", "GEOS_lowCloudFraction_day1.png".to_string()),
        ("15", "GEOS_lowCloudFraction_day2.png".to_string()),
        ("15", "GEOS_midCloudFraction_day1.png".to_string()),
        ("15", "GEOS_midCloudFraction_day2.png".to_string()),
        ("15", "GEOS_highCloudFraction_day1.png".to_string()),
        ("15", "GEOS_highCloudFraction_day2.png".to_string()),
        ("16", "ICAP_aerosol_ensemble_96.png".to_string()),
        ("16", "ICAP_aerosol_ensemble_120.png".to_string()),
        ("17", "GEOS_700mb_outlook_movie.gif".to_string()),
    ];

    std::iter::once((logo.to_string(), logo.to_string()))
        .chain(
            prefixed
                .into_iter()
                .map(|(prefix, name)| (name.clone(), format!("{}_{}", prefix, name))),
        )
        .collect()
}

/// Copies every available slide image from `cropped` to `fin`. Returns the
/// number of files written.
pub fn promote(cropped: &Path, fin: &Path, campaign: &Campaign, logo: &str) -> Result<usize> {
    fs::create_dir_all(fin)?;
    let mut copied = 0;

    for (name, renamed) in slide_images(campaign, logo) {
        let source = cropped.join(&name);
        if !source.is_file() {
            warn!(file = %name, "not present and cannot be copied over");
            continue;
        }
        fs::copy(&source, fin.join(&renamed))?;
        copied += 1;
    }

    let (once, twice) = DUST_AOT;
    if fin.join(once).is_file() {
        fs::copy(fin.join(once), fin.join(twice))?;
        copied += 1;
    }

    info!(copied, dir = %fin.display(), "final images in place");
    Ok(copied)
}

// -- Tests -------------------------------------------------------------------
