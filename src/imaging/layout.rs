//! Presentation rules: crop rectangle and site marker for every kind of image.
//!
//! Coordinates are pixel positions in the source products and mark the
//! campaign's base of operations.

use std::{fs, path::Path};

use crate::error::Result;

use super::{annotate, append_vertical, circle, crop, extend_right, resize, ImageTool};

/// How a downloaded file is turned into its slide-ready version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    NhcSurface,
    NhcOutlook,
    MimicTpw,
    TropicalWaves,
    SalSplit,
    Goes16Visible,
    Goes16Infrared,
    Goes16Rgb,
    MeteosatVisible,
    MeteosatInfrared,
    UwincmWind,
    UwincmClouds,
    UwincmBoundaryLayer,
    UwincmPrecipitation,
    UutahPrecipitation,
    IcapAerosol,
    GeosOutlook,
    GeosDust,
    GeosTotal,
    GeosCloud,
    GeosLonSection,
    GeosLatSection,
    /// Kept in the working directory only.
    Raw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    pub x: u32,
    pub y: u32,
    pub radius: u32,
    pub fill: &'static str,
    pub stroke: &'static str,
}

/// Colour bar cut from the bottom of the source and re-attached enlarged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorBar {
    pub crop: &'static str,
    pub resize: &'static str,
}

/// Celsius labels written next to an infrared colour scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CelsiusScale {
    pub extent: &'static str,
    pub label_x: u32,
}

const CELSIUS_LABELS: [(u32, &str); 10] = [
    (1775, "-110"),
    (1577, "-90"),
    (1395, "-70"),
    (1215, "-50"),
    (1035, "-30"),
    (855, "-10"),
    (675, " 10"),
    (495, " 30"),
    (315, " 50"),
    (245, "ºC"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutRule {
    /// `None` copies the image unchanged before marking it.
    pub crop: Option<&'static str>,
    pub marker: Marker,
    pub color_bar: Option<ColorBar>,
    pub celsius: Option<CelsiusScale>,
}

const fn marker(x: u32, y: u32, radius: u32, fill: &'static str) -> Marker {
    Marker {
        x,
        y,
        radius,
        fill,
        stroke: "black",
    }
}

const fn rule(crop: &'static str, marker: Marker) -> LayoutRule {
    LayoutRule {
        crop: Some(crop),
        marker,
        color_bar: None,
        celsius: None,
    }
}

impl Layout {
    pub fn rule(self) -> Option<LayoutRule> {
        let found = match self {
            Layout::NhcSurface => rule("1268x648+1100+350", marker(952, 445, 5, "red")),
            Layout::NhcOutlook => rule("900x665+0+0", marker(775, 445, 5, "blue")),
            Layout::MimicTpw => rule("990x452+8+18", marker(665, 323, 4, "white")),
            Layout::TropicalWaves => rule("990x388+10+0", marker(662, 243, 4, "red")),
            Layout::SalSplit => LayoutRule {
                color_bar: Some(ColorBar {
                    crop: "682x38+430+782",
                    resize: "1312x73",
                }),
                ..rule("1312x780+230+0", marker(1120, 488, 6, "white"))
            },
            Layout::Goes16Visible => rule("3712x3700+0+0", marker(940, 1560, 24, "magenta")),
            Layout::Goes16Rgb => rule("2000x2000+0+0", marker(1340, 940, 12, "magenta")),
            Layout::Goes16Infrared => LayoutRule {
                celsius: Some(CelsiusScale {
                    extent: "2100x2000",
                    label_x: 2000,
                }),
                ..rule("2000x2000+0+0", marker(1340, 940, 12, "magenta"))
            },
            Layout::MeteosatVisible => rule("3000x2000+0+0", marker(850, 910, 12, "magenta")),
            Layout::MeteosatInfrared => LayoutRule {
                celsius: Some(CelsiusScale {
                    extent: "3100x2000",
                    label_x: 3000,
                }),
                ..rule("3000x2000+0+0", marker(850, 910, 12, "magenta"))
            },
            Layout::UwincmWind => rule("740x450+30+85", marker(542, 234, 4, "red")),
            Layout::UwincmClouds => rule("740x450+25+110", marker(448, 172, 5, "white")),
            Layout::UwincmBoundaryLayer => rule("740x450+25+110", marker(454, 171, 5, "red")),
            Layout::UwincmPrecipitation => rule(
                "740x500+25+110",
                Marker {
                    stroke: "red",
                    ..marker(454, 171, 5, "black")
                },
            ),
            Layout::UutahPrecipitation => LayoutRule {
                crop: None,
                marker: Marker {
                    stroke: "red",
                    ..marker(452, 187, 5, "black")
                },
                color_bar: None,
                celsius: None,
            },
            Layout::IcapAerosol => rule("825x530+80+85", marker(490, 334, 4, "red")),
            Layout::GeosOutlook => rule("984x688+0+80", marker(685, 335, 5, "red")),
            Layout::GeosDust => rule("984x688+0+80", marker(685, 335, 5, "white")),
            Layout::GeosTotal => rule("984x688+0+80", marker(685, 335, 5, "blue")),
            Layout::GeosCloud => rule("984x688+0+80", marker(685, 335, 5, "red")),
            Layout::GeosLonSection => rule("1021x654+2+57", marker(750, 619, 8, "white")),
            Layout::GeosLatSection => rule("1019x681+0+57", marker(495, 619, 8, "white")),
            Layout::Raw => return None,
        };

        Some(found)
    }
}

/// Writes the slide-ready version of `input` to `output`.
///
/// Returns `false` for layouts that are not processed.
pub fn apply_layout<T: ImageTool + ?Sized>(
    tool: &T,
    layout: Layout,
    input: &Path,
    output: &Path,
) -> Result<bool> {
    let Some(rule) = layout.rule() else {
        return Ok(false);
    };

    match rule.crop {
        Some(geometry) => tool.run(&crop(input, geometry, output))?,
        None => {
            fs::copy(input, output)?;
        }
    }

    let m = rule.marker;
    tool.run(&circle(output, m.x, m.y, m.radius, m.fill, m.stroke))?;

    if let Some(bar) = rule.color_bar {
        let bar_path = color_bar_path(output);
        tool.run(&crop(input, bar.crop, &bar_path))?;
        tool.run(&resize(&bar_path, bar.resize, &bar_path))?;
        tool.run(&append_vertical(output, &bar_path, output))?;
    }

    if let Some(scale) = rule.celsius {
        tool.run(&extend_right(output, scale.extent))?;
        for (y, label) in CELSIUS_LABELS {
            tool.run(&annotate(output, scale.label_x, y, label))?;
        }
    }

    Ok(true)
}

// `SAL_dryAir_split.jpg` -> `SAL_dryAir_split_cbar.jpg`
fn color_bar_path(output: &Path) -> std::path::PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match output.extension() {
        Some(ext) => format!("{}_cbar.{}", stem, ext.to_string_lossy()),
        None => format!("{}_cbar", stem),
    };
    output.with_file_name(name)
}

// -- Tests -------------------------------------------------------------------
