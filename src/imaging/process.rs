//! Turns downloaded images into slide-ready ones in the cropped directory.

use std::{fs, path::Path};

use tracing::{info, warn};

use crate::{
    config::{Campaign, Paths},
    error::Result,
    feed::{Conversion, Feed, FeedId, FileDescriptor},
    ledger::SwitchLedger,
};

use super::{
    animate::{numbered_frames, AnimationOptions},
    composite::{join_all, joint_animations, merge_infrared},
    layout::{apply_layout, Layout},
    trim, ImageTool,
};

const GEOS_OUTLOOK_MOVIE: &str = "GEOS_700mb_outlook_movie.gif";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessSummary {
    pub processed: usize,
    pub failed: usize,
    pub joints: usize,
}

/// Empties `cropped` apart from the logo, then refreshes the logo from
/// `figs` and trims its border.
pub fn prepare_cropped_dir<T: ImageTool + ?Sized>(
    tool: &T,
    figs: &Path,
    cropped: &Path,
    logo: &str,
) -> Result<()> {
    fs::create_dir_all(cropped)?;

    for entry in fs::read_dir(cropped)? {
        let entry = entry?;
        if entry.file_name() == logo {
            continue;
        }
        let path = entry.path();
        if path.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
    }

    let source = figs.join(logo);
    if !source.exists() {
        warn!(logo = %source.display(), "logo missing");
        return Ok(());
    }
    let target = cropped.join(logo);
    fs::copy(&source, &target)?;
    if let Err(e) = tool.run(&trim(&target)) {
        warn!(error = %e, "cannot trim logo");
    }

    Ok(())
}

/// `(input, output)` file names produced from one descriptor.
pub(crate) fn outputs(figs: &Path, file: &FileDescriptor) -> Result<Vec<(String, String)>> {
    let names = match &file.conversion {
        None => vec![(file.file_name.clone(), file.file_name.clone())],
        Some(Conversion::Coalesce { output }) => vec![(output.clone(), output.clone())],
        Some(Conversion::Frames { stem, latest }) => {
            let mut names = vec![(latest.clone(), latest.clone())];
            if figs.is_dir() {
                for (n, path) in numbered_frames(figs, &format!("{}-", stem))? {
                    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                        continue;
                    };
                    names.push((name.to_string(), format!("{}-{:02}.png", stem, n)));
                }
            }
            names
        }
    };

    Ok(names)
}

/// Applies each file's layout for every switched-on feed. Missing files and
/// image tool failures are logged and skipped.
pub fn process_feeds<T: ImageTool + ?Sized>(
    tool: &T,
    catalog: &[Feed],
    ledger: &SwitchLedger,
    figs: &Path,
    cropped: &Path,
) -> Result<ProcessSummary> {
    let mut summary = ProcessSummary::default();

    for feed in catalog.iter().filter(|f| ledger.is_enabled(f.id)) {
        info!(feed = %feed.id, "processing images");

        let mut jobs = Vec::new();
        for file in feed.files.iter().filter(|f| f.layout != Layout::Raw) {
            for (input, output) in outputs(figs, file)? {
                jobs.push((input, output, file.layout));
            }
        }
        if feed.id == FeedId::NasaGeos {
            jobs.push((
                GEOS_OUTLOOK_MOVIE.to_string(),
                GEOS_OUTLOOK_MOVIE.to_string(),
                Layout::GeosOutlook,
            ));
        }

        for (input, output, layout) in jobs {
            let input = figs.join(input);
            if !input.exists() {
                continue;
            }
            match apply_layout(tool, layout, &input, &cropped.join(&output)) {
                Ok(true) => summary.processed += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(file = %output, error = %e, "cannot process image");
                    summary.failed += 1;
                }
            }
        }
    }

    Ok(summary)
}

/// The full processing stage: clean, lay out, merge and join.
pub fn process_all<T: ImageTool + ?Sized>(
    tool: &T,
    catalog: &[Feed],
    ledger: &SwitchLedger,
    paths: &Paths,
    campaign: &Campaign,
) -> Result<ProcessSummary> {
    let figs = paths.figs();
    let cropped = paths.figs_cropped();

    info!(dir = %cropped.display(), "removing existing files");
    prepare_cropped_dir(tool, &figs, &cropped, &paths.logo)?;

    let mut summary = process_feeds(tool, catalog, ledger, &figs, &cropped)?;

    if let Err(e) = merge_infrared(tool, &cropped, ledger) {
        warn!(error = %e, "cannot merge infrared images");
    }

    summary.joints = join_all(
        tool,
        &cropped,
        &joint_animations(campaign),
        ledger,
        AnimationOptions::from(campaign),
    )?;

    info!(
        processed = summary.processed,
        failed = summary.failed,
        joints = summary.joints,
        "processing images complete"
    );

    Ok(summary)
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use tempfile::TempDir;

    use super::*;
    use crate::imaging::testing::RecordingTool;

    fn dirs() -> (TempDir, std::path::PathBuf, std::path::PathBuf) {
        let root = TempDir::new().unwrap();
        let figs = root.path().join("figs");
        let cropped = root.path().join("figs_cropped");
        fs::create_dir_all(&figs).unwrap();
        fs::create_dir_all(&cropped).unwrap();
        (root, figs, cropped)
    }

    #[test]
    fn should_clear_cropped_dir_but_keep_logo() {
        let (_root, figs, cropped) = dirs();
        fs::write(figs.join("logo_cpexcv.png"), b"fresh logo").unwrap();
        fs::write(cropped.join("logo_cpexcv.png"), b"old logo").unwrap();
        fs::write(cropped.join("stale.png"), b"stale").unwrap();

        let tool = RecordingTool::default();
        prepare_cropped_dir(&tool, &figs, &cropped, "logo_cpexcv.png").unwrap();

        assert!(!cropped.join("stale.png").exists());
        assert_eq!(fs::read(cropped.join("logo_cpexcv.png")).unwrap(), b"fresh logo");
        assert!(tool.commands()[0].contains("-trim"));
    }

    #[test]
    fn should_process_only_enabled_feeds() {
        let (_root, figs, cropped) = dirs();
        fs::write(figs.join("NHC_2day_outlook.png"), b"png").unwrap();
        fs::write(figs.join("SAL_dryAir_split.jpg"), b"jpg").unwrap();

        let catalog = vec![
            Feed::still(
                FeedId::NhcAnalysis,
                vec![FileDescriptor::new("u", "NHC_2day_outlook.png", Layout::NhcOutlook)],
            ),
            Feed::still(
                FeedId::SalSplit,
                vec![FileDescriptor::new("u", "SAL_dryAir_split.jpg", Layout::SalSplit)],
            ),
        ];
        let mut ledger = SwitchLedger::new();
        ledger.record(FeedId::NhcAnalysis, true);
        ledger.record(FeedId::SalSplit, false);

        let tool = RecordingTool::default();
        let summary = process_feeds(&tool, &catalog, &ledger, &figs, &cropped).unwrap();

        assert_eq!(summary.processed, 1);
        assert!(cropped.join("NHC_2day_outlook.png").exists());
        assert!(!cropped.join("SAL_dryAir_split.jpg").exists());
    }

    #[test]
    fn should_renumber_exploded_frames() {
        let (_root, figs, cropped) = dirs();
        fs::write(figs.join("MIMIC-TPW_latest.png"), b"png").unwrap();
        for n in [0, 7] {
            fs::write(figs.join(format!("MIMIC-TPW_24h_animation-{}.png", n)), b"png").unwrap();
        }
        let catalog = vec![Feed::still(
            FeedId::MimicTpw,
            vec![FileDescriptor::new("u", "MIMIC-TPW_24h_animation.gif", Layout::MimicTpw)
                .with_conversion(Conversion::Frames {
                    stem: "MIMIC-TPW_24h_animation".to_string(),
                    latest: "MIMIC-TPW_latest.png".to_string(),
                })],
        )];
        let mut ledger = SwitchLedger::new();
        ledger.record(FeedId::MimicTpw, true);

        let tool = RecordingTool::default();
        let summary = process_feeds(&tool, &catalog, &ledger, &figs, &cropped).unwrap();

        assert_eq!(summary.processed, 3);
        assert!(cropped.join("MIMIC-TPW_latest.png").exists());
        assert!(cropped.join("MIMIC-TPW_24h_animation-07.png").exists());
        assert!(!cropped.join("MIMIC-TPW_24h_animation.gif").exists());
    }

    #[test]
    fn should_leave_raw_files_alone() {
        let (_root, figs, cropped) = dirs();
        fs::write(figs.join("GFS_midRH_anim_00.png"), b"png").unwrap();
        let catalog = vec![Feed::sequence(
            FeedId::GfsPrediction,
            vec![FileDescriptor::new("u", "GFS_midRH_anim_00.png", Layout::Raw)],
        )];
        let mut ledger = SwitchLedger::new();
        ledger.record(FeedId::GfsPrediction, true);

        let tool = RecordingTool::default();
        let summary = process_feeds(&tool, &catalog, &ledger, &figs, &cropped).unwrap();

        assert_eq!(summary, ProcessSummary::default());
        assert!(tool.commands().is_empty());
    }
}
