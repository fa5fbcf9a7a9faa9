//! Side-by-side composites of two processed products.

use std::{fs, path::Path};

use tracing::{info, warn};

use crate::{
    config::Campaign,
    error::Result,
    feed::FeedId,
    ledger::SwitchLedger,
};

use super::{
    animate::{animation_steps, numbered_frames, AnimationOptions},
    append_horizontal, crop, ImageTool,
};

pub const MERGED_INFRARED: &str = "Goes16_Meteosat11_IRC.png";
const GOES_INFRARED: &str = "Goes16_IRC.png";
const METEOSAT_INFRARED: &str = "Meteosat11_IRC.png";
/// Western strip of the GOES-16 image kept in the merge, dropping its scale.
const GOES_STRIP: &str = "502x2000+0+0";

/// Two frame sequences appended left to right and animated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JointAnimation {
    pub left: (FeedId, String),
    pub right: (FeedId, String),
    /// Frame root of the joined sequence.
    pub root: String,
    pub output: String,
}

pub fn joint_animations(campaign: &Campaign) -> Vec<JointAnimation> {
    let pairs = [
        (
            (FeedId::UwincmSurfaceWindAnimation, "uwincm_surfaceWind"),
            (FeedId::Uwincm650mbRhAnimation, "uwincm_650mbRH"),
            "uwincm_joint_surfaceWind_650mbRH",
        ),
        (
            (FeedId::UwincmCloudsAnimation, "uwincm_clouds"),
            (FeedId::UwincmBoundaryLayerAnimation, "uwincm_boundaryLayer"),
            "uwincm_joint_clouds_boundaryLayer",
        ),
        (
            (FeedId::UwincmPrecipitationAnimation, "uwincm_precip"),
            (FeedId::UutahPrecipitationAnimation, "uutah_precip"),
            "uwincm_joint_precip",
        ),
    ];

    let mut joints = Vec::new();
    for ((left, left_stem), (right, right_stem), joint) in pairs {
        for day in campaign.model_days() {
            joints.push(JointAnimation {
                left: (left, format!("{}_day{}_anim_", left_stem, day)),
                right: (right, format!("{}_day{}_anim_", right_stem, day)),
                root: format!("{}_day{}_anim_", joint, day),
                output: format!("{}_day{}_movie.gif", joint, day),
            });
        }
    }

    joints
}

/// Appends frame `n` of the right sequence to frame `n` of the left one and
/// animates the result. Skipped when the right side has fewer frames.
pub fn build_joint<T: ImageTool + ?Sized>(
    tool: &T,
    dir: &Path,
    joint: &JointAnimation,
    options: AnimationOptions,
) -> Result<bool> {
    let left = numbered_frames(dir, &joint.left.1)?;
    let right = numbered_frames(dir, &joint.right.1)?;

    if left.len() > right.len() {
        warn!(
            output = %joint.output,
            left = left.len(),
            right = right.len(),
            "the numbers of images for fields do not match"
        );
        return Ok(false);
    }

    for (n, ((_, l), (_, r))) in left.iter().zip(&right).enumerate() {
        let frame = dir.join(format!("{}{:02}.jpg", joint.root, n));
        tool.run(&append_horizontal(l, r, &frame))?;
    }

    animation_steps(tool, dir, &joint.root, &joint.output, options)
}

/// Builds every joint animation whose two feeds are both switched on.
pub fn join_all<T: ImageTool + ?Sized>(
    tool: &T,
    dir: &Path,
    joints: &[JointAnimation],
    ledger: &SwitchLedger,
    options: AnimationOptions,
) -> Result<usize> {
    let mut written = 0;

    for joint in joints
        .iter()
        .filter(|j| ledger.is_enabled(j.left.0) && ledger.is_enabled(j.right.0))
    {
        info!(output = %joint.output, "creating joint animation");
        match build_joint(tool, dir, joint, options) {
            Ok(true) => written += 1,
            Ok(false) => {}
            Err(e) => warn!(output = %joint.output, error = %e, "joint animation failed"),
        }
    }

    Ok(written)
}

/// Puts the western strip of the processed GOES-16 infrared image next to
/// the Meteosat-11 one. Needs both satellites switched on.
pub fn merge_infrared<T: ImageTool + ?Sized>(
    tool: &T,
    dir: &Path,
    ledger: &SwitchLedger,
) -> Result<bool> {
    if !(ledger.is_enabled(FeedId::Goes16Sat) && ledger.is_enabled(FeedId::MeteosatSat)) {
        return Ok(false);
    }

    let goes = dir.join(GOES_INFRARED);
    let meteosat = dir.join(METEOSAT_INFRARED);
    if !goes.exists() || !meteosat.exists() {
        warn!("infrared images missing, cannot merge");
        return Ok(false);
    }

    let strip = dir.join("temp1.png");
    tool.run(&crop(&goes, GOES_STRIP, &strip))?;
    tool.run(&append_horizontal(&strip, &meteosat, &dir.join(MERGED_INFRARED)))?;
    fs::remove_file(&strip)?;

    Ok(true)
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use tempfile::TempDir;

    use super::*;
    use crate::imaging::testing::RecordingTool;

    const OPTIONS: AnimationOptions = AnimationOptions {
        delay: 50,
        duplicate_last: 3,
    };

    fn write_frames(dir: &Path, root: &str, ext: &str, count: u32) {
        for n in 0..count {
            fs::write(dir.join(format!("{}{:02}.{}", root, n, ext)), b"frame").unwrap();
        }
    }

    fn precip_day1() -> JointAnimation {
        joint_animations(&Campaign::default())
            .into_iter()
            .find(|j| j.output == "uwincm_joint_precip_day1_movie.gif")
            .unwrap()
    }

    #[test]
    fn should_pair_fields_per_model_day() {
        let campaign = Campaign {
            model_day2: false,
            ..Campaign::default()
        };
        let joints = joint_animations(&campaign);

        assert_eq!(joints.len(), 3);
        assert_eq!(joints[0].left.1, "uwincm_surfaceWind_day1_anim_");
        assert_eq!(joints[0].right.1, "uwincm_650mbRH_day1_anim_");
        assert_eq!(joints[2].right.0, FeedId::UutahPrecipitationAnimation);
    }

    #[test]
    fn should_join_frames_side_by_side() {
        let dir = TempDir::new().unwrap();
        write_frames(dir.path(), "uwincm_precip_day1_anim_", "jpg", 12);
        write_frames(dir.path(), "uutah_precip_day1_anim_", "png", 12);
        let tool = RecordingTool::default();

        assert!(build_joint(&tool, dir.path(), &precip_day1(), OPTIONS).unwrap());

        let commands = tool.commands();
        // twelve appends and one animation
        assert_eq!(commands.len(), 13);
        assert!(commands[0].starts_with("+append"));
        assert!(commands[0].ends_with("uwincm_joint_precip_day1_anim_00.jpg"));
        assert!(dir.path().join("uwincm_joint_precip_day1_movie.gif").exists());
    }

    #[test]
    fn should_skip_when_right_side_is_short() {
        let dir = TempDir::new().unwrap();
        write_frames(dir.path(), "uwincm_precip_day1_anim_", "jpg", 12);
        write_frames(dir.path(), "uutah_precip_day1_anim_", "png", 8);
        let tool = RecordingTool::default();

        assert!(!build_joint(&tool, dir.path(), &precip_day1(), OPTIONS).unwrap());
        assert!(tool.commands().is_empty());
    }

    #[test]
    fn should_require_both_feeds() {
        let dir = TempDir::new().unwrap();
        write_frames(dir.path(), "uwincm_precip_day1_anim_", "jpg", 12);
        write_frames(dir.path(), "uutah_precip_day1_anim_", "png", 12);
        let mut ledger = SwitchLedger::new();
        ledger.record(FeedId::UwincmPrecipitationAnimation, true);
        ledger.record(FeedId::UutahPrecipitationAnimation, false);

        let tool = RecordingTool::default();
        let written = join_all(&tool, dir.path(), &[precip_day1()], &ledger, OPTIONS).unwrap();

        assert_eq!(written, 0);
    }

    #[test]
    fn should_merge_infrared_images() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(GOES_INFRARED), b"goes").unwrap();
        fs::write(dir.path().join(METEOSAT_INFRARED), b"met").unwrap();
        let mut ledger = SwitchLedger::new();
        ledger.record(FeedId::Goes16Sat, true);
        ledger.record(FeedId::MeteosatSat, true);

        let tool = RecordingTool::default();
        assert!(merge_infrared(&tool, dir.path(), &ledger).unwrap());

        let commands = tool.commands();
        assert!(commands[0].contains("-crop 502x2000+0+0"));
        assert!(commands[1].ends_with(MERGED_INFRARED));
        assert!(dir.path().join(MERGED_INFRARED).exists());
        assert!(!dir.path().join("temp1.png").exists());
    }
}
