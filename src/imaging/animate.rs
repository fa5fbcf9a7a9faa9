//! Looping GIF animations built from numbered frames.

use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::{info, warn};

use crate::{
    config::Campaign,
    error::Result,
    feed::{
        catalog::{UTAH_PRECIP_STEM, UWINCM_FIELDS},
        FeedId,
    },
    ledger::SwitchLedger,
};

use super::{ConvertCommand, ImageTool};

/// Frame timing shared by every animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationOptions {
    /// Hundredths of a second between frames.
    pub delay: u32,
    /// Extra copies of the last frame.
    pub duplicate_last: u32,
}

impl From<&Campaign> for AnimationOptions {
    fn from(campaign: &Campaign) -> Self {
        AnimationOptions {
            delay: campaign.frame_delay,
            duplicate_last: campaign.duplicate_last_frames,
        }
    }
}

/// An animation assembled from frames `<root>NN.<ext>` in the working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationJob {
    pub feed: FeedId,
    pub root: String,
    pub output: String,
    /// Only animate when exactly this many frames arrived.
    pub expected: usize,
}

/// Lists `<root><n>.<ext>` files in `dir`, sorted by frame number.
pub fn numbered_frames(dir: &Path, root: &str) -> Result<Vec<(u32, PathBuf)>> {
    let mut frames = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(rest) = name.strip_prefix(root) else {
            continue;
        };
        let Some((digits, _ext)) = rest.split_once('.') else {
            continue;
        };
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        if let Ok(number) = digits.parse::<u32>() {
            frames.push((number, path));
        }
    }

    frames.sort();
    Ok(frames)
}

pub fn create_animation<T: ImageTool + ?Sized>(
    tool: &T,
    frames: &[PathBuf],
    delay: u32,
    output: &Path,
) -> Result<()> {
    let mut cmd = ConvertCommand::new().arg("-delay").arg(delay.to_string());
    for frame in frames {
        cmd = cmd.arg(frame);
    }
    let cmd = cmd.arg("-loop").arg("0").arg("+repage").arg(output);

    tool.run(&cmd)
}

/// Renders the frames of `root` with the last one held for
/// `duplicate_last` extra steps. Returns `false` if nothing was there to
/// animate.
pub fn animation_steps<T: ImageTool + ?Sized>(
    tool: &T,
    dir: &Path,
    root: &str,
    output: &str,
    options: AnimationOptions,
) -> Result<bool> {
    let mut frames: Vec<PathBuf> = numbered_frames(dir, root)?
        .into_iter()
        .map(|(_, path)| path)
        .collect();
    let Some(last) = frames.last().cloned() else {
        warn!(root, "missing images, cannot create animation");
        return Ok(false);
    };

    // the held frame only exists in the animation, never on disk
    frames.extend(std::iter::repeat(last).take(options.duplicate_last as usize));
    create_animation(tool, &frames, options.delay, &dir.join(output))?;

    Ok(true)
}

/// Per-model-day animations of the raw downloaded frames.
pub fn model_animations(campaign: &Campaign) -> Vec<AnimationJob> {
    let expected = campaign.animation_frames as usize;
    let mut jobs = Vec::new();

    for field in UWINCM_FIELDS {
        for day in campaign.model_days() {
            jobs.push(AnimationJob {
                feed: field.animation,
                root: format!("{}_day{}_anim_", field.stem, day),
                output: format!("{}_day{}_movie.gif", field.stem, day),
                expected,
            });
        }
    }

    for day in campaign.model_days() {
        jobs.push(AnimationJob {
            feed: FeedId::UutahPrecipitationAnimation,
            root: format!("{}_day{}_anim_", UTAH_PRECIP_STEM, day),
            output: format!("{}_day{}_movie.gif", UTAH_PRECIP_STEM, day),
            expected,
        });
    }

    jobs.push(AnimationJob {
        feed: FeedId::NasaGeos,
        root: "GEOS_700mb_outlook_anim_".to_string(),
        output: "GEOS_700mb_outlook_movie.gif".to_string(),
        expected: 12,
    });

    jobs
}

/// Runs every job whose feed is switched on and whose frames are complete.
/// Returns the number of animations written.
pub fn animate_all<T: ImageTool + ?Sized>(
    tool: &T,
    dir: &Path,
    jobs: &[AnimationJob],
    ledger: &SwitchLedger,
    options: AnimationOptions,
) -> Result<usize> {
    let mut written = 0;

    for job in jobs.iter().filter(|job| ledger.is_enabled(job.feed)) {
        let present = numbered_frames(dir, &job.root)?.len();
        if present != job.expected {
            info!(
                root = %job.root,
                present,
                expected = job.expected,
                "incomplete frame set, skipping animation"
            );
            continue;
        }

        info!(output = %job.output, "creating animation");
        match animation_steps(tool, dir, &job.root, &job.output, options) {
            Ok(true) => written += 1,
            Ok(false) => {}
            Err(e) => warn!(output = %job.output, error = %e, "animation failed"),
        }
    }

    Ok(written)
}

// -- Tests -------------------------------------------------------------------
