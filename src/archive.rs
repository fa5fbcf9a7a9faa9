//! Archives yesterday's final images and clears the working directories.

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
use tracing::info;

use crate::{config::Paths, error::Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveOutcome {
    Archived { target: PathBuf, moved: usize },
    /// The target already held files; nothing was touched.
    AlreadyArchived { target: PathBuf },
}

pub fn archive_dir_name(yesterday: NaiveDate) -> String {
    format!("archive-forecast_{}", yesterday.format("%Y-%m-%d"))
}

/// Visible entries of `dir`, skipping dotfiles and `keep`. A missing
/// directory has no entries.
fn visible_entries(dir: &Path, keep: Option<&str>) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') || Some(name.as_ref()) == keep {
            continue;
        }
        entries.push(entry.path());
    }
    entries.sort();

    Ok(entries)
}

fn remove(path: &Path) -> Result<()> {
    if path.is_dir() {
        fs::remove_dir_all(path)?;
    } else {
        fs::remove_file(path)?;
    }
    Ok(())
}

/// Moves the final directory's contents into the dated archive folder for
/// `yesterday`, then empties `figs` (keeping the logo) and `figs_cropped`.
/// An archive folder that already holds files is never written to.
pub fn archive_yesterday(paths: &Paths, yesterday: NaiveDate) -> Result<ArchiveOutcome> {
    let target = paths.archive().join(archive_dir_name(yesterday));

    if target.is_dir() && fs::read_dir(&target)?.next().is_some() {
        info!(target = %target.display(), "there are already files there, will not overwrite");
        return Ok(ArchiveOutcome::AlreadyArchived { target });
    }
    fs::create_dir_all(&target)?;

    let finals = visible_entries(&paths.figs_final(), None)?;
    info!(count = finals.len(), target = %target.display(), "moving final images");
    for path in &finals {
        if let Some(name) = path.file_name() {
            fs::rename(path, target.join(name))?;
        }
    }

    for path in visible_entries(&paths.figs(), Some(paths.logo.as_str()))? {
        remove(&path)?;
    }
    for path in visible_entries(&paths.figs_cropped(), None)? {
        remove(&path)?;
    }

    Ok(ArchiveOutcome::Archived {
        target,
        moved: finals.len(),
    })
}

// -- Tests -------------------------------------------------------------------
