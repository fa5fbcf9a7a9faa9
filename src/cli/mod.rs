//! Command line interface.

pub mod command;

use std::{path::PathBuf, time::Duration};

use chrono::NaiveDate;
use clap::{command, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Parser)]
#[command(version, about, long_about = None)]
/// Contains the commands
pub struct Cli {
    /// Configuration file [default: forecast.toml]
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Run date (YYYY-MM-DD) [default: today]
    #[arg(long, global = true)]
    pub date: Option<NaiveDate>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Archive, download, animate and process in one go
    Run {},
    /// Archive yesterday's final images
    Archive {},
    /// Download every feed and write the switch ledger
    Download {},
    /// Animate downloaded model frames
    Animate {},
    /// Crop, annotate and join images, then fill the final directory
    Process {},
    /// Back up and refresh the observed-imagery slides
    Refresh {},
    /// List the feeds and what they fetch
    Catalog {},
}

/// Creates a spinner.
pub fn create_spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner().with_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));

    bar
}

/// Creates a progress bar.
pub fn create_progress_bar(size: u64, message: String) -> ProgressBar {
    let style = ProgressStyle::with_template("[{eta_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");

    ProgressBar::new(size).with_message(message).with_style(style)
}

// -- Tests -------------------------------------------------------------------
