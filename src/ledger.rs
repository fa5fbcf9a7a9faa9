//! The switch ledger: which feeds produced usable imagery this run.
//!
//! Written once after downloading and read by every later stage. The file
//! format is one `<name> = True ` / `<name> = False ` line per feed.

use std::{collections::BTreeMap, fs, io::Write, path::Path};

use tempfile::NamedTempFile;

use crate::{
    error::{PipelineError, Result},
    feed::FeedId,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwitchLedger {
    switches: BTreeMap<FeedId, bool>,
}

impl SwitchLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the switch of `feed`, replacing any earlier value.
    pub fn record(&mut self, feed: FeedId, enabled: bool) {
        self.switches.insert(feed, enabled);
    }

    /// Absent feeds are disabled.
    pub fn is_enabled(&self, feed: FeedId) -> bool {
        self.switches.get(&feed).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.switches.len()
    }

    /// Entries in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (FeedId, bool)> + '_ {
        self.switches.iter().map(|(feed, on)| (*feed, *on))
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for (feed, on) in self.iter() {
            out.push_str(feed.name());
            out.push_str(if on { " = True \n" } else { " = False \n" });
        }
        out
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut ledger = SwitchLedger::new();

        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            let malformed = || PipelineError::MalformedLedger {
                line: index + 1,
                text: raw.to_string(),
            };

            let (name, value) = line.split_once(" = ").ok_or_else(malformed)?;
            let feed: FeedId = name.trim().parse().map_err(|_| malformed())?;
            let enabled = match value.trim() {
                "True" => true,
                "False" => false,
                _ => return Err(malformed()),
            };
            ledger.record(feed, enabled);
        }

        Ok(ledger)
    }

    /// Writes the ledger to `path` atomically, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(self.render().as_bytes())?;
        tmp.flush()?;
        tmp.persist(path).map_err(|e| PipelineError::Io(e.error))?;

        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| PipelineError::LedgerRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }
}

// -- Tests -------------------------------------------------------------------
