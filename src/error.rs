//! Pipeline error type.

use std::{io, path::PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("cannot read configuration `{path}`: {source}")]
    ConfigRead { path: PathBuf, source: io::Error },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unknown feed `{0}`")]
    UnknownFeed(String),

    #[error("malformed switch ledger line {line}: `{text}`")]
    MalformedLedger { line: usize, text: String },

    #[error("cannot read switch ledger `{path}`: {source}")]
    LedgerRead { path: PathBuf, source: io::Error },

    #[error("image tool `{program}` failed: {message}")]
    ImageTool { program: String, message: String },
}

impl PipelineError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn image_tool(program: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ImageTool {
            program: program.into(),
            message: message.into(),
        }
    }
}
