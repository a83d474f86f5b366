//! Error types for the CLI runtime.

use std::io;
use std::path::PathBuf;

use sift::{MalformedPatternError, SearchError};
use thiserror::Error;

use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("failed to read options file {path}: {source}")]
    ReadOptions { path: PathBuf, source: io::Error },
    #[error("failed to parse options file {path}: {source}")]
    ParseOptions {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to read {path}: {source}")]
    ReadSource { path: PathBuf, source: io::Error },
    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error("no {language} files found under the given paths")]
    NoInputs { language: String },
    #[error("invalid pattern: {0}")]
    Pattern(Box<MalformedPatternError>),
    #[error("search failed: {0}")]
    Search(#[from] SearchError),
    #[error("failed to serialise results: {0}")]
    Serialise(#[from] serde_json::Error),
    #[error("failed to write output: {0}")]
    Write(#[from] io::Error),
}

impl From<MalformedPatternError> for AppError {
    fn from(error: MalformedPatternError) -> Self {
        Self::Pattern(Box::new(error))
    }
}

impl AppError {
    /// Returns the notes attached to a pattern diagnostic.
    pub(crate) fn notes(&self) -> &[String] {
        match self {
            Self::Pattern(error) => error.diagnostic().notes(),
            _ => &[],
        }
    }
}
