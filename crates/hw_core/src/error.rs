use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Posting error: {0}")]
    Posting(String),

    #[error("Failed to load bot state from {}: {reason}", path.display())]
    CorruptState { path: PathBuf, reason: String },

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    /// Errors that must stop the process instead of ending the current cycle.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Configuration(_) | Error::CorruptState { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
