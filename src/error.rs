//! Error handling and custom error types
//!
//! Provides unified error handling across the relay using thiserror.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Upstream reported error (status {status}): {detail}")]
    UpstreamReported { status: u16, detail: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True for failures that happened before any upstream call was made.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
