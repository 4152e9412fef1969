//! Error taxonomy for a capture run.

use std::{io, time::Duration};

use thiserror::Error;

/// Failure while streaming an asset to disk.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },
}

/// Browser or page level fault during a capture session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("webdriver: {0}")]
    WebDriver(#[from] thirtyfour::error::WebDriverError),

    #[error("unexpected script result: {0}")]
    Script(#[from] serde_json::Error),

    #[error("navigation did not settle within {0:?}")]
    Timeout(Duration),

    #[error("page error: {0}")]
    Page(String),
}

/// Top-level error returned by a run.
#[derive(Debug, Error)]
pub enum FontError {
    /// The font or its variant list could not be determined.
    #[error("font not found: {0}")]
    Resolution(String),

    #[error("invalid filter: {0}")]
    Filter(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("config: {0}")]
    Config(String),
}

impl FontError {
    /// Process exit code: 1 when nothing could be resolved, 2 for I/O faults.
    pub fn exit_code(&self) -> i32 {
        match self {
            FontError::Resolution(_) | FontError::Filter(_) => 1,
            FontError::Fetch(_) | FontError::Session(_) | FontError::Config(_) => 2,
        }
    }
}
