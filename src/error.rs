use reqwest::StatusCode;
use url::Url;

use std::fmt::{self, Display, Formatter};

#[derive(Debug)]
pub enum Error {
    /// Bad base url or environment value. Never retried.
    Configuration(String),
    Request(reqwest::Error),
    Status { url: Url, status: StatusCode },
}

impl Error {
    pub fn configuration_error(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// True for failures of a single fetch attempt, which the orchestrator recovers from.
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Status { .. })
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::Request(e)
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Self::Configuration(e.to_string())
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "Configuration error: {msg}"),
            Self::Request(e) => write!(f, "Request error: {e}"),
            Self::Status { url, status } => write!(f, "Request error: {url} returned {status}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Request(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
