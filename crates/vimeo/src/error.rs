use reqwest::StatusCode;
use thiserror::Error;

use crate::models::TrackKind;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("HTTP request failed for {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request failed with HTTP {status} during {operation} for {url}")]
    HttpStatus {
        status: StatusCode,
        url: String,
        operation: &'static str,
    },

    /// The player page or manifest no longer has the expected shape.
    #[error("parse error: {reason}")]
    Parse { reason: String },

    #[error("manifest has no {kind} renditions")]
    NoRenditions { kind: TrackKind },
}

impl ManifestError {
    pub fn fetch(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Fetch {
            url: url.into(),
            source,
        }
    }

    pub fn http_status(
        status: StatusCode,
        url: impl Into<String>,
        operation: &'static str,
    ) -> Self {
        Self::HttpStatus {
            status,
            url: url.into(),
            operation,
        }
    }

    pub fn parse(reason: impl Into<String>) -> Self {
        Self::Parse {
            reason: reason.into(),
        }
    }

    /// Schema drift on the remote side, as opposed to a transport problem.
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}

impl From<serde_json::Error> for ManifestError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse(format!("invalid JSON: {err}"))
    }
}

impl From<url::ParseError> for ManifestError {
    fn from(err: url::ParseError) -> Self {
        Self::parse(format!("invalid URL: {err}"))
    }
}
