use std::io;
use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;
use vimeo_parser::{ManifestError, TrackKind};

/// Failure while opening or reading one segment body.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {0}")]
    Status(StatusCode),

    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum DownloadError {
    /// Segment `index` could not be fetched; later segments were not attempted.
    #[error("segment {index} ({url}) failed: {reason}")]
    Segment {
        index: usize,
        url: String,
        reason: String,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DownloadError {
    pub fn segment(index: usize, url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Segment {
            index,
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Index of the failed segment, if the failure was a transfer.
    pub fn segment_index(&self) -> Option<usize> {
        match self {
            Self::Segment { index, .. } => Some(*index),
            Self::Io { .. } => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum MuxError {
    /// The muxer binary is missing or could not be started.
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("muxer exited with {}: {message}", exit_code_label(.code))]
    Failed { code: Option<i32>, message: String },
}

fn exit_code_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "a signal".to_string(),
    }
}

/// Everything that can abort a single episode.
#[derive(Debug, Error)]
pub enum EpisodeError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("{track} download failed: {source}")]
    Download {
        track: TrackKind,
        #[source]
        source: DownloadError,
    },

    #[error("mux failed: {0}")]
    Mux(#[from] MuxError),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl EpisodeError {
    pub fn download(track: TrackKind, source: DownloadError) -> Self {
        Self::Download { track, source }
    }
}
