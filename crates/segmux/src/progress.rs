use std::path::PathBuf;
use std::sync::Arc;

use vimeo_parser::TrackKind;

/// Pipeline progress, emitted inline from the download task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// A track download is starting. `total` is the sum of declared segment sizes.
    TrackStarted {
        track: TrackKind,
        segments: usize,
        total: u64,
    },
    /// Bytes written for the current track so far, against the declared total.
    Bytes {
        track: TrackKind,
        downloaded: u64,
        total: u64,
    },
    TrackFinished {
        track: TrackKind,
    },
    /// The track stopped early; no further events follow for it.
    TrackFailed {
        track: TrackKind,
    },
    Muxing {
        output: PathBuf,
    },
}

/// Receiver for [`ProgressEvent`]s. Called synchronously; keep it cheap.
pub type ProgressHandler = Arc<dyn Fn(ProgressEvent) + Send + Sync>;
