//! Download engine for segmented clips.
//!
//! [`AdaptivePipeline`] drives one episode: it asks a
//! [`vimeo_parser::ManifestClient`] for the manifest, selects a video and an
//! audio rendition, assembles each into an intermediate file with
//! [`SegmentAssembler`], and hands both to a [`Muxer`]. The intermediates are
//! removed only after a successful mux.

pub mod assembler;
pub mod error;
pub mod mux;
pub mod pipeline;
pub mod progress;
pub mod source;

pub use assembler::SegmentAssembler;
pub use error::{DownloadError, EpisodeError, MuxError, SourceError};
pub use mux::{FfmpegMuxer, Muxer, mux_and_cleanup};
pub use pipeline::{AdaptivePipeline, PipelineConfig};
pub use progress::{ProgressEvent, ProgressHandler};
pub use source::{HttpSegmentSource, SegmentSource, SegmentStream};
