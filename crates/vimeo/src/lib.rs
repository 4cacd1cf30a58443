//! Manifest discovery for segmented player clips.
//!
//! [`ManifestClient`] fetches the embedded player page for a media id, lifts
//! the stream list and CDN manifest URL out of it, and fetches the manifest.
//! [`Manifest`] then selects the video and audio renditions to download and
//! turns their segment lists into absolute URLs.

pub mod client;
pub mod error;
pub mod http;
pub mod manifest;
pub mod models;

pub use client::{ManifestClient, ManifestClientConfig, PlayerManifest, parse_player_page};
pub use error::ManifestError;
pub use http::{HttpClientConfig, build_client, install_rustls_provider};
pub use manifest::{Manifest, ResolvedRendition, ResolvedSegment, StreamDescriptor};
pub use models::{Rendition, Segment, StreamEntry, TrackKind};
