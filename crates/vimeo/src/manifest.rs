//! Typed view over a clip manifest: URL resolution and rendition selection.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;
use url::Url;

use crate::error::ManifestError;
use crate::models::{ManifestBody, Rendition, StreamEntry, TrackKind};

/// Stream selection data lifted from the player page.
#[derive(Debug, Clone)]
pub struct StreamDescriptor {
    /// Absolute URL of the CDN manifest.
    pub manifest_url: Url,
    pub streams: Vec<StreamEntry>,
}

impl StreamDescriptor {
    /// Rendition id of the stream labelled `quality`.
    ///
    /// Labels are compared verbatim. When several streams carry the same
    /// label the last one wins.
    pub fn rendition_id_for(&self, quality: &str) -> Option<&str> {
        self.streams
            .iter()
            .rfind(|stream| stream.quality == quality)
            .map(StreamEntry::rendition_id)
    }
}

/// A segment whose URL has been made absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSegment {
    pub url: Url,
    pub size: u64,
}

/// A selected rendition, ready to be downloaded.
#[derive(Debug, Clone)]
pub struct ResolvedRendition {
    pub kind: TrackKind,
    pub rendition: Rendition,
    /// Decoded init segment.
    pub init_segment: Vec<u8>,
    pub segments: Vec<ResolvedSegment>,
}

impl ResolvedRendition {
    /// Sum of the declared segment sizes.
    pub fn total_size(&self) -> u64 {
        self.segments.iter().map(|segment| segment.size).sum()
    }
}

#[derive(Debug, Clone)]
pub struct Manifest {
    /// Where the manifest was fetched from; root of all URL resolution.
    pub master_url: Url,
    /// Path prefix declared by the manifest, relative to `master_url` or absolute.
    pub base_url: String,
    pub clip_id: String,
    pub video: Vec<Rendition>,
    pub audio: Vec<Rendition>,
}

impl Manifest {
    /// Parse a manifest body fetched from `master_url`.
    pub fn from_json(master_url: Url, body: &str) -> Result<Self, ManifestError> {
        let body: ManifestBody = serde_json::from_str(body)?;
        Ok(Self {
            master_url,
            base_url: body.base_url,
            clip_id: body.clip_id,
            video: body.video,
            audio: body.audio,
        })
    }

    /// `base_url` resolved against `master_url`.
    pub fn segment_base(&self) -> Result<Url, ManifestError> {
        Ok(self.master_url.join(&self.base_url)?)
    }

    /// Intermediate file name for a track of this clip, e.g. `abc123.m4v`.
    pub fn intermediate_file_name(&self, kind: TrackKind) -> String {
        format!("{}{}", self.clip_id, kind.extension())
    }

    /// Pick the video rendition for `target_quality`.
    ///
    /// The quality label is looked up in the player streams; if it maps to a
    /// rendition present in the manifest that rendition is used, otherwise the
    /// tallest one is.
    pub fn select_video(
        &self,
        streams: &StreamDescriptor,
        target_quality: Option<&str>,
    ) -> Result<ResolvedRendition, ManifestError> {
        let preferred = target_quality.and_then(|quality| streams.rendition_id_for(quality));
        debug!(?target_quality, ?preferred, "Selecting video rendition");

        let rendition = select_rendition(&self.video, preferred, |r| u64::from(r.height))
            .ok_or(ManifestError::NoRenditions {
                kind: TrackKind::Video,
            })?;
        self.resolve_rendition(TrackKind::Video, rendition)
    }

    /// Pick the audio rendition with the highest bitrate.
    pub fn select_audio(&self) -> Result<ResolvedRendition, ManifestError> {
        let rendition = select_rendition(&self.audio, None, |r| r.bitrate).ok_or(
            ManifestError::NoRenditions {
                kind: TrackKind::Audio,
            },
        )?;
        self.resolve_rendition(TrackKind::Audio, rendition)
    }

    /// Resolve every segment URL of `rendition` and decode its init segment.
    ///
    /// Each level is an RFC 3986 reference resolution:
    /// `master_url` -> manifest `base_url` -> rendition `base_url` -> segment `url`.
    pub fn resolve_rendition(
        &self,
        kind: TrackKind,
        rendition: &Rendition,
    ) -> Result<ResolvedRendition, ManifestError> {
        let mut base = self.segment_base()?;
        if !rendition.base_url.is_empty() {
            base = base.join(&rendition.base_url)?;
        }

        let segments = rendition
            .segments
            .iter()
            .map(|segment| {
                Ok(ResolvedSegment {
                    url: base.join(&segment.url)?,
                    size: segment.size,
                })
            })
            .collect::<Result<Vec<_>, ManifestError>>()?;

        let init_segment = STANDARD.decode(rendition.init_segment.as_bytes()).map_err(|e| {
            ManifestError::parse(format!(
                "invalid init segment for {kind} rendition {}: {e}",
                rendition.id
            ))
        })?;

        debug!(
            %kind,
            id = %rendition.id,
            base = %base,
            segments = segments.len(),
            "Resolved rendition"
        );

        Ok(ResolvedRendition {
            kind,
            rendition: rendition.clone(),
            init_segment,
            segments,
        })
    }
}

/// Explicit id first, otherwise the maximum of `metric`.
///
/// Ties on the metric go to the last rendition in manifest order.
fn select_rendition<'a>(
    renditions: &'a [Rendition],
    preferred_id: Option<&str>,
    metric: impl Fn(&Rendition) -> u64,
) -> Option<&'a Rendition> {
    preferred_id
        .and_then(|id| renditions.iter().find(|r| r.id == id))
        .or_else(|| renditions.iter().max_by_key(|r| metric(r)))
}
