//! Wire types for the two documents the player exposes.
//!
//! The player page embeds a `streams` array (quality label per stream id) and
//! a CDN entry pointing at the JSON manifest. The manifest itself lists the
//! segmented video and audio renditions for one clip.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Which elementary stream a rendition belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Video,
    Audio,
}

impl TrackKind {
    /// Extension used for the intermediate elementary-stream file.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Video => ".m4v",
            Self::Audio => ".m4a",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `{id, quality}` pair from the player page `streams` array.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StreamEntry {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub quality: String,
    #[serde(default)]
    pub profile: Option<serde_json::Value>,
    #[serde(default)]
    pub fps: Option<f64>,
}

impl StreamEntry {
    /// Numeric part of the stream id, i.e. the text before the first `-`.
    pub fn rendition_id(&self) -> &str {
        self.id.split('-').next().unwrap_or(&self.id)
    }
}

/// CDN entry embedded in the player page. Only the manifest URL is used.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CdnEntry {
    pub url: String,
}

/// One binary chunk of a rendition, in playback order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Segment {
    pub url: String,
    /// Declared byte size, trusted as-is for progress accounting.
    #[serde(default)]
    pub size: u64,
}

/// One encoded variant of a track.
///
/// Video renditions are ranked by `height`, audio renditions by `bitrate`;
/// the field that does not apply defaults to zero.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Rendition {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub bitrate: u64,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub codecs: Option<String>,
    /// Base64 encoded container header.
    #[serde(default)]
    pub init_segment: String,
    pub segments: Vec<Segment>,
}

/// Manifest body as served by the CDN.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ManifestBody {
    #[serde(deserialize_with = "string_or_number")]
    pub clip_id: String,
    pub base_url: String,
    pub video: Vec<Rendition>,
    pub audio: Vec<Rendition>,
}

/// Ids show up both as JSON strings and as bare numbers depending on the
/// player version.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Num(n) => n.to_string(),
    })
}
