use std::sync::LazyLock;

use regex::Regex;
use reqwest::{Client, header};
use tracing::{debug, instrument};
use url::Url;

use crate::error::ManifestError;
use crate::manifest::{Manifest, StreamDescriptor};
use crate::models::{CdnEntry, StreamEntry};

static STREAMS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""streams":(\[\{.+?\}\])"#).unwrap());

static CDN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(?:google_skyfire|akfire_interconnect_quic)":(\{.+?\})"#).unwrap()
});

pub const DEFAULT_PLAYER_URL: &str = "https://player.vimeo.com/video/";
pub const DEFAULT_REFERER: &str = "https://laracasts.com/";

#[derive(Debug, Clone)]
pub struct ManifestClientConfig {
    /// Player endpoint; the media id is appended as the last path segment.
    pub player_url: Url,
    /// Sent with the player page request; embeds refuse requests without it.
    pub referer: String,
}

impl Default for ManifestClientConfig {
    fn default() -> Self {
        Self {
            player_url: Url::parse(DEFAULT_PLAYER_URL).unwrap(),
            referer: DEFAULT_REFERER.to_string(),
        }
    }
}

/// Everything fetched for one media id.
#[derive(Debug, Clone)]
pub struct PlayerManifest {
    pub streams: StreamDescriptor,
    pub manifest: Manifest,
}

/// Fetches the player page and the CDN manifest for a media id.
#[derive(Debug, Clone)]
pub struct ManifestClient {
    client: Client,
    config: ManifestClientConfig,
}

impl ManifestClient {
    pub fn new(client: Client, config: ManifestClientConfig) -> Self {
        Self { client, config }
    }

    pub fn player_page_url(&self, media_id: &str) -> Result<Url, ManifestError> {
        let media_id = media_id.trim();
        if media_id.is_empty() || media_id.contains('/') {
            return Err(ManifestError::parse(format!("invalid media id `{media_id}`")));
        }
        Ok(self.config.player_url.join(media_id)?)
    }

    #[instrument(skip(self))]
    pub async fn fetch_manifest(&self, media_id: &str) -> Result<PlayerManifest, ManifestError> {
        let streams = self.fetch_stream_descriptor(media_id).await?;
        let manifest = self.fetch_manifest_at(&streams.manifest_url).await?;
        debug!(
            clip_id = %manifest.clip_id,
            video = manifest.video.len(),
            audio = manifest.audio.len(),
            "Fetched manifest"
        );
        Ok(PlayerManifest { streams, manifest })
    }

    pub async fn fetch_stream_descriptor(
        &self,
        media_id: &str,
    ) -> Result<StreamDescriptor, ManifestError> {
        let page_url = self.player_page_url(media_id)?;
        let body = self
            .get_text(&page_url, "player page", Some(&self.config.referer))
            .await?;
        parse_player_page(&page_url, &body)
    }

    pub async fn fetch_manifest_at(&self, manifest_url: &Url) -> Result<Manifest, ManifestError> {
        let body = self.get_text(manifest_url, "manifest", None).await?;
        Manifest::from_json(manifest_url.clone(), &body)
    }

    async fn get_text(
        &self,
        url: &Url,
        operation: &'static str,
        referer: Option<&str>,
    ) -> Result<String, ManifestError> {
        let mut request = self.client.get(url.clone());
        if let Some(referer) = referer {
            request = request.header(header::REFERER, referer);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ManifestError::fetch(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ManifestError::http_status(status, url.as_str(), operation));
        }

        response
            .text()
            .await
            .map_err(|e| ManifestError::fetch(url.as_str(), e))
    }
}

/// Pull the stream list and the manifest URL out of a player page.
///
/// `page_url` is used to resolve a manifest URL that is not absolute.
pub fn parse_player_page(page_url: &Url, html: &str) -> Result<StreamDescriptor, ManifestError> {
    let streams_json = capture_group_1(&STREAMS_REGEX, html)
        .ok_or_else(|| ManifestError::parse("player page has no `streams` entry"))?;
    let cdn_json = capture_group_1(&CDN_REGEX, html)
        .ok_or_else(|| ManifestError::parse("player page has no CDN manifest entry"))?;

    let streams: Vec<StreamEntry> = serde_json::from_str(streams_json)?;
    let cdn: CdnEntry = serde_json::from_str(cdn_json)?;
    let manifest_url = page_url.join(&cdn.url)?;

    debug!(streams = streams.len(), %manifest_url, "Parsed player page");

    Ok(StreamDescriptor {
        manifest_url,
        streams,
    })
}

#[inline]
fn capture_group_1<'a>(re: &Regex, input: &'a str) -> Option<&'a str> {
    re.captures(input)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
