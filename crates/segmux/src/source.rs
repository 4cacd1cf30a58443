//! Where segment bodies come from.

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use reqwest::Client;
use tracing::trace;
use url::Url;

use crate::error::SourceError;

/// Body of one segment, yielded in transport-sized chunks.
pub type SegmentStream = BoxStream<'static, Result<Bytes, SourceError>>;

#[async_trait]
pub trait SegmentSource: Send + Sync {
    /// Start the transfer of `url`. Errors before the first byte are returned
    /// here, errors mid-body come through the stream.
    async fn open(&self, url: &Url) -> Result<SegmentStream, SourceError>;
}

/// Streams segments over a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpSegmentSource {
    client: Client,
}

impl HttpSegmentSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SegmentSource for HttpSegmentSource {
    async fn open(&self, url: &Url) -> Result<SegmentStream, SourceError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status));
        }

        trace!(%url, content_length = ?response.content_length(), "Segment response");
        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(SourceError::from))
            .boxed())
    }
}
