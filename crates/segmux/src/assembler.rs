//! Writes an init segment followed by an ordered segment list into one file.

use std::path::Path;
use std::sync::Arc;

use futures::StreamExt;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument, warn};
use url::Url;
use vimeo_parser::ResolvedSegment;

use crate::error::{DownloadError, SourceError};
use crate::source::SegmentSource;

/// Why a single segment copy stopped.
enum CopyFailure {
    Source(SourceError),
    Write(std::io::Error),
}

pub struct SegmentAssembler {
    source: Arc<dyn SegmentSource>,
}

impl SegmentAssembler {
    pub fn new(source: Arc<dyn SegmentSource>) -> Self {
        Self { source }
    }

    /// Assemble `segments` into `output`, init segment first.
    ///
    /// `output` is truncated before anything is written. Segments are fetched
    /// strictly in order; the first failure stops the run and the file is cut
    /// back to the end of the last complete segment.
    ///
    /// `on_progress(downloaded, total)` is driven by declared sizes: within a
    /// segment it advances with received bytes (capped at the declared size),
    /// and after each segment it lands exactly on the declared running sum.
    /// Returns the declared total.
    #[instrument(skip_all, fields(output = %output.display(), segments = segments.len()))]
    pub async fn assemble(
        &self,
        init_segment: &[u8],
        segments: &[ResolvedSegment],
        output: &Path,
        on_progress: &mut (dyn FnMut(u64, u64) + Send),
    ) -> Result<u64, DownloadError> {
        let total: u64 = segments.iter().map(|segment| segment.size).sum();

        let file = File::create(output)
            .await
            .map_err(|e| DownloadError::io(output, e))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(init_segment)
            .await
            .map_err(|e| DownloadError::io(output, e))?;

        let mut written = init_segment.len() as u64;
        let mut completed = 0u64;

        for (index, segment) in segments.iter().enumerate() {
            let copied = self
                .copy_segment(&segment.url, &mut writer, completed, segment.size, total, on_progress)
                .await;

            match copied {
                Ok(bytes) => written += bytes,
                Err(CopyFailure::Source(e)) => {
                    warn!(index, url = %segment.url, error = %e, "Segment transfer failed");
                    truncate_to(&mut writer, written)
                        .await
                        .map_err(|e| DownloadError::io(output, e))?;
                    return Err(DownloadError::segment(index, segment.url.as_str(), e));
                }
                Err(CopyFailure::Write(e)) => return Err(DownloadError::io(output, e)),
            }

            completed += segment.size;
            on_progress(completed, total);
        }

        writer
            .flush()
            .await
            .map_err(|e| DownloadError::io(output, e))?;

        debug!(bytes_written = written, declared = total, "Assembly complete");
        Ok(total)
    }

    async fn copy_segment(
        &self,
        url: &Url,
        writer: &mut BufWriter<File>,
        completed: u64,
        declared: u64,
        total: u64,
        on_progress: &mut (dyn FnMut(u64, u64) + Send),
    ) -> Result<u64, CopyFailure> {
        let mut body = self.source.open(url).await.map_err(CopyFailure::Source)?;
        let mut received = 0u64;

        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(CopyFailure::Source)?;
            writer.write_all(&chunk).await.map_err(CopyFailure::Write)?;
            received += chunk.len() as u64;
            on_progress(completed + received.min(declared), total);
        }

        Ok(received)
    }
}

/// Drop whatever a failed segment left behind.
async fn truncate_to(writer: &mut BufWriter<File>, len: u64) -> std::io::Result<()> {
    writer.flush().await?;
    writer.get_mut().set_len(len).await
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use bytes::Bytes;
    use futures::stream;

    use super::*;
    use crate::source::SegmentStream;

    enum Body {
        Chunks(Vec<&'static str>),
        RefuseOpen,
        BreakAfter(&'static str),
    }

    #[derive(Default)]
    struct FakeSource {
        bodies: HashMap<Url, Body>,
        requested: Mutex<Vec<Url>>,
    }

    impl FakeSource {
        fn with(mut self, url: &Url, body: Body) -> Self {
            self.bodies.insert(url.clone(), body);
            self
        }

        fn requested(&self) -> Vec<Url> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SegmentSource for FakeSource {
        async fn open(&self, url: &Url) -> Result<SegmentStream, SourceError> {
            self.requested.lock().unwrap().push(url.clone());
            match self.bodies.get(url) {
                Some(Body::Chunks(chunks)) => {
                    let chunks: Vec<Result<Bytes, SourceError>> = chunks
                        .iter()
                        .map(|c| Ok(Bytes::copy_from_slice(c.as_bytes())))
                        .collect();
                    Ok(stream::iter(chunks).boxed())
                }
                Some(Body::BreakAfter(first)) => Ok(stream::iter(vec![
                    Ok(Bytes::copy_from_slice(first.as_bytes())),
                    Err(SourceError::Other("connection reset".to_string())),
                ])
                .boxed()),
                Some(Body::RefuseOpen) | None => Err(SourceError::Other("refused".to_string())),
            }
        }
    }

    fn seg(n: usize, size: u64) -> ResolvedSegment {
        ResolvedSegment {
            url: Url::parse(&format!("https://cdn.example.com/chop/segment-{n}.m4s")).unwrap(),
            size,
        }
    }

    #[tokio::test]
    async fn init_only_writes_exactly_the_init_segment() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("clip.m4v");
        let assembler = SegmentAssembler::new(Arc::new(FakeSource::default()));

        let mut calls = 0;
        let total = assembler
            .assemble(b"ftypmoov", &[], &out, &mut |_, _| calls += 1)
            .await
            .unwrap();

        assert_eq!(total, 0);
        assert_eq!(calls, 0);
        assert_eq!(std::fs::read(&out).unwrap(), b"ftypmoov");
    }

    #[tokio::test]
    async fn progress_follows_declared_sizes() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("clip.m4v");
        let segments = vec![seg(1, 10), seg(2, 4), seg(3, 100)];
        let source = FakeSource::default()
            .with(&segments[0].url, Body::Chunks(vec!["aaaa", "aaaaaaaa"]))
            .with(&segments[1].url, Body::Chunks(vec!["bb"]))
            .with(&segments[2].url, Body::Chunks(vec!["ccc"]));
        let assembler = SegmentAssembler::new(Arc::new(source));

        let mut ticks = Vec::new();
        let total = assembler
            .assemble(b"I", &segments, &out, &mut |done, total| ticks.push((done, total)))
            .await
            .unwrap();

        assert_eq!(total, 114);
        assert_eq!(std::fs::read(&out).unwrap(), b"Iaaaaaaaaaaaabbccc");
        assert_eq!(ticks.last(), Some(&(114, 114)));
        assert!(ticks.windows(2).all(|w| w[0].0 <= w[1].0));
        assert!(ticks.iter().all(|&(done, total)| total == 114 && done <= total));
        // One tick per chunk plus one per completed segment.
        assert_eq!(ticks.len(), 4 + 3);
        assert_eq!(ticks[0], (4, 114));
        assert_eq!(ticks[1], (10, 114));
        assert_eq!(ticks[2], (10, 114));
    }

    #[tokio::test]
    async fn failure_stops_at_the_failing_segment() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("clip.m4a");
        let segments = vec![seg(1, 2), seg(2, 2), seg(3, 2), seg(4, 2)];
        let source = Arc::new(
            FakeSource::default()
                .with(&segments[0].url, Body::Chunks(vec!["s0"]))
                .with(&segments[1].url, Body::Chunks(vec!["s1"]))
                .with(&segments[2].url, Body::RefuseOpen)
                .with(&segments[3].url, Body::Chunks(vec!["s3"])),
        );
        let assembler = SegmentAssembler::new(source.clone());

        let err = assembler
            .assemble(b"init", &segments, &out, &mut |_, _| {})
            .await
            .unwrap_err();

        assert_eq!(err.segment_index(), Some(2));
        assert_eq!(std::fs::read(&out).unwrap(), b"inits0s1");
        assert_eq!(source.requested(), vec![
            segments[0].url.clone(),
            segments[1].url.clone(),
            segments[2].url.clone(),
        ]);
    }

    #[tokio::test]
    async fn broken_body_is_cut_back_to_the_last_complete_segment() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("clip.m4v");
        let segments = vec![seg(1, 3), seg(2, 3)];
        let source = FakeSource::default()
            .with(&segments[0].url, Body::Chunks(vec!["one"]))
            .with(&segments[1].url, Body::BreakAfter("tw"));
        let assembler = SegmentAssembler::new(Arc::new(source));

        let err = assembler
            .assemble(b"H", &segments, &out, &mut |_, _| {})
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::Segment { index: 1, .. }));
        assert!(err.to_string().contains("connection reset"));
        assert_eq!(std::fs::read(&out).unwrap(), b"Hone");
    }

    #[tokio::test]
    async fn stale_output_is_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("clip.m4v");
        std::fs::write(&out, b"leftover from an earlier attempt").unwrap();
        let segments = vec![seg(1, 1)];
        let source = FakeSource::default().with(&segments[0].url, Body::Chunks(vec!["x"]));
        let assembler = SegmentAssembler::new(Arc::new(source));

        assembler
            .assemble(b"I", &segments, &out, &mut |_, _| {})
            .await
            .unwrap();

        assert_eq!(std::fs::read(&out).unwrap(), b"Ix");
    }

    #[tokio::test]
    async fn unwritable_output_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("missing-dir").join("clip.m4v");
        let assembler = SegmentAssembler::new(Arc::new(FakeSource::default()));

        let err = assembler
            .assemble(b"I", &[], &out, &mut |_, _| {})
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::Io { .. }));
        assert_eq!(err.segment_index(), None);
    }
}
