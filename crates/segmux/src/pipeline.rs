//! One episode, start to finish: fetch, select, download both tracks, mux.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info, instrument};
use vimeo_parser::{ManifestClient, ResolvedRendition, TrackKind};

use crate::assembler::SegmentAssembler;
use crate::error::EpisodeError;
use crate::mux::{Muxer, mux_and_cleanup};
use crate::progress::{ProgressEvent, ProgressHandler};
use crate::source::SegmentSource;

#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Quality label to prefer, e.g. `720p`. `None` always takes the tallest rendition.
    pub target_quality: Option<String>,
}

pub struct AdaptivePipeline {
    manifests: ManifestClient,
    assembler: SegmentAssembler,
    muxer: Arc<dyn Muxer>,
    config: PipelineConfig,
    progress: Option<ProgressHandler>,
}

impl AdaptivePipeline {
    pub fn new(
        manifests: ManifestClient,
        source: Arc<dyn SegmentSource>,
        muxer: Arc<dyn Muxer>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            manifests,
            assembler: SegmentAssembler::new(source),
            muxer,
            config,
            progress: None,
        }
    }

    pub fn with_progress(mut self, handler: ProgressHandler) -> Self {
        self.progress = Some(handler);
        self
    }

    /// Download `media_id` into `output`.
    ///
    /// Failures are logged and reported as `false`; they never escape as
    /// errors so the caller can move on to the next episode.
    pub async fn download_adaptive(&self, media_id: &str, output: &Path) -> bool {
        match self.try_download(media_id, output).await {
            Ok(path) => {
                info!(media_id, output = %path.display(), "Episode downloaded");
                true
            }
            Err(e) => {
                error!(media_id, output = %output.display(), error = %e, "Episode download failed");
                false
            }
        }
    }

    /// Same as [`download_adaptive`](Self::download_adaptive), keeping the error.
    #[instrument(skip(self, output), fields(output = %output.display()))]
    pub async fn try_download(
        &self,
        media_id: &str,
        output: &Path,
    ) -> Result<PathBuf, EpisodeError> {
        let fetched = self.manifests.fetch_manifest(media_id).await?;
        let manifest = &fetched.manifest;

        let video = manifest.select_video(&fetched.streams, self.config.target_quality.as_deref())?;
        let audio = manifest.select_audio()?;
        info!(
            clip_id = %manifest.clip_id,
            video_id = %video.rendition.id,
            height = video.rendition.height,
            audio_id = %audio.rendition.id,
            bitrate = audio.rendition.bitrate,
            "Selected renditions"
        );

        let work_dir = working_dir(output);
        tokio::fs::create_dir_all(work_dir)
            .await
            .map_err(|source| EpisodeError::Io {
                path: work_dir.to_path_buf(),
                source,
            })?;

        let video_path = work_dir.join(manifest.intermediate_file_name(TrackKind::Video));
        let audio_path = work_dir.join(manifest.intermediate_file_name(TrackKind::Audio));

        self.download_track(&video, &video_path).await?;
        self.download_track(&audio, &audio_path).await?;

        self.emit(ProgressEvent::Muxing {
            output: output.to_path_buf(),
        });
        mux_and_cleanup(self.muxer.as_ref(), &video_path, &audio_path, output).await?;

        Ok(output.to_path_buf())
    }

    async fn download_track(
        &self,
        rendition: &ResolvedRendition,
        path: &Path,
    ) -> Result<(), EpisodeError> {
        let track = rendition.kind;
        self.emit(ProgressEvent::TrackStarted {
            track,
            segments: rendition.segments.len(),
            total: rendition.total_size(),
        });

        let mut on_progress = |downloaded: u64, total: u64| {
            self.emit(ProgressEvent::Bytes {
                track,
                downloaded,
                total,
            });
        };

        let assembled = self
            .assembler
            .assemble(
                &rendition.init_segment,
                &rendition.segments,
                path,
                &mut on_progress,
            )
            .await;
        if let Err(e) = assembled {
            self.emit(ProgressEvent::TrackFailed { track });
            return Err(EpisodeError::download(track, e));
        }

        self.emit(ProgressEvent::TrackFinished { track });
        Ok(())
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(handler) = &self.progress {
            handler(event);
        }
    }
}

/// Directory the intermediates go into: the one holding `output`.
fn working_dir(output: &Path) -> &Path {
    match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intermediates_live_next_to_the_output() {
        assert_eq!(
            working_dir(Path::new("/lib/series/laravel-8/01-Intro.mp4")),
            Path::new("/lib/series/laravel-8")
        );
        assert_eq!(working_dir(Path::new("01-Intro.mp4")), Path::new("."));
    }
}
