//! Combining the two elementary streams into one container.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use process_utils::{last_stderr_line, tool_command};
use tracing::{debug, info, warn};

use crate::error::MuxError;

/// Copies one video and one audio stream into `output` without re-encoding.
#[async_trait]
pub trait Muxer: Send + Sync {
    async fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<(), MuxError>;
}

/// [`Muxer`] backed by an `ffmpeg` binary.
#[derive(Debug, Clone)]
pub struct FfmpegMuxer {
    ffmpeg_path: PathBuf,
}

impl Default for FfmpegMuxer {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegMuxer {
    /// Uses `ffmpeg` from `PATH`.
    pub fn new() -> Self {
        Self::with_ffmpeg_path("ffmpeg")
    }

    pub fn with_ffmpeg_path(path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: path.into(),
        }
    }

    pub fn ffmpeg_path(&self) -> &Path {
        &self.ffmpeg_path
    }

    /// Whether the configured binary can be started.
    pub async fn is_available(&self) -> bool {
        process_utils::program_available(&self.ffmpeg_path, "-version").await
    }

    fn build_args(&self, video: &Path, audio: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-hide_banner", "-nostats", "-loglevel", "error", "-y"]
            .into_iter()
            .map(OsString::from)
            .collect();

        args.push("-i".into());
        args.push(video.into());
        args.push("-i".into());
        args.push(audio.into());

        // Stream copy on both tracks; `-strict -2` admits experimental codecs.
        args.extend(
            ["-c:v", "copy", "-c:a", "copy", "-strict", "-2"]
                .into_iter()
                .map(OsString::from),
        );

        args.push(output.into());
        args
    }
}

#[async_trait]
impl Muxer for FfmpegMuxer {
    async fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<(), MuxError> {
        let args = self.build_args(video, audio, output);
        debug!("FFmpeg args: {:?}", args);

        let mut cmd = tool_command(&self.ffmpeg_path);
        cmd.args(&args).env("LC_ALL", "C");

        let command_output = cmd.output().await.map_err(|source| MuxError::Spawn {
            program: self.ffmpeg_path.display().to_string(),
            source,
        })?;

        if !command_output.status.success() {
            let message = last_stderr_line(&command_output.stderr)
                .unwrap_or_else(|| "Unknown ffmpeg error".to_string());
            return Err(MuxError::Failed {
                code: command_output.status.code(),
                message,
            });
        }

        Ok(())
    }
}

/// Run `muxer`, then delete both inputs if and only if it succeeded.
///
/// On failure the inputs stay on disk so nothing already downloaded is lost.
/// A failed delete after a successful mux is logged and otherwise ignored.
pub async fn mux_and_cleanup(
    muxer: &dyn Muxer,
    video: &Path,
    audio: &Path,
    output: &Path,
) -> Result<(), MuxError> {
    muxer.mux(video, audio, output).await?;

    for input in [video, audio] {
        match tokio::fs::remove_file(input).await {
            Ok(()) => debug!("Removed intermediate file {}", input.display()),
            Err(e) => warn!("Failed to remove intermediate file {}: {}", input.display(), e),
        }
    }

    info!("Muxed {}", output.display());
    Ok(())
}
