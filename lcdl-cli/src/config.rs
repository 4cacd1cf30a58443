use std::time::Duration;

use segmux_engine::{FfmpegMuxer, PipelineConfig};
use url::Url;
use vimeo_parser::{HttpClientConfig, ManifestClientConfig};

use crate::cli::DownloadArgs;
use crate::error::{AppError, Result};
use crate::runner::RetryPolicy;

/// Pause between two attempts at the same episode.
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Everything needed to build a download pipeline, resolved from CLI flags
/// and environment.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub http: HttpClientConfig,
    pub manifest: ManifestClientConfig,
    pub pipeline: PipelineConfig,
    pub muxer: FfmpegMuxer,
    pub retry: RetryPolicy,
}

impl DownloadConfig {
    pub fn from_args(args: &DownloadArgs) -> Result<Self> {
        let mut player_url = Url::parse(&args.player_url).map_err(|e| {
            AppError::Config(format!("invalid player URL `{}`: {e}", args.player_url))
        })?;
        // The media id is joined onto this URL, so it has to end in a slash.
        if !player_url.path().ends_with('/') {
            let path = format!("{}/", player_url.path());
            player_url.set_path(&path);
        }

        if args.timeout == 0 {
            return Err(AppError::Config("HTTP timeout must be positive".to_string()));
        }
        let timeout = Duration::from_secs(args.timeout);

        let target_quality = args
            .video_quality
            .as_deref()
            .map(str::trim)
            .filter(|quality| !quality.is_empty())
            .map(str::to_owned);

        Ok(Self {
            http: HttpClientConfig {
                connect_timeout: timeout,
                read_timeout: timeout,
                ..HttpClientConfig::default()
            },
            manifest: ManifestClientConfig {
                player_url,
                referer: args.referer.clone(),
            },
            pipeline: PipelineConfig { target_quality },
            muxer: FfmpegMuxer::with_ffmpeg_path(&args.ffmpeg_path),
            retry: RetryPolicy {
                attempts: if args.retry { args.retry_attempts.max(1) } else { 1 },
                delay: RETRY_DELAY,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn args() -> DownloadArgs {
        DownloadArgs {
            video_quality: Some(" 720p ".to_string()),
            retry: false,
            retry_attempts: 4,
            ffmpeg_path: PathBuf::from("/opt/ffmpeg/bin/ffmpeg"),
            player_url: "https://player.example.com/video".to_string(),
            referer: "https://courses.example.com/".to_string(),
            timeout: 20,
        }
    }

    #[test]
    fn resolves_download_config() {
        let config = DownloadConfig::from_args(&args()).unwrap();
        assert_eq!(
            config.manifest.player_url.as_str(),
            "https://player.example.com/video/"
        );
        assert_eq!(config.pipeline.target_quality.as_deref(), Some("720p"));
        assert_eq!(config.http.read_timeout, Duration::from_secs(20));
        assert_eq!(
            config.muxer.ffmpeg_path(),
            std::path::Path::new("/opt/ffmpeg/bin/ffmpeg")
        );
        assert_eq!(config.retry.attempts, 1);
    }

    #[test]
    fn retry_flag_enables_attempts() {
        let mut args = args();
        args.retry = true;
        assert_eq!(DownloadConfig::from_args(&args).unwrap().retry.attempts, 4);

        args.retry_attempts = 0;
        assert_eq!(DownloadConfig::from_args(&args).unwrap().retry.attempts, 1);
    }

    #[test]
    fn rejects_bad_values() {
        let mut bad_url = args();
        bad_url.player_url = "not a url".to_string();
        assert!(matches!(
            DownloadConfig::from_args(&bad_url),
            Err(AppError::Config(_))
        ));

        let mut no_timeout = args();
        no_timeout.timeout = 0;
        assert!(DownloadConfig::from_args(&no_timeout).is_err());

        let mut blank_quality = args();
        blank_quality.video_quality = Some("   ".to_string());
        assert_eq!(
            DownloadConfig::from_args(&blank_quality)
                .unwrap()
                .pipeline
                .target_quality,
            None
        );
    }
}
