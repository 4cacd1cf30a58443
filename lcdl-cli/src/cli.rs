use std::path::PathBuf;

use clap::builder::FalseyValueParser;
use clap::{Args as ClapArgs, Parser, Subcommand};
use vimeo_parser::client::{DEFAULT_PLAYER_URL, DEFAULT_REFERER};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Library root
    #[arg(long, env = "LOCAL_PATH", global = true, default_value = ".")]
    pub local_path: PathBuf,

    /// Series directory below the library root
    #[arg(long, env = "SERIES_FOLDER", global = true, default_value = "series")]
    pub series_folder: String,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log errors and hide progress bars
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download a single clip by media id
    Episode {
        /// Player media id
        media_id: String,

        /// Destination file
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        download: DownloadArgs,
    },

    /// Download every catalog episode missing from the library
    Sync {
        /// Catalog JSON file (defaults to `<local-path>/cache.json`)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Only this series (name or slug); repeatable
        #[arg(short, long = "series")]
        series: Vec<String>,

        /// Comma separated episode numbers, paired with `--series` by position
        #[arg(short, long = "episodes")]
        episodes: Vec<String>,

        #[command(flatten)]
        download: DownloadArgs,
    },

    /// Record the current library in the skip file
    Skips,

    /// Show what the library holds
    Inventory,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct DownloadArgs {
    /// Preferred video quality label, e.g. 720p; falls back to the tallest rendition
    #[arg(long, env = "VIDEO_QUALITY")]
    pub video_quality: Option<String>,

    /// Retry failed episodes. From the environment, `0`, `no`, `off`,
    /// `false` and an empty value disable it; anything else enables it
    #[arg(long, env = "RETRY_DOWNLOAD", value_parser = FalseyValueParser::new())]
    pub retry: bool,

    /// Attempts per episode when retrying
    #[arg(long, env = "RETRY_ATTEMPTS", default_value_t = 3)]
    pub retry_attempts: u32,

    /// ffmpeg binary used to merge audio and video
    #[arg(long, env = "FFMPEG_PATH", default_value = "ffmpeg")]
    pub ffmpeg_path: PathBuf,

    /// Player endpoint the media id is appended to
    #[arg(long, env = "PLAYER_URL", default_value = DEFAULT_PLAYER_URL)]
    pub player_url: String,

    /// Referer sent with player requests
    #[arg(long, env = "PLAYER_REFERER", default_value = DEFAULT_REFERER)]
    pub referer: String,

    /// Connect and read timeout in seconds
    #[arg(long, env = "HTTP_TIMEOUT", default_value_t = 30)]
    pub timeout: u64,
}
