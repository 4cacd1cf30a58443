mod cli;
mod config;
mod console;
mod error;
mod library;
mod runner;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use segmux_engine::{AdaptivePipeline, HttpSegmentSource};
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};
use vimeo_parser::{ManifestClient, build_client};

use crate::{
    cli::{Args, Commands},
    config::DownloadConfig,
    console::{ConsoleProgress, section},
    error::Result,
    library::{
        LibraryPaths, build_filters, count_episodes, load_catalog, local_inventory,
        missing_episodes, write_skip_file,
    },
    runner::Runner,
};

#[tokio::main]
async fn main() -> ExitCode {
    let env_file = load_env_file();
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    if let Some(path) = env_file {
        debug!("Loaded environment from {}", path.display());
    }

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            error!("Application error: {}", e);
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// `.env` in the working directory, or the file named by `LCDL_ENV_FILE`.
fn load_env_file() -> Option<PathBuf> {
    match std::env::var_os("LCDL_ENV_FILE") {
        Some(path) => {
            let path = PathBuf::from(path);
            dotenvy::from_path(&path).ok().map(|_| path)
        }
        None => dotenvy::dotenv().ok(),
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_level(verbose))
        .init();
}

async fn run(args: Args) -> Result<ExitCode> {
    let paths = LibraryPaths::new(&args.local_path, &args.series_folder);
    let quiet = args.quiet;

    match args.command {
        Commands::Episode {
            media_id,
            output,
            download,
        } => {
            let config = DownloadConfig::from_args(&download)?;
            let pipeline = build_pipeline(&config, quiet).await?;
            section(&format!("Downloading {media_id}"));
            if pipeline.download_adaptive(&media_id, &output).await {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }

        Commands::Sync {
            catalog,
            series,
            episodes,
            download,
        } => {
            section("Collecting the data");
            let catalog_path = catalog.unwrap_or_else(|| paths.default_catalog());
            let catalog = load_catalog(&catalog_path)?;
            let filters = build_filters(&series, &episodes)?;
            if !filters.is_empty() {
                info!(?filters, "Filtering series");
            }

            let inventory = local_inventory(&paths)?;
            let pending = missing_episodes(&catalog, &inventory, &filters);
            let new_episodes = count_episodes(&pending);
            println!("{new_episodes} new episodes.");

            if new_episodes > 0 {
                let config = DownloadConfig::from_args(&download)?;
                let pipeline = build_pipeline(&config, quiet).await?;
                section("Downloading");
                Runner::new(&pipeline, &paths, config.retry)
                    .run(&pending)
                    .await?;
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Skips => {
            section("Creating skip files");
            let recorded = write_skip_file(&paths)?;
            println!(
                "Skip file written to {} ({} series, {} episodes)",
                paths.skip_file().display(),
                recorded.len(),
                recorded.values().map(|episodes| episodes.len()).sum::<usize>()
            );
            Ok(ExitCode::SUCCESS)
        }

        Commands::Inventory => {
            let inventory = local_inventory(&paths)?;
            print_inventory(&paths.series_root(), &inventory);
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn build_pipeline(config: &DownloadConfig, quiet: bool) -> Result<AdaptivePipeline> {
    if !config.muxer.is_available().await {
        warn!(
            "{} could not be started; episodes will fail at the merge step",
            config.muxer.ffmpeg_path().display()
        );
    }

    let client = build_client(&config.http)?;
    let manifests = ManifestClient::new(client.clone(), config.manifest.clone());
    let progress = ConsoleProgress::new(quiet);

    Ok(AdaptivePipeline::new(
        manifests,
        Arc::new(HttpSegmentSource::new(client)),
        Arc::new(config.muxer.clone()),
        config.pipeline.clone(),
    )
    .with_progress(progress.handler()))
}

fn print_inventory(series_root: &Path, inventory: &library::Inventory) {
    section(&format!("Library at {}", series_root.display()));
    if inventory.is_empty() {
        println!("No episodes found");
        return;
    }
    for (slug, episodes) in inventory {
        let numbers: Vec<String> = episodes.iter().map(u32::to_string).collect();
        println!("{slug}: {} episodes [{}]", episodes.len(), numbers.join(", "));
    }
}
