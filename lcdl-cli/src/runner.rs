//! Sequential per-episode download loop.

use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use segmux_engine::AdaptivePipeline;
use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::library::{LibraryPaths, PendingSeries, count_episodes};

/// Downloads one episode and says whether it worked.
#[async_trait]
pub trait EpisodeDownloader: Send + Sync {
    async fn download(&self, media_id: &str, output: &Path) -> bool;
}

#[async_trait]
impl EpisodeDownloader for AdaptivePipeline {
    async fn download(&self, media_id: &str, output: &Path) -> bool {
        self.download_adaptive(media_id, output).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total tries per episode, at least one.
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 1,
            delay: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn downloaded(&self) -> usize {
        self.total - self.failed
    }
}

pub struct Runner<'a, D: ?Sized> {
    downloader: &'a D,
    paths: &'a LibraryPaths,
    retry: RetryPolicy,
}

impl<'a, D: EpisodeDownloader + ?Sized> Runner<'a, D> {
    pub fn new(downloader: &'a D, paths: &'a LibraryPaths, retry: RetryPolicy) -> Self {
        Self {
            downloader,
            paths,
            retry,
        }
    }

    /// Download every pending episode, one after another.
    ///
    /// A failed episode is counted and the loop moves on; only filesystem
    /// setup problems abort the run.
    pub async fn run(&self, pending: &[PendingSeries]) -> Result<RunSummary> {
        let started = Instant::now();
        let total = count_episodes(pending);
        let mut done = 0usize;
        let mut failed = 0usize;

        for series in pending {
            info!(series = %series.title, episodes = series.episodes.len(), "Series started");
            let series_dir = self.paths.series_dir(&series.slug);
            tokio::fs::create_dir_all(&series_dir)
                .await
                .map_err(|e| AppError::io(&series_dir, e))?;

            for episode in &series.episodes {
                let output = self
                    .paths
                    .episode_path(&series.slug, episode.number, &episode.title);
                println!(
                    "Download started: {:02} - {} . . . . Saving on {}",
                    episode.number,
                    episode.title,
                    series_dir.display()
                );

                if !self.download_with_retry(&episode.vimeo_id, &output).await {
                    failed += 1;
                    warn!(
                        series = %series.slug,
                        episode = episode.number,
                        "Giving up on episode"
                    );
                }

                done += 1;
                println!("Current: {done} of {total} total. Left: {}", total - done);
            }
        }

        let summary = RunSummary {
            total,
            failed,
            elapsed: started.elapsed(),
        };
        println!(
            "Finished! Downloaded {} new episodes. Failed: {}",
            summary.downloaded(),
            summary.failed
        );
        info!(elapsed = ?summary.elapsed, "Run complete");
        Ok(summary)
    }

    async fn download_with_retry(&self, media_id: &str, output: &Path) -> bool {
        let attempts = self.retry.attempts.max(1);
        for attempt in 1..=attempts {
            if self.downloader.download(media_id, output).await {
                return true;
            }
            if attempt < attempts {
                warn!(media_id, attempt, attempts, "Episode failed, retrying");
                tokio::time::sleep(self.retry.delay).await;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Mutex;

    use super::*;
    use crate::library::catalog::CatalogEpisode;

    /// Fails each media id a fixed number of times, then succeeds.
    struct ScriptedDownloader {
        failures: Mutex<HashMap<String, u32>>,
        calls: Mutex<Vec<(String, PathBuf)>>,
    }

    impl ScriptedDownloader {
        fn new(failures: &[(&str, u32)]) -> Self {
            Self {
                failures: Mutex::new(
                    failures
                        .iter()
                        .map(|(id, n)| (id.to_string(), *n))
                        .collect(),
                ),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self, media_id: &str) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(id, _)| id == media_id)
                .count()
        }
    }

    #[async_trait]
    impl EpisodeDownloader for ScriptedDownloader {
        async fn download(&self, media_id: &str, output: &Path) -> bool {
            self.calls
                .lock()
                .unwrap()
                .push((media_id.to_string(), output.to_path_buf()));
            let mut failures = self.failures.lock().unwrap();
            match failures.get_mut(media_id) {
                Some(left) if *left > 0 => {
                    *left -= 1;
                    false
                }
                _ => true,
            }
        }
    }

    fn pending() -> Vec<PendingSeries> {
        vec![
            PendingSeries {
                slug: "laravel-8".to_string(),
                title: "Laravel 8".to_string(),
                episodes: vec![
                    CatalogEpisode {
                        number: 1,
                        title: "Intro".to_string(),
                        vimeo_id: "101".to_string(),
                    },
                    CatalogEpisode {
                        number: 2,
                        title: "Setup?".to_string(),
                        vimeo_id: "102".to_string(),
                    },
                ],
            },
            PendingSeries {
                slug: "vue-3".to_string(),
                title: "Vue 3".to_string(),
                episodes: vec![CatalogEpisode {
                    number: 5,
                    title: "Props".to_string(),
                    vimeo_id: "205".to_string(),
                }],
            },
        ]
    }

    #[tokio::test]
    async fn counts_failures_and_keeps_going() {
        let dir = tempfile::tempdir().unwrap();
        let paths = LibraryPaths::new(dir.path(), "series");
        let downloader = ScriptedDownloader::new(&[("102", 10)]);

        let summary = Runner::new(&downloader, &paths, RetryPolicy::default())
            .run(&pending())
            .await
            .unwrap();

        assert_eq!(summary.total, 3);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.downloaded(), 2);
        assert_eq!(downloader.call_count("102"), 1);
        assert_eq!(downloader.call_count("205"), 1);
        assert!(paths.series_dir("laravel-8").is_dir());
        assert!(paths.series_dir("vue-3").is_dir());

        let calls = downloader.calls.lock().unwrap();
        assert_eq!(
            calls[1].1,
            dir.path().join("series").join("laravel-8").join("02-Setup.mp4")
        );
    }

    #[tokio::test]
    async fn retries_whole_episode_up_to_the_limit() {
        let dir = tempfile::tempdir().unwrap();
        let paths = LibraryPaths::new(dir.path(), "series");
        let downloader = ScriptedDownloader::new(&[("101", 2), ("205", 5)]);
        let retry = RetryPolicy {
            attempts: 3,
            delay: Duration::ZERO,
        };

        let summary = Runner::new(&downloader, &paths, retry)
            .run(&pending())
            .await
            .unwrap();

        assert_eq!(downloader.call_count("101"), 3);
        assert_eq!(downloader.call_count("205"), 3);
        assert_eq!(summary.failed, 1);
    }

    #[tokio::test]
    async fn nothing_pending_is_an_empty_run() {
        let dir = tempfile::tempdir().unwrap();
        let paths = LibraryPaths::new(dir.path(), "series");
        let downloader = ScriptedDownloader::new(&[]);

        let summary = Runner::new(&downloader, &paths, RetryPolicy::default())
            .run(&[])
            .await
            .unwrap();

        assert_eq!(summary.total, 0);
        assert_eq!(summary.failed, 0);
        assert!(downloader.calls.lock().unwrap().is_empty());
    }
}
