//! Catalog vs. local library.

use std::collections::BTreeSet;

use tracing::warn;

use super::catalog::{Catalog, CatalogEpisode, CatalogSeries};
use super::inventory::Inventory;
use super::paths::slugify;
use crate::error::{AppError, Result};

/// Restricts a sync to one series and, optionally, some of its episodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesFilter {
    pub slug: String,
    /// Empty means every episode.
    pub episodes: BTreeSet<u32>,
}

/// Pair `--series` values with `--episodes` lists by position.
///
/// Series names are slugified. A series without a matching episode list
/// takes all episodes; an episode list without a series is an error.
pub fn build_filters(series: &[String], episodes: &[String]) -> Result<Vec<SeriesFilter>> {
    if episodes.len() > series.len() {
        return Err(AppError::Config(format!(
            "{} episode lists given for {} series",
            episodes.len(),
            series.len()
        )));
    }

    series
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let episodes = match episodes.get(i) {
                Some(list) => parse_episode_list(list)?,
                None => BTreeSet::new(),
            };
            Ok(SeriesFilter {
                slug: slugify(name),
                episodes,
            })
        })
        .collect()
}

fn parse_episode_list(list: &str) -> Result<BTreeSet<u32>> {
    list.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<u32>()
                .map_err(|_| AppError::Config(format!("invalid episode number `{part}`")))
        })
        .collect()
}

/// Episodes of one series that still need downloading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSeries {
    pub slug: String,
    pub title: String,
    pub episodes: Vec<CatalogEpisode>,
}

/// What the catalog has that the library lacks, in catalog order.
///
/// A series whose local episode count equals its declared count is taken as
/// complete. Series with nothing missing are left out.
pub fn missing_episodes(
    catalog: &Catalog,
    inventory: &Inventory,
    filters: &[SeriesFilter],
) -> Vec<PendingSeries> {
    let selected: Vec<(&CatalogSeries, Option<&SeriesFilter>)> = if filters.is_empty() {
        catalog.values().map(|series| (series, None)).collect()
    } else {
        filters
            .iter()
            .filter_map(|filter| match catalog.get(&filter.slug) {
                Some(series) => Some((series, Some(filter))),
                None => {
                    warn!(slug = %filter.slug, "Series not found in catalog");
                    None
                }
            })
            .collect()
    };

    selected
        .into_iter()
        .filter_map(|(series, filter)| {
            let local = inventory.get(&series.slug);
            if local.is_some_and(|local| local.len() == series.episode_count) {
                return None;
            }

            let episodes: Vec<CatalogEpisode> = series
                .episodes
                .iter()
                .filter(|episode| local.is_none_or(|local| !local.contains(&episode.number)))
                .filter(|episode| {
                    filter.is_none_or(|f| f.episodes.is_empty() || f.episodes.contains(&episode.number))
                })
                .cloned()
                .collect();

            (!episodes.is_empty()).then(|| PendingSeries {
                slug: series.slug.clone(),
                title: series.title.clone(),
                episodes,
            })
        })
        .collect()
}

pub fn count_episodes(pending: &[PendingSeries]) -> usize {
    pending.iter().map(|series| series.episodes.len()).sum()
}
