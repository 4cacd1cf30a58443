//! Catalog snapshot produced by the course scraper.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEpisode {
    pub number: u32,
    pub title: String,
    #[serde(deserialize_with = "media_id")]
    pub vimeo_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSeries {
    pub slug: String,
    pub title: String,
    pub episode_count: usize,
    #[serde(default)]
    pub episodes: Vec<CatalogEpisode>,
}

/// Series keyed by slug.
pub type Catalog = BTreeMap<String, CatalogSeries>;

pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::CatalogMissing(path.to_path_buf()));
        }
        Err(e) => return Err(AppError::io(path, e)),
    };
    serde_json::from_str(&raw).map_err(|e| AppError::json(path, e))
}

fn media_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(u64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Num(n) => n.to_string(),
    })
}
