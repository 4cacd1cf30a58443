//! What is already on disk, plus the `.skip` file.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use tracing::{debug, warn};

use super::paths::{LibraryPaths, episode_number, is_hidden_entry};
use crate::error::{AppError, Result};

/// Episode numbers present per series slug.
pub type Inventory = BTreeMap<String, BTreeSet<u32>>;

/// Walk `series_root/<slug>/<file>` and collect episode numbers.
///
/// A missing root is an empty library. Files without a numeric prefix,
/// `._*` resource forks and anything nested deeper are ignored.
pub fn scan_library(series_root: &Path) -> Result<Inventory> {
    let mut inventory = Inventory::new();

    let series_dirs = match std::fs::read_dir(series_root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(inventory),
        Err(e) => return Err(AppError::io(series_root, e)),
    };

    for series_dir in series_dirs {
        let series_dir = series_dir.map_err(|e| AppError::io(series_root, e))?;
        let path = series_dir.path();
        if !path.is_dir() {
            continue;
        }
        let Some(slug) = path.file_name().and_then(|n| n.to_str()).map(str::to_owned) else {
            warn!("Skipping non UTF-8 series folder {}", path.display());
            continue;
        };

        let mut episodes = BTreeSet::new();
        for entry in std::fs::read_dir(&path).map_err(|e| AppError::io(&path, e))? {
            let entry = entry.map_err(|e| AppError::io(&path, e))?;
            let file = entry.path();
            if !file.is_file() || is_hidden_entry(&file) {
                continue;
            }
            if let Some(number) = file
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(episode_number)
            {
                episodes.insert(number);
            }
        }

        if !episodes.is_empty() {
            inventory.insert(slug, episodes);
        }
    }

    debug!(series = inventory.len(), "Scanned library");
    Ok(inventory)
}

/// Union of two inventories.
pub fn merge(mut into: Inventory, other: &Inventory) -> Inventory {
    for (slug, episodes) in other {
        into.entry(slug.clone())
            .or_default()
            .extend(episodes.iter().copied());
    }
    into
}

/// Episodes recorded as present even if the files are gone. Absent file is empty.
pub fn load_skip_file(path: &Path) -> Result<Inventory> {
    match std::fs::read_to_string(path) {
        Ok(raw) => serde_json::from_str(&raw).map_err(|e| AppError::json(path, e)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Inventory::new()),
        Err(e) => Err(AppError::io(path, e)),
    }
}

/// Record everything currently on disk in the skip file, keeping earlier entries.
pub fn write_skip_file(paths: &LibraryPaths) -> Result<Inventory> {
    let skip_file = paths.skip_file();
    let merged = merge(scan_library(&paths.series_root())?, &load_skip_file(&skip_file)?);

    let series_root = paths.series_root();
    std::fs::create_dir_all(&series_root).map_err(|e| AppError::io(&series_root, e))?;

    let json = serde_json::to_string_pretty(&merged).map_err(|e| AppError::json(&skip_file, e))?;
    std::fs::write(&skip_file, json).map_err(|e| AppError::io(&skip_file, e))?;
    Ok(merged)
}

/// Scan plus skip file: everything that counts as downloaded.
pub fn local_inventory(paths: &LibraryPaths) -> Result<Inventory> {
    let scanned = scan_library(&paths.series_root())?;
    Ok(merge(scanned, &load_skip_file(&paths.skip_file())?))
}
