use std::path::{Path, PathBuf};

/// Where the library lives on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryPaths {
    pub local_path: PathBuf,
    pub series_folder: String,
}

impl LibraryPaths {
    pub fn new(local_path: impl Into<PathBuf>, series_folder: impl Into<String>) -> Self {
        Self {
            local_path: local_path.into(),
            series_folder: series_folder.into(),
        }
    }

    /// `<local_path>/<series_folder>`, one directory per series below it.
    pub fn series_root(&self) -> PathBuf {
        self.local_path.join(&self.series_folder)
    }

    pub fn series_dir(&self, slug: &str) -> PathBuf {
        self.series_root().join(slug)
    }

    pub fn episode_path(&self, slug: &str, number: u32, title: &str) -> PathBuf {
        self.series_dir(slug).join(episode_filename(number, title))
    }

    pub fn skip_file(&self) -> PathBuf {
        self.series_root().join(".skip")
    }

    pub fn default_catalog(&self) -> PathBuf {
        self.local_path.join("cache.json")
    }
}

/// `{number:02}-{title}.mp4`, with the title reduced to ASCII letters,
/// digits, `-`, `_` and spaces.
pub fn episode_filename(number: u32, title: &str) -> String {
    format!("{number:02}-{}.mp4", sanitize_title(title))
}

fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ' '))
        .collect()
}

/// Episode number encoded in a library file name: the integer before the first `-`.
pub fn episode_number(file_name: &str) -> Option<u32> {
    let (prefix, _) = file_name.split_once('-')?;
    prefix.trim().parse().ok()
}

/// URL-style slug for a series name given on the command line.
///
/// Apostrophes are dropped, every other run of non-alphanumerics becomes one `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars().filter(|c| *c != '\'' && *c != '\u{2019}') {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

pub(crate) fn is_hidden_entry(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with("._"))
}
