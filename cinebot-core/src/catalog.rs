// src/catalog.rs
//
// The media library: one recursive scan at startup, immutable afterwards.

use std::fs;
use std::path::{Path, PathBuf};

use crate::Error;

/// Container formats the bot will pick up from the media directory.
const PLAYABLE_EXTENSIONS: [&str; 4] = ["mp4", "mkv", "webm", "mov"];

/// A single playable file. Identity is the path; the display name is the
/// file stem with spaces flattened to underscores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    pub display_name: String,
    pub path: PathBuf,
}

impl MediaItem {
    fn from_path(path: PathBuf) -> Self {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self {
            display_name: stem.replace(' ', "_"),
            path,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<MediaItem>,
}

impl Catalog {
    /// Scans `root` recursively for playable files. Creates the root
    /// directory first if it is missing; a failure to read any directory in
    /// the tree propagates.
    pub fn scan(root: &Path) -> Result<Self, Error> {
        fs::create_dir_all(root)?;
        let mut items = Vec::new();
        collect(root, &mut items)?;
        Ok(Self { items })
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Builds a catalog from already-known items (used by tests and tools
    /// that bypass the file-system scan).
    pub fn from_items(items: Vec<MediaItem>) -> Self {
        Self { items }
    }
}

fn collect(dir: &Path, items: &mut Vec<MediaItem>) -> Result<(), Error> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect(&path, items)?;
        } else if is_playable(&path) {
            items.push(MediaItem::from_path(path));
        }
    }
    Ok(())
}

fn is_playable(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_ascii_lowercase();
            PLAYABLE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}
