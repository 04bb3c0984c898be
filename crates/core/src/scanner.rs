//! Lists watch roots and pairs videos with subtitles by filename stem.

use crate::models::CandidatePair;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "mov", "wmv", "flv", "m4v"];
pub const SUBTITLE_EXTENSIONS: &[&str] = &["srt"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Subtitle,
}

/// Case-insensitive extension allow-lists.
#[derive(Debug, Clone)]
pub struct Classifier {
    videos: GlobSet,
    subtitles: GlobSet,
}

impl Classifier {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            videos: build_globset(VIDEO_EXTENSIONS)?,
            subtitles: build_globset(SUBTITLE_EXTENSIONS)?,
        })
    }

    pub fn classify(&self, file_name: &str) -> Option<MediaKind> {
        if self.videos.is_match(file_name) {
            Some(MediaKind::Video)
        } else if self.subtitles.is_match(file_name) {
            Some(MediaKind::Subtitle)
        } else {
            None
        }
    }
}

/// Stem → path maps for one root.
#[derive(Debug, Default, Clone)]
pub struct RootListing {
    pub videos: BTreeMap<String, PathBuf>,
    pub subtitles: BTreeMap<String, PathBuf>,
}

/// Direct children of `root` only. A missing root is empty; unreadable
/// entries are skipped.
pub fn scan_root(root: &Path, classifier: &Classifier) -> RootListing {
    let mut listing = RootListing::default();
    if !root.is_dir() {
        debug!("Watch root {:?} does not exist, skipping", root);
        return listing;
    }

    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Could not list {:?}: {}", root, e);
                continue;
            }
        };

        let path = entry.path();
        if is_hidden(path) || !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().map(|n| n.to_string_lossy()) else {
            continue;
        };
        let Some(kind) = classifier.classify(&name) else {
            continue;
        };
        let stem = match path.file_stem() {
            Some(s) => s.to_string_lossy().into_owned(),
            None => continue,
        };

        match kind {
            MediaKind::Video => listing.videos.insert(stem, path.to_path_buf()),
            MediaKind::Subtitle => listing.subtitles.insert(stem, path.to_path_buf()),
        };
    }
    listing
}

/// Merges every root, later roots overwriting earlier ones on a stem
/// collision, then pairs each video with the subtitle of the same stem.
pub fn scan_roots(roots: &[PathBuf], classifier: &Classifier) -> Vec<CandidatePair> {
    let mut merged = RootListing::default();
    for root in roots {
        let listing = scan_root(root, classifier);
        merged.videos.extend(listing.videos);
        merged.subtitles.extend(listing.subtitles);
    }

    merged
        .videos
        .into_iter()
        .map(|(stem, video)| {
            let subtitle = merged.subtitles.get(&stem).cloned();
            CandidatePair {
                stem,
                video,
                subtitle,
            }
        })
        .collect()
}

fn build_globset(extensions: &[&str]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for ext in extensions {
        let glob = GlobBuilder::new(&format!("*.{}", ext))
            .case_insensitive(true)
            .literal_separator(true)
            .build()?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.as_encoded_bytes().starts_with(b"."))
        .unwrap_or(false)
}
