//! Pending-media directory scanner.
//!
//! Series are the immediate subdirectories of the input root. Files are
//! discovered recursively and reported relative to their series directory.
//! All functions here block; async callers wrap them in
//! `tokio::task::spawn_blocking`.

use anyhow::{Context, Result};
use mediasort_common::paths::is_video_file;
use mediasort_naming::FileInfo;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A series folder under the input root with its video count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesDirectory {
    pub name: String,
    pub path: String,
    pub count: usize,
}

/// List series folders under `root`, sorted by name.
pub fn list_series(root: &Path) -> Result<Vec<SeriesDirectory>> {
    let entries =
        std::fs::read_dir(root).with_context(|| format!("Failed to read directory: {:?}", root))?;

    let mut series = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry in {:?}: {}", root, e);
                continue;
            }
        };
        if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            continue;
        }

        let path = entry.path();
        series.push(SeriesDirectory {
            name: entry.file_name().to_string_lossy().into_owned(),
            path: path.to_string_lossy().into_owned(),
            count: count_videos(&path),
        });
    }

    series.sort_by(|a, b| a.name.cmp(&b.name));
    debug!("Found {} series under {:?}", series.len(), root);
    Ok(series)
}

/// Count video files below `dir`, recursively.
pub fn count_videos(dir: &Path) -> usize {
    video_entries(dir).count()
}

/// List video files below `series_dir`, sorted by relative path.
pub fn scan_series(series_dir: &Path) -> Result<Vec<FileInfo>> {
    if !series_dir.is_dir() {
        anyhow::bail!("Series directory not found: {:?}", series_dir);
    }

    let mut files: Vec<FileInfo> = video_entries(series_dir)
        .filter_map(|entry| {
            let relative = entry.path().strip_prefix(series_dir).ok()?;
            let relative = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            Some(FileInfo {
                path: entry.path().to_string_lossy().into_owned(),
                name: entry.file_name().to_string_lossy().into_owned(),
                relative_path: relative,
            })
        })
        .collect();

    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(files)
}

fn video_entries(dir: &Path) -> impl Iterator<Item = walkdir::DirEntry> {
    WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_video_file(e.path()))
}
