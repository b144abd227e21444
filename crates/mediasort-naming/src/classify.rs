//! Output-directory guess from a file's relative path.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{FileInfo, OutputDirectory, VideoEntry};
use crate::order::sort_entries;

static SEASON_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Season\s*(\d+)").expect("season regex should compile"));

/// Guess where a file belongs from its relative path.
///
/// Paths mentioning "special" are specials, then "extra" means extras
/// (both case-insensitive). Otherwise a `Season N` fragment picks the
/// season, defaulting to season 1. `Season 0` folders are treated as
/// specials.
///
/// Returns the output directory and the season number (1 for non-season
/// buckets).
pub fn classify(relative_path: &str) -> (OutputDirectory, u32) {
    let lower = relative_path.to_lowercase();
    if lower.contains("special") {
        return (OutputDirectory::Special, 1);
    }
    if lower.contains("extra") {
        return (OutputDirectory::Extra, 1);
    }

    let season = SEASON_PATTERN
        .captures(relative_path)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok());

    match season {
        Some(0) => (OutputDirectory::Special, 1),
        Some(n) => (OutputDirectory::Season, n),
        None => (OutputDirectory::Season, 1),
    }
}

/// Build the initial session entries for a listing: classify each file,
/// use its listing index as position, and return them in canonical order.
pub fn default_entries(files: Vec<FileInfo>) -> Vec<VideoEntry> {
    let mut entries: Vec<VideoEntry> = files
        .into_iter()
        .enumerate()
        .map(|(idx, file)| {
            let (output_directory, season_number) = classify(&file.relative_path);
            VideoEntry {
                file,
                episode_title: String::new(),
                output_directory,
                season_number,
                position: idx as u32,
            }
        })
        .collect();
    sort_entries(&mut entries);
    entries
}
