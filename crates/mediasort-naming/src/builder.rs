//! Destination filename and path generation.
//!
//! Episode numbers are assigned per group (see [`group_key`]) in the order
//! the entries are supplied, so the caller's ordering is the numbering.
//!
//! ```text
//! Season   Show/Season 01/Show - S01E03 - Title.mkv
//! Special  Show/Specials/Show - S00E01.mkv
//! Extra    Show/Extras/<subdir>/<title or original name>
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::model::{Assignment, OutputDirectory, QueuedItem, VideoEntry};
use crate::order::group_key;
use crate::{NamingError, Result};

const DEFAULT_EXTENSION: &str = "mkv";

/// Result of [`build_one`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltAssignment {
    pub destination_path: String,
    pub assignment: Assignment,
}

/// Compute the assignment for a single entry given its zero-based index
/// within its group.
pub fn build_one(series: &str, entry: &VideoEntry, episode_index: usize) -> Result<BuiltAssignment> {
    validate_series(series)?;
    validate_relative_path(&entry.file.relative_path)?;
    if entry.output_directory == OutputDirectory::Season && entry.season_number == 0 {
        return Err(NamingError::InvalidSeason {
            path: entry.file.path.clone(),
        });
    }

    let filename = destination_filename(series, entry, episode_index);
    let source = format!("{series}/{}", entry.file.relative_path);
    let episode = episode_index as u32 + 1;
    let title = entry.title().map(sanitize_segment).unwrap_or_default();

    let (destination_path, assignment) = match entry.output_directory {
        OutputDirectory::Extra => {
            let destination = match entry.file.relative_dir() {
                Some(dir) => format!("{series}/Extras/{dir}/{filename}"),
                None => format!("{series}/Extras/{filename}"),
            };
            (
                destination.clone(),
                Assignment::Extra {
                    series: series.to_string(),
                    source,
                    destination,
                },
            )
        }
        OutputDirectory::Special => {
            let destination = format!("{series}/Specials/{filename}");
            (
                destination.clone(),
                Assignment::Special {
                    series: series.to_string(),
                    season: 0,
                    episode,
                    title,
                    source,
                    destination,
                },
            )
        }
        OutputDirectory::Season => {
            let destination = format!(
                "{series}/Season {:02}/{filename}",
                entry.season_number
            );
            (
                destination.clone(),
                Assignment::Episode {
                    series: series.to_string(),
                    season: entry.season_number,
                    episode,
                    title,
                    source,
                    destination,
                },
            )
        }
    };

    Ok(BuiltAssignment {
        destination_path,
        assignment,
    })
}

/// Build assignments for entries in the supplied order, keeping one
/// episode counter per group.
pub fn build(series: &str, entries: &[VideoEntry]) -> Result<Vec<QueuedItem>> {
    validate_series(series)?;
    let mut counters: HashMap<String, usize> = HashMap::new();
    entries
        .iter()
        .map(|entry| {
            let counter = counters.entry(group_key(entry)).or_insert(0);
            let index = *counter;
            *counter += 1;
            let built = build_one(series, entry, index)?;
            Ok(QueuedItem {
                path: entry.file.path.clone(),
                assignment: built.assignment,
            })
        })
        .collect()
}

/// File name an entry will be renamed to.
pub fn destination_filename(series: &str, entry: &VideoEntry, episode_index: usize) -> String {
    let title = entry.title().map(sanitize_segment);

    if entry.output_directory == OutputDirectory::Extra {
        return match title {
            Some(title) => format!("{title}.{}", extension(&entry.file.name)),
            None => entry.file.name.clone(),
        };
    }

    let season = match entry.output_directory {
        OutputDirectory::Special => 0,
        _ => entry.season_number,
    };
    let ext = extension(&entry.file.name);
    let code = format!("S{:02}E{:02}", season, episode_index + 1);

    match title {
        Some(title) => format!("{series} - {code} - {title}.{ext}"),
        None => format!("{series} - {code}.{ext}"),
    }
}

/// Destinations that occur more than once, sorted.
pub fn find_duplicate_destinations(items: &[QueuedItem]) -> Vec<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for item in items {
        *counts.entry(item.assignment.destination()).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(destination, _)| destination.to_string())
        .collect()
}

fn extension(name: &str) -> &str {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .unwrap_or(DEFAULT_EXTENSION)
}

/// Path separators in titles would create extra directories.
fn sanitize_segment(title: &str) -> String {
    title.replace(['/', '\\'], "-")
}

fn validate_series(series: &str) -> Result<()> {
    if series.trim().is_empty() {
        return Err(NamingError::EmptySeries);
    }
    if series.contains(['/', '\\']) || series == "." || series == ".." {
        return Err(NamingError::InvalidSeries(series.to_string()));
    }
    Ok(())
}

fn validate_relative_path(relative_path: &str) -> Result<()> {
    let escapes = relative_path.is_empty()
        || relative_path.starts_with('/')
        || relative_path.split('/').any(|segment| segment == "..");
    if escapes {
        return Err(NamingError::InvalidPath(relative_path.to_string()));
    }
    Ok(())
}
