//! Records exchanged between the scanner, the sorting session and the
//! batch queue.
//!
//! Field names serialize in camelCase (`relativePath`, `episodeTitle`, ...)
//! and [`Assignment`] is tagged by a lowercase `type` field so stored
//! batches keep the shape downstream workers already consume.

use serde::{Deserialize, Serialize};

use crate::NamingError;

/// A video file found under a series directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    /// Absolute path on disk.
    pub path: String,
    /// File name including extension.
    pub name: String,
    /// Path relative to the series root, `/`-separated.
    pub relative_path: String,
}

impl FileInfo {
    /// Build a `FileInfo`, taking the name from the last segment of the
    /// relative path.
    pub fn new(path: impl Into<String>, relative_path: impl Into<String>) -> Self {
        let relative_path = relative_path.into();
        let name = relative_path
            .rsplit('/')
            .next()
            .unwrap_or(relative_path.as_str())
            .to_string();
        Self {
            path: path.into(),
            name,
            relative_path,
        }
    }

    /// Directory part of the relative path, if the file is not directly
    /// under the series root.
    pub fn relative_dir(&self) -> Option<&str> {
        self.relative_path
            .rfind('/')
            .map(|idx| &self.relative_path[..idx])
            .filter(|dir| !dir.is_empty())
    }
}

/// Which bucket of the series a file is sorted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputDirectory {
    Season,
    Special,
    Extra,
}

impl OutputDirectory {
    /// Display rank: seasons first, then specials, then extras.
    pub fn rank(self) -> u8 {
        match self {
            OutputDirectory::Season => 0,
            OutputDirectory::Special => 1,
            OutputDirectory::Extra => 2,
        }
    }
}

fn default_season_number() -> u32 {
    1
}

/// Working record for one file during a sorting session.
///
/// `season_number` only matters for [`OutputDirectory::Season`];
/// `position` orders entries within their group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoEntry {
    pub file: FileInfo,
    #[serde(default)]
    pub episode_title: String,
    pub output_directory: OutputDirectory,
    #[serde(default = "default_season_number")]
    pub season_number: u32,
    #[serde(default)]
    pub position: u32,
}

impl VideoEntry {
    pub fn season(file: FileInfo, season_number: u32, position: u32) -> Self {
        Self {
            file,
            episode_title: String::new(),
            output_directory: OutputDirectory::Season,
            season_number,
            position,
        }
    }

    pub fn special(file: FileInfo, position: u32) -> Self {
        Self {
            output_directory: OutputDirectory::Special,
            ..Self::season(file, 1, position)
        }
    }

    pub fn extra(file: FileInfo, position: u32) -> Self {
        Self {
            output_directory: OutputDirectory::Extra,
            ..Self::season(file, 1, position)
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.episode_title = title.into();
        self
    }

    /// Title with surrounding whitespace removed, or `None` when blank.
    pub fn title(&self) -> Option<&str> {
        let title = self.episode_title.trim();
        (!title.is_empty()).then_some(title)
    }
}

/// Destination instruction for a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Assignment {
    Episode {
        series: String,
        season: u32,
        episode: u32,
        title: String,
        source: String,
        destination: String,
    },
    Special {
        series: String,
        season: u32,
        episode: u32,
        title: String,
        source: String,
        destination: String,
    },
    Extra {
        series: String,
        source: String,
        destination: String,
    },
}

impl Assignment {
    pub fn series(&self) -> &str {
        match self {
            Assignment::Episode { series, .. }
            | Assignment::Special { series, .. }
            | Assignment::Extra { series, .. } => series,
        }
    }

    pub fn source(&self) -> &str {
        match self {
            Assignment::Episode { source, .. }
            | Assignment::Special { source, .. }
            | Assignment::Extra { source, .. } => source,
        }
    }

    pub fn destination(&self) -> &str {
        match self {
            Assignment::Episode { destination, .. }
            | Assignment::Special { destination, .. }
            | Assignment::Extra { destination, .. } => destination,
        }
    }

    /// Check the structural rules an assignment must satisfy before it is
    /// queued: numbering ranges and a destination that stays under
    /// `<series>/`.
    pub fn validate(&self) -> Result<(), NamingError> {
        match self {
            Assignment::Episode {
                season, episode, ..
            } => {
                if *season < 1 {
                    return Err(invalid("episode season must be at least 1"));
                }
                if *episode < 1 {
                    return Err(invalid("episode number must be at least 1"));
                }
            }
            Assignment::Special {
                season, episode, ..
            } => {
                if *season != 0 {
                    return Err(invalid("special season must be 0"));
                }
                if *episode < 1 {
                    return Err(invalid("special episode number must be at least 1"));
                }
            }
            Assignment::Extra { .. } => {}
        }

        let series = self.series();
        if series.trim().is_empty() {
            return Err(NamingError::EmptySeries);
        }
        let destination = self.destination();
        let rest = destination
            .strip_prefix(series)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| invalid(format!("destination {destination} is not under {series}/")))?;
        if rest
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..")
        {
            return Err(invalid(format!(
                "destination {destination} has an empty or relative segment"
            )));
        }
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> NamingError {
    NamingError::InvalidAssignment(msg.into())
}

/// A source file paired with its assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedItem {
    pub path: String,
    pub assignment: Assignment,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn test_file_info_new() {
        let file = FileInfo::new("/p/Show/Extras/BTS/clip.mp4", "Extras/BTS/clip.mp4");
        assert_eq!(file.name, "clip.mp4");
        assert_eq!(file.relative_dir(), Some("Extras/BTS"));

        let file = FileInfo::new("/p/Show/ep.mkv", "ep.mkv");
        assert_eq!(file.relative_dir(), None);
    }

    #[test]
    fn test_file_info_json_shape() {
        let file = FileInfo::new("/p/Show/ep.mkv", "ep.mkv");
        let value = serde_json::to_value(&file).unwrap();
        assert_eq!(
            value,
            json!({"path": "/p/Show/ep.mkv", "name": "ep.mkv", "relativePath": "ep.mkv"})
        );
    }

    #[test]
    fn test_video_entry_defaults() {
        let entry: VideoEntry = serde_json::from_value(json!({
            "file": {"path": "/p/a.mkv", "name": "a.mkv", "relativePath": "a.mkv"},
            "outputDirectory": "Special"
        }))
        .unwrap();
        assert_eq!(entry.output_directory, OutputDirectory::Special);
        assert_eq!(entry.season_number, 1);
        assert_eq!(entry.position, 0);
        assert_eq!(entry.title(), None);
    }

    #[test]
    fn test_assignment_tagging() {
        let assignment = Assignment::Extra {
            series: "Show".into(),
            source: "Show/a.mkv".into(),
            destination: "Show/Extras/a.mkv".into(),
        };
        let value = serde_json::to_value(&assignment).unwrap();
        assert_eq!(value["type"], "extra");
        assert!(value.get("season").is_none());

        let parsed: Assignment = serde_json::from_value(json!({
            "type": "special",
            "series": "Show",
            "season": 0,
            "episode": 1,
            "title": "",
            "source": "Show/x.mkv",
            "destination": "Show/Specials/Show - S00E01.mkv"
        }))
        .unwrap();
        assert_matches!(parsed, Assignment::Special { episode: 1, .. });
    }

    #[test]
    fn test_validate_rejects_escaping_destination() {
        let assignment = Assignment::Extra {
            series: "Show".into(),
            source: "Show/a.mkv".into(),
            destination: "Show/../Other/a.mkv".into(),
        };
        assert_matches!(assignment.validate(), Err(NamingError::InvalidAssignment(_)));

        let assignment = Assignment::Extra {
            series: "Show".into(),
            source: "Show/a.mkv".into(),
            destination: "Other/a.mkv".into(),
        };
        assert_matches!(assignment.validate(), Err(NamingError::InvalidAssignment(_)));
    }

    #[test]
    fn test_validate_numbering() {
        let episode = Assignment::Episode {
            series: "Show".into(),
            season: 0,
            episode: 1,
            title: String::new(),
            source: "Show/a.mkv".into(),
            destination: "Show/Season 00/a.mkv".into(),
        };
        assert!(episode.validate().is_err());

        let special = Assignment::Special {
            series: "Show".into(),
            season: 0,
            episode: 2,
            title: String::new(),
            source: "Show/a.mkv".into(),
            destination: "Show/Specials/Show - S00E02.mkv".into(),
        };
        assert!(special.validate().is_ok());
    }
}
