//! Path utilities for video detection, URL-safe path tokens, and root
//! containment.
//!
//! Media URLs carry absolute file paths as opaque tokens produced by
//! [`encode_path`]. Before any file is opened for streaming the decoded path
//! must pass [`resolve_within_root`], which normalizes `.` and `..`
//! components lexically and rejects anything outside the pending root.

use std::path::{Component, Path, PathBuf};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::{Error, Result};

/// List of supported video file extensions.
const VIDEO_EXTENSIONS: &[&str] = &["mkv", "mp4", "avi", "m4v", "mov", "wmv", "flv"];

/// Check if a path has a video file extension.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use mediasort_common::paths::is_video_file;
///
/// assert!(is_video_file(Path::new("episode.mkv")));
/// assert!(is_video_file(Path::new("/path/to/video.MP4")));
/// assert!(!is_video_file(Path::new("subtitle.srt")));
/// ```
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Get the list of video file extensions.
#[must_use]
pub fn video_extensions() -> &'static [&'static str] {
    VIDEO_EXTENSIONS
}

/// Encode a path as a URL-safe token (base64, `-`/`_` alphabet, no padding).
pub fn encode_path(path: impl AsRef<str>) -> String {
    URL_SAFE_NO_PAD.encode(path.as_ref().as_bytes())
}

/// Decode a token produced by [`encode_path`].
///
/// Trailing `=` padding is tolerated. Tokens that are not valid base64 or do
/// not decode to UTF-8 are rejected with a validation error. The empty
/// token decodes to the empty path; callers that serve files reject it.
pub fn decode_path(token: &str) -> Result<String> {
    let trimmed = token.trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(trimmed)
        .map_err(|e| Error::validation(format!("Invalid path token: {e}")))?;
    String::from_utf8(bytes).map_err(|_| Error::validation("Path token is not valid UTF-8"))
}

/// Lexically normalize a path: drop `.` components and resolve `..` against
/// the preceding component. `..` never climbs above the root of an absolute
/// path.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = match out.components().next_back() {
                    Some(Component::Normal(_)) => out.pop(),
                    Some(Component::RootDir) | Some(Component::Prefix(_)) => true,
                    _ => false,
                };
                if !popped {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Check whether `path` is `root` itself or lies beneath it after both are
/// normalized.
///
/// Comparison is component-wise, so `/srv/pending2` is not considered to be
/// inside `/srv/pending`.
pub fn is_within_root(path: &Path, root: &Path) -> bool {
    if path.is_absolute() != root.is_absolute() {
        return false;
    }
    let path = normalize_path(path);
    let root = normalize_path(root);
    if path.components().any(|c| c == Component::ParentDir) {
        return false;
    }
    path.starts_with(&root)
}

/// Normalize `path` and return it only if it stays within `root`.
pub fn resolve_within_root(path: &Path, root: &Path) -> Option<PathBuf> {
    if is_within_root(path, root) {
        Some(normalize_path(path))
    } else {
        None
    }
}

/// Resolve a series directory name (relative to the pending root) to an
/// absolute path, rejecting anything that escapes the root.
pub fn resolve_series_dir(root: &Path, series_dir: &str) -> Result<PathBuf> {
    if series_dir.is_empty() {
        return Err(Error::validation("Series directory is required"));
    }
    let candidate = root.join(series_dir);
    resolve_within_root(&candidate, root)
        .ok_or_else(|| Error::forbidden(format!("Series directory escapes root: {series_dir}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_video_file() {
        for name in [
            "a.mkv", "a.mp4", "a.avi", "a.m4v", "a.mov", "a.wmv", "a.flv", "a.MKV",
        ] {
            assert!(is_video_file(Path::new(name)), "{name}");
        }
        assert!(!is_video_file(Path::new("a.ts")));
        assert!(!is_video_file(Path::new("a.srt")));
        assert!(!is_video_file(Path::new("no_extension")));
    }

    #[test]
    fn test_encode_decode_path() {
        let path = "/srv/pending/Show Name/Season 1/ep?01+.mkv";
        let token = encode_path(path);
        assert!(!token.contains('+'));
        assert!(!token.contains('/'));
        assert!(!token.contains('='));
        assert_eq!(decode_path(&token).unwrap(), path);
    }

    #[test]
    fn test_decode_tolerates_padding() {
        let token = format!("{}==", encode_path("/a/b.mp4"));
        assert_eq!(decode_path(&token).unwrap(), "/a/b.mp4");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode_path("***"), Err(Error::Validation(_))));
        assert!(matches!(decode_path("_w"), Err(Error::Validation(_))));
    }

    #[test]
    fn test_round_trip_includes_empty_path() {
        for path in ["", "/", "/srv/pending/Ünïcödé/日本語.mkv"] {
            assert_eq!(decode_path(&encode_path(path)).unwrap(), path);
        }
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("/srv/./pending/../pending/show")),
            PathBuf::from("/srv/pending/show")
        );
        assert_eq!(normalize_path(Path::new("/../../etc")), PathBuf::from("/etc"));
        assert_eq!(normalize_path(Path::new("a/../../b")), PathBuf::from("../b"));
    }

    #[test]
    fn test_is_within_root() {
        let root = Path::new("/srv/pending");
        assert!(is_within_root(Path::new("/srv/pending"), root));
        assert!(is_within_root(Path::new("/srv/pending/"), root));
        assert!(is_within_root(Path::new("/srv/pending/show/ep.mkv"), root));
        assert!(is_within_root(Path::new("/srv/pending/show/../ep.mkv"), root));

        assert!(!is_within_root(Path::new("/srv/pending/../secret"), root));
        assert!(!is_within_root(Path::new("/srv/pending2/ep.mkv"), root));
        assert!(!is_within_root(Path::new("/etc/passwd"), root));
        assert!(!is_within_root(Path::new("pending/ep.mkv"), root));
    }

    #[test]
    fn test_traversal_rejected_through_encoding() {
        let root = Path::new("/srv/pending");
        let token = encode_path("/srv/pending/../../etc/passwd");
        let decoded = decode_path(&token).unwrap();
        assert!(resolve_within_root(Path::new(&decoded), root).is_none());
    }

    #[test]
    fn test_resolve_series_dir() {
        let root = Path::new("/srv/pending");
        assert_eq!(
            resolve_series_dir(root, "Show").unwrap(),
            PathBuf::from("/srv/pending/Show")
        );
        assert_eq!(
            resolve_series_dir(root, ".").unwrap(),
            PathBuf::from("/srv/pending")
        );
        assert!(matches!(
            resolve_series_dir(root, "../other"),
            Err(Error::Forbidden(_))
        ));
        assert!(matches!(
            resolve_series_dir(root, "/etc"),
            Err(Error::Forbidden(_))
        ));
        assert!(matches!(
            resolve_series_dir(root, ""),
            Err(Error::Validation(_))
        ));
    }
}
