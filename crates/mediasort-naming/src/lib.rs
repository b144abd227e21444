//! Mediasort-Naming: turns a sorted listing of pending files into
//! destination assignments.
//!
//! - [`model`]: the records exchanged with callers ([`FileInfo`],
//!   [`VideoEntry`], [`Assignment`], [`QueuedItem`])
//! - [`classify`]: guesses a file's output directory from its relative path
//! - [`order`]: canonical display ordering and drag reordering
//! - [`builder`]: filename and destination generation
//!
//! # Examples
//!
//! ```
//! use mediasort_naming::{build, FileInfo, VideoEntry};
//!
//! let entries = vec![
//!     VideoEntry::season(FileInfo::new("/p/Show/a.mkv", "a.mkv"), 1, 0),
//!     VideoEntry::season(FileInfo::new("/p/Show/b.mkv", "b.mkv"), 1, 1),
//! ];
//! let items = build("Show", &entries).unwrap();
//! assert_eq!(items[1].assignment.destination(), "Show/Season 01/Show - S01E02.mkv");
//! ```

pub mod builder;
pub mod classify;
pub mod model;
pub mod order;

pub use builder::{build, build_one, find_duplicate_destinations, BuiltAssignment};
pub use classify::{classify, default_entries};
pub use model::{Assignment, FileInfo, OutputDirectory, QueuedItem, VideoEntry};
pub use order::{group_key, move_entry, sort_entries};

/// Errors raised for entries that cannot be turned into an assignment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NamingError {
    #[error("series name must not be empty")]
    EmptySeries,

    #[error("invalid series name: {0}")]
    InvalidSeries(String),

    #[error("relative path escapes the series directory: {0}")]
    InvalidPath(String),

    #[error("invalid assignment: {0}")]
    InvalidAssignment(String),

    #[error("season entry for {path} has season number 0")]
    InvalidSeason { path: String },

    #[error("index {index} out of bounds for {len} entries")]
    IndexOutOfBounds { index: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, NamingError>;
