//! Mediasort-Common: Shared types, constants, and utilities.
//!
//! This crate provides common functionality used across mediasort:
//!
//! - **Typed IDs**: [`BatchId`] wraps the UUID used as a queued batch identifier
//! - **Path Utilities**: video extension checks, URL-safe path tokens, and
//!   root containment checks used before any file is streamed
//! - **Error Handling**: Common error type with HTTP status mapping
//!
//! # Examples
//!
//! ```
//! use mediasort_common::paths::{decode_path, encode_path, is_within_root};
//! use std::path::Path;
//!
//! let token = encode_path("/srv/pending/Show/ep1.mkv");
//! assert_eq!(decode_path(&token).unwrap(), "/srv/pending/Show/ep1.mkv");
//!
//! assert!(is_within_root(Path::new("/srv/pending/Show"), Path::new("/srv/pending")));
//! assert!(!is_within_root(Path::new("/srv/pending/../etc"), Path::new("/srv/pending")));
//! ```

pub mod error;
pub mod ids;
pub mod paths;

pub use error::{Error, Result};
pub use ids::BatchId;
