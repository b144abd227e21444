//! Media preview streaming.
//!
//! Files are addressed by their URL-safe encoded absolute path and must live
//! under the configured input root.
//!
//! # Routes
//!
//! - `GET /api/stream/{encoded_path}[?t=<seconds>][&transcode=true]`
//!
//! Browser-playable containers are served raw with `Range` support.
//! Everything else (or any request with `transcode=true`) is piped through
//! ffmpeg as fragmented MP4, optionally starting at `t` seconds.

mod media;
pub mod plan;
pub mod range;
pub mod transcode;

pub use media::{stream_media, StreamQuery};
pub use plan::{content_type_for, needs_transcode, plan, StreamPlan, StreamRequest};
pub use range::{parse_range, ByteRange, RangeError};
pub use transcode::{TranscodeStream, Transcoder};

use axum::{routing::get, Router};

use crate::server::AppContext;

/// Create the media streaming router.
pub fn stream_router() -> Router<AppContext> {
    Router::new().route("/:encoded_path", get(stream_media))
}
