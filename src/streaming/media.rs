//! `GET /api/stream/:encoded_path` handler.

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    Json,
};
use futures::stream;
use mediasort_common::paths::{decode_path, is_within_root, resolve_within_root};
use mediasort_common::Error;
use serde::Deserialize;
use serde_json::json;
use std::io::SeekFrom;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use super::plan::{parse_start_seconds, plan, StreamPlan, StreamRequest};
use crate::server::error::AppError;
use crate::server::AppContext;

const READ_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Default, Deserialize)]
pub struct StreamQuery {
    /// Transcode start offset in seconds.
    pub t: Option<String>,
    /// `true` or `1` forces transcoding.
    pub transcode: Option<String>,
}

impl StreamQuery {
    fn wants_transcode(&self) -> bool {
        matches!(self.transcode.as_deref(), Some("true") | Some("1"))
    }
}

/// Serve a pending media file addressed by its encoded path.
pub async fn stream_media(
    State(ctx): State<AppContext>,
    Path(encoded_path): Path<String>,
    Query(query): Query<StreamQuery>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let decoded = decode_path(&encoded_path)?;
    if decoded.is_empty() {
        return Err(Error::validation("Path token is empty").into());
    }
    let requested = std::path::Path::new(&decoded);

    let file_path = resolve_within_root(requested, &ctx.input_root)
        .ok_or_else(|| Error::forbidden(format!("Path is outside the media root: {decoded}")))?;

    // Symlinks inside the root may still point elsewhere.
    let real_path = tokio::fs::canonicalize(&file_path)
        .await
        .map_err(|_| Error::not_found("file", &decoded))?;
    if !is_within_root(&real_path, &ctx.input_root) {
        return Err(Error::forbidden(format!("Path is outside the media root: {decoded}")).into());
    }

    let metadata = tokio::fs::metadata(&real_path)
        .await
        .map_err(|_| Error::not_found("file", &decoded))?;
    if !metadata.is_file() {
        return Err(Error::not_found("file", &decoded).into());
    }

    let range = headers.get(header::RANGE).map(|v| v.to_str().unwrap_or(""));
    let request = StreamRequest {
        range,
        transcode: query.wants_transcode(),
        start_seconds: parse_start_seconds(query.t.as_deref()),
    };
    let plan = plan(&real_path, metadata.len(), &request);
    let status = plan.status();
    let response_headers = plan.headers();

    let body = match &plan {
        StreamPlan::Transcode { start_seconds } => {
            match ctx.transcoder.spawn(&real_path, *start_seconds) {
                Ok(stream) => Body::from_stream(stream),
                Err(e) => {
                    tracing::error!(file = %real_path.display(), "Transcode failed to start: {}", e);
                    let failure = std::io::Error::other(e.to_string());
                    Body::from_stream(stream::once(async move {
                        Err::<bytes::Bytes, std::io::Error>(failure)
                    }))
                }
            }
        }
        StreamPlan::Partial { range, .. } => {
            let mut file = File::open(&real_path).await.map_err(Error::from)?;
            file.seek(SeekFrom::Start(range.start))
                .await
                .map_err(Error::from)?;
            Body::from_stream(ReaderStream::with_capacity(
                file.take(range.len()),
                READ_CHUNK_SIZE,
            ))
        }
        StreamPlan::Full { .. } => {
            let file = File::open(&real_path).await.map_err(Error::from)?;
            Body::from_stream(ReaderStream::with_capacity(file, READ_CHUNK_SIZE))
        }
        StreamPlan::RangeNotSatisfiable { reason, .. } => {
            tracing::debug!(file = %real_path.display(), "Unsatisfiable range: {}", reason);
            let error = Error::range(reason.to_string());
            let body = Json(json!({ "error": error.to_string(), "code": error.code() }));
            return Ok((status, response_headers, body).into_response());
        }
    };

    Ok((status, response_headers, body).into_response())
}
