use crate::scanner::{list_series, scan_series};
use crate::server::error::{json_body, AppError};
use crate::server::AppContext;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap, HeaderValue},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use mediasort_common::paths::{is_within_root, resolve_series_dir};
use mediasort_common::Error;
use mediasort_naming::{build, default_entries, find_duplicate_destinations, move_entry, VideoEntry};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub fn series_routes() -> Router<AppContext> {
    Router::new()
        .route("/series", get(get_series))
        .route("/series/:series_dir/files", get(get_series_files))
        .route("/series/:series_dir/entries", get(get_series_entries))
        .route("/entries/reorder", post(reorder_entries))
        .route("/assignments/preview", post(preview_assignments))
}

/// Run a blocking filesystem scan off the async runtime.
async fn blocking<T, F>(f: F) -> Result<T, Error>
where
    T: Send + 'static,
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::internal(format!("Scan task failed: {}", e)))?
        .map_err(|e| Error::internal(format!("{:#}", e)))
}

/// Resolve `series_dir` under the input root, following symlinks.
async fn series_path(ctx: &AppContext, series_dir: &str) -> Result<PathBuf, Error> {
    let path = resolve_series_dir(&ctx.input_root, series_dir)?;
    let real = tokio::fs::canonicalize(&path)
        .await
        .map_err(|_| Error::not_found("series", series_dir))?;
    if !is_within_root(&real, &ctx.input_root) {
        return Err(Error::forbidden(format!(
            "Series directory escapes root: {series_dir}"
        )));
    }
    if !real.is_dir() {
        return Err(Error::not_found("series", series_dir));
    }
    Ok(real)
}

fn no_store_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store, no-cache, must-revalidate, max-age=0"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
    headers
}

async fn get_series(State(ctx): State<AppContext>) -> Result<impl IntoResponse, AppError> {
    let root = ctx.input_root.to_path_buf();
    let series = blocking(move || list_series(&root)).await?;
    Ok(Json(serde_json::json!({ "series": series })))
}

async fn get_series_files(
    State(ctx): State<AppContext>,
    Path(series_dir): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let path = series_path(&ctx, &series_dir).await?;
    let files = blocking(move || scan_series(&path)).await?;

    Ok((
        no_store_headers(),
        Json(serde_json::json!({
            "series_directory": series_dir,
            "files": files,
        })),
    ))
}

async fn get_series_entries(
    State(ctx): State<AppContext>,
    Path(series_dir): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let path = series_path(&ctx, &series_dir).await?;
    let files = blocking(move || scan_series(&path)).await?;
    let entries = default_entries(files);

    Ok((
        no_store_headers(),
        Json(serde_json::json!({
            "series_directory": series_dir,
            "entries": entries,
        })),
    ))
}

#[derive(Debug, Deserialize)]
struct ReorderRequest {
    entries: Vec<VideoEntry>,
    from: usize,
    to: usize,
}

async fn reorder_entries(
    payload: Result<Json<ReorderRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let req = json_body(payload)?;
    let mut entries = req.entries;
    move_entry(&mut entries, req.from, req.to)?;
    Ok(Json(serde_json::json!({ "entries": entries })))
}

#[derive(Debug, Deserialize)]
struct PreviewRequest {
    series: String,
    entries: Vec<VideoEntry>,
}

#[derive(Debug, Serialize)]
struct PreviewItem {
    path: String,
    destination: String,
    assignment: mediasort_naming::Assignment,
}

/// Build assignments without queuing them.
async fn preview_assignments(
    payload: Result<Json<PreviewRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let req = json_body(payload)?;
    let items = build(&req.series, &req.entries)?;
    let duplicates = find_duplicate_destinations(&items);

    let items: Vec<PreviewItem> = items
        .into_iter()
        .map(|item| PreviewItem {
            destination: item.assignment.destination().to_string(),
            path: item.path,
            assignment: item.assignment,
        })
        .collect();

    Ok(Json(serde_json::json!({
        "items": items,
        "duplicates": duplicates,
    })))
}
