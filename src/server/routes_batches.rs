use crate::server::error::{json_body, AppError};
use crate::server::AppContext;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use mediasort_common::{BatchId, Error};
use mediasort_db::models::{BatchStatus, BatchUpdate};
use mediasort_naming::{Assignment, QueuedItem, VideoEntry};
use serde::Deserialize;
use serde_json::json;

pub fn batch_routes() -> Router<AppContext> {
    Router::new()
        .route("/batches", get(list_batches).post(create_batch))
        .route("/batches/from-entries", post(create_batch_from_entries))
        .route(
            "/batches/:id",
            get(get_batch).patch(update_batch).delete(delete_batch),
        )
        .route("/batches/:id/republish", post(republish_batch))
}

/// Unwrap a JSON body, reporting any rejection as a 400.
fn parse_id(id: &str) -> Result<BatchId, AppError> {
    Ok(id.parse::<BatchId>()?)
}

#[derive(Debug, Deserialize)]
struct CreateBatchRequest {
    directory: Option<String>,
    assignments: Option<Vec<QueuedItem>>,
}

async fn create_batch(
    State(ctx): State<AppContext>,
    payload: Result<Json<CreateBatchRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let req = json_body(payload)?;
    let (Some(directory), Some(assignments)) = (req.directory, req.assignments) else {
        return Err(Error::validation("Missing directory or assignments").into());
    };

    let batch = ctx.queue.submit(&directory, assignments).await?;
    Ok(Json(json!({ "success": true, "id": batch.id })))
}

#[derive(Debug, Deserialize)]
struct CreateFromEntriesRequest {
    directory: Option<String>,
    series: Option<String>,
    entries: Option<Vec<VideoEntry>>,
}

async fn create_batch_from_entries(
    State(ctx): State<AppContext>,
    payload: Result<Json<CreateFromEntriesRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let req = json_body(payload)?;
    let (Some(directory), Some(entries)) = (req.directory, req.entries) else {
        return Err(Error::validation("Missing directory or entries").into());
    };

    let batch = ctx
        .queue
        .submit_entries(&directory, req.series.as_deref(), &entries)
        .await?;
    Ok(Json(json!({ "success": true, "id": batch.id })))
}

#[derive(Debug, Deserialize)]
struct ListBatchesQuery {
    status: Option<String>,
    limit: Option<usize>,
}

async fn list_batches(
    State(ctx): State<AppContext>,
    Query(params): Query<ListBatchesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let status = params
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<BatchStatus>())
        .transpose()?;

    let batches = ctx.queue.list(status, params.limit).await?;
    Ok(Json(json!({ "batches": batches })))
}

async fn get_batch(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let batch = ctx.queue.get(parse_id(&id)?).await?;
    let assignments: Vec<&Assignment> = batch.items.iter().map(|i| &i.assignment).collect();
    Ok(Json(json!({ "batch": batch, "assignments": assignments })))
}

async fn update_batch(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    payload: Result<Json<BatchUpdate>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let update = json_body(payload)?;
    ctx.queue.update(id, update).await?;
    Ok(Json(json!({ "success": true })))
}

async fn delete_batch(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    ctx.queue.delete(parse_id(&id)?).await?;
    Ok(Json(json!({ "success": true })))
}

async fn republish_batch(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    ctx.queue.republish(parse_id(&id)?).await?;
    Ok(Json(json!({ "success": true })))
}
