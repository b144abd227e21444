//! Batch query operations.
//!
//! Items are stored as a JSON array in a single column; the batch is always
//! read and written as a whole.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use mediasort_common::{BatchId, Error, Result};
use mediasort_naming::QueuedItem;
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};

use crate::models::{BatchStatus, BatchUpdate, SeriesBatch};

const BATCH_COLUMNS: &str = "id, directory, items, status, created_at";

/// Default page size for [`list_batches`].
pub const DEFAULT_LIST_LIMIT: usize = 50;

fn timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion_error(idx: usize, err: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn parse_status(idx: usize, status: &str) -> rusqlite::Result<BatchStatus> {
    status.parse().map_err(|e| conversion_error(idx, e))
}

fn row_to_batch(row: &Row) -> rusqlite::Result<SeriesBatch> {
    let id: String = row.get(0)?;
    let items: String = row.get(2)?;
    let status: String = row.get(3)?;
    let created_at: String = row.get(4)?;

    Ok(SeriesBatch {
        id: id
            .parse::<BatchId>()
            .map_err(|e| conversion_error(0, e))?,
        directory: row.get(1)?,
        items: serde_json::from_str(&items).map_err(|e| conversion_error(2, e))?,
        status: parse_status(3, &status)?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| conversion_error(4, e))?,
    })
}

fn encode_items(items: &[QueuedItem]) -> Result<String> {
    serde_json::to_string(items).map_err(|e| Error::internal(format!("Failed to encode items: {e}")))
}

/// Store a new batch with status `queued`.
pub fn create_batch(conn: &Connection, directory: &str, items: Vec<QueuedItem>) -> Result<SeriesBatch> {
    let batch = SeriesBatch {
        id: BatchId::new(),
        directory: directory.to_string(),
        items,
        status: BatchStatus::Queued,
        // Stored with microsecond precision.
        created_at: Utc::now().trunc_subsecs(6),
    };

    conn.execute(
        "INSERT INTO batches (id, directory, items, status, created_at) VALUES (?, ?, ?, ?, ?)",
        params![
            batch.id.to_string(),
            &batch.directory,
            encode_items(&batch.items)?,
            batch.status.to_string(),
            timestamp(&batch.created_at),
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(batch)
}

/// Get a batch by ID.
pub fn get_batch(conn: &Connection, id: BatchId) -> Result<SeriesBatch> {
    conn.query_row(
        &format!("SELECT {BATCH_COLUMNS} FROM batches WHERE id = ?"),
        [id.to_string()],
        row_to_batch,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => Error::not_found("batch", id),
        _ => Error::database(e.to_string()),
    })
}

/// List batches newest first, optionally filtered by status.
pub fn list_batches(
    conn: &Connection,
    status: Option<BatchStatus>,
    limit: usize,
) -> Result<Vec<SeriesBatch>> {
    let limit = limit as i64;
    let result = match status {
        Some(status) => {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {BATCH_COLUMNS} FROM batches WHERE status = ?
                     ORDER BY created_at DESC, rowid DESC LIMIT ?"
                ))
                .map_err(|e| Error::database(e.to_string()))?;
            let rows = stmt
                .query_map(params![status.to_string(), limit], row_to_batch)
                .map_err(|e| Error::database(e.to_string()))?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        }
        None => {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {BATCH_COLUMNS} FROM batches
                     ORDER BY created_at DESC, rowid DESC LIMIT ?"
                ))
                .map_err(|e| Error::database(e.to_string()))?;
            let rows = stmt
                .query_map([limit], row_to_batch)
                .map_err(|e| Error::database(e.to_string()))?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        }
    };

    result.map_err(|e| Error::database(e.to_string()))
}

/// Apply a partial update and return the stored batch.
pub fn update_batch(conn: &Connection, id: BatchId, update: &BatchUpdate) -> Result<SeriesBatch> {
    if update.is_empty() {
        return get_batch(conn, id);
    }

    let items = update.items.as_deref().map(encode_items).transpose()?;
    let status = update.status.map(|s| s.to_string());

    let changed = conn
        .execute(
            "UPDATE batches SET
                directory = COALESCE(?, directory),
                items = COALESCE(?, items),
                status = COALESCE(?, status)
             WHERE id = ?",
            params![update.directory, items, status, id.to_string()],
        )
        .map_err(|e| Error::database(e.to_string()))?;

    if changed == 0 {
        return Err(Error::not_found("batch", id));
    }

    get_batch(conn, id)
}

/// Delete a batch.
pub fn delete_batch(conn: &Connection, id: BatchId) -> Result<()> {
    let changed = conn
        .execute("DELETE FROM batches WHERE id = ?", [id.to_string()])
        .map_err(|e| Error::database(e.to_string()))?;

    if changed == 0 {
        return Err(Error::not_found("batch", id));
    }
    Ok(())
}

/// Count stored batches per status.
pub fn count_by_status(conn: &Connection) -> Result<Vec<(BatchStatus, i64)>> {
    let mut stmt = conn
        .prepare("SELECT status, COUNT(*) FROM batches GROUP BY status ORDER BY status")
        .map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| {
            let status: String = row.get(0)?;
            Ok((parse_status(0, &status)?, row.get(1)?))
        })
        .map_err(|e| Error::database(e.to_string()))?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| Error::database(e.to_string()))
}
