//! Database models.

use chrono::{DateTime, Utc};
use mediasort_common::BatchId;
use mediasort_naming::QueuedItem;
use serde::{Deserialize, Serialize};

/// Processing state of a queued batch.
///
/// Batches are created as `Queued`; the other states are written by the
/// downstream worker through the update API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    #[default]
    Queued,
    Processing,
    Completed,
    Failed,
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Queued => write!(f, "queued"),
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for BatchStatus {
    type Err = mediasort_common::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(Self::Queued),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(mediasort_common::Error::validation(format!(
                "Invalid batch status: {}",
                s
            ))),
        }
    }
}

/// A stored batch of rename/move instructions for one series directory.
///
/// Serializes as `{"_id", "directory", "items", "status", "createdAt"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesBatch {
    #[serde(rename = "_id")]
    pub id: BatchId,
    pub directory: String,
    pub items: Vec<QueuedItem>,
    pub status: BatchStatus,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Partial update for a stored batch. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchUpdate {
    #[serde(default)]
    pub directory: Option<String>,
    #[serde(default)]
    pub items: Option<Vec<QueuedItem>>,
    #[serde(default)]
    pub status: Option<BatchStatus>,
}

impl BatchUpdate {
    pub fn is_empty(&self) -> bool {
        self.directory.is_none() && self.items.is_none() && self.status.is_none()
    }
}
