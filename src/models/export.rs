//! Post export job records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "export_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ExportStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl ExportStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PostExport {
    pub id: Uuid,
    pub status: ExportStatus,
    /// Snapshot of the filters the export was requested with.
    pub filters: serde_json::Value,
    pub file_path: Option<String>,
    pub row_count: Option<i64>,
    pub error: Option<String>,
    pub requested_by: i64,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}
