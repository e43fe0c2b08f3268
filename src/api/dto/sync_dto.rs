//! Sync status DTOs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::SyncWatermark;

/// Response body for `GET /sync/status`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SyncStatusResponse {
    /// `idle`, `running`, `success` or `error`.
    pub status: String,
    /// Start of the most recent run.
    pub last_sync_time: Option<DateTime<Utc>>,
    /// Highest committed `changed_at`.
    pub last_changed_at: Option<DateTime<Utc>>,
    /// Date filter the next run will send to the provider.
    pub resume_from: String,
}

impl From<Option<SyncWatermark>> for SyncStatusResponse {
    fn from(watermark: Option<SyncWatermark>) -> Self {
        let watermark = watermark.unwrap_or_default();
        Self {
            status: watermark.sync_status.to_string(),
            last_sync_time: watermark.last_sync_time,
            last_changed_at: watermark.last_changed_at,
            resume_from: watermark.resume_cursor(),
        }
    }
}
