//! Singleton sync watermark.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp::format_watermark;
use crate::error::GatewayError;

/// Lifecycle state of the reconciliation engine as last recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// No run has been attempted yet.
    #[default]
    Idle,
    /// A run started and has not recorded an outcome. After a crash this
    /// state is inconclusive and the next run resumes from the last good
    /// watermark.
    Running,
    /// The last run exhausted the feed and committed.
    Success,
    /// The last run failed and was rolled back.
    Error,
}

impl SyncStatus {
    /// Database/text representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncStatus {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(Self::Idle),
            "running" => Ok(Self::Running),
            "success" => Ok(Self::Success),
            "error" => Ok(Self::Error),
            other => Err(GatewayError::PersistenceError(format!(
                "unknown sync status {other:?}"
            ))),
        }
    }
}

/// The single persisted row tracking reconciliation progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SyncWatermark {
    /// When the most recent run started.
    pub last_sync_time: Option<DateTime<Utc>>,
    /// Highest event `changed_at` committed by a successful run.
    pub last_changed_at: Option<DateTime<Utc>>,
    /// Outcome of the most recent run.
    pub sync_status: SyncStatus,
}

impl SyncWatermark {
    /// Feed filter to resume from.
    #[must_use]
    pub fn resume_cursor(&self) -> String {
        format_watermark(self.last_changed_at)
    }
}
