//! Sync control handlers: manual trigger and status.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::SyncStatusResponse;
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};
use crate::service::SyncReport;

/// `POST /sync/trigger` — Run a sync now.
///
/// # Errors
///
/// Returns [`GatewayError::SyncInProgress`] if a run is in flight, or
/// [`GatewayError::SyncFailed`] if the run fails.
#[utoipa::path(
    post,
    path = "/api/v1/sync/trigger",
    tag = "Sync",
    summary = "Trigger a sync",
    description = "Runs one reconciliation pass against the provider and waits for it to finish.",
    responses(
        (status = 200, description = "Sync completed", body = SyncReport),
        (status = 409, description = "A sync is already running", body = ErrorResponse),
        (status = 500, description = "Sync failed", body = ErrorResponse),
    )
)]
pub async fn trigger_sync(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, GatewayError> {
    let report = state.sync_scheduler.trigger().await?;
    Ok(Json(report))
}

/// `GET /sync/status` — Last recorded sync state.
///
/// # Errors
///
/// Returns [`GatewayError::PersistenceError`] if the watermark cannot be
/// read.
#[utoipa::path(
    get,
    path = "/api/v1/sync/status",
    tag = "Sync",
    summary = "Get sync status",
    description = "Returns the sync watermark and the outcome of the most recent run.",
    responses(
        (status = 200, description = "Current sync state", body = SyncStatusResponse),
    )
)]
pub async fn sync_status(State(state): State<AppState>) -> Result<impl IntoResponse, GatewayError> {
    let watermark = state.sync_scheduler.sync().status().await?;
    Ok(Json(SyncStatusResponse::from(watermark)))
}

/// Sync routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sync/trigger", post(trigger_sync))
        .route("/sync/status", get(sync_status))
}
