//! Event read handlers: detail and seat availability.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{EventDetailResponse, SeatsResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};

/// `GET /events/{id}` — Cached event with its place.
///
/// # Errors
///
/// Returns [`GatewayError::EventNotFound`] if the event has not been
/// synced.
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}",
    tag = "Events",
    summary = "Get event details",
    description = "Returns the locally cached copy of an event joined with its place.",
    params(
        ("id" = String, Path, description = "Provider event id"),
    ),
    responses(
        (status = 200, description = "Event details", body = EventDetailResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let detail = state.ticket_service.event_detail(&id).await?;
    Ok(Json(EventDetailResponse::from(detail)))
}

/// `GET /events/{id}/seats` — Free seats for a published event.
///
/// Served from the seat cache while the entry is fresh.
///
/// # Errors
///
/// Returns [`GatewayError::EventNotFound`], [`GatewayError::EventNotPublished`]
/// or [`GatewayError::ProviderUnavailable`].
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}/seats",
    tag = "Events",
    summary = "List free seats",
    description = "Returns seats the provider currently reports as free. Results are cached briefly per event.",
    params(
        ("id" = String, Path, description = "Provider event id"),
    ),
    responses(
        (status = 200, description = "Free seats", body = SeatsResponse),
        (status = 400, description = "Event not published", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
        (status = 502, description = "Provider unavailable", body = ErrorResponse),
    )
)]
pub async fn get_event_seats(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let seats = match state.seat_cache.get(&id).await {
        Some(seats) => seats,
        None => {
            let seats = state.ticket_service.available_seats(&id).await?;
            state.seat_cache.put(&id, seats.clone()).await;
            seats
        }
    };
    Ok(Json(SeatsResponse { event_id: id, seats }))
}

/// Event routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events/{id}", get(get_event))
        .route("/events/{id}/seats", get(get_event_seats))
}
