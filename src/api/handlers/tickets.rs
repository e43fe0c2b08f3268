//! Ticket handlers: create and cancel.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, post};
use axum::{Json, Router};

use crate::api::dto::{CancelTicketResponse, CreateTicketRequest, CreateTicketResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};

/// `POST /tickets` — Register a seat and store the ticket.
///
/// # Errors
///
/// Returns [`GatewayError`] on invalid input, a failed local precondition,
/// or a provider rejection.
#[utoipa::path(
    post,
    path = "/api/v1/tickets",
    tag = "Tickets",
    summary = "Create a ticket",
    description = "Validates the event locally, registers the seat with the provider, then stores the ticket.",
    request_body = CreateTicketRequest,
    responses(
        (status = 201, description = "Ticket created", body = CreateTicketResponse),
        (status = 400, description = "Invalid request, event not published, or registration closed", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
        (status = 409, description = "Provider rejected the registration", body = ErrorResponse),
        (status = 502, description = "Provider unavailable", body = ErrorResponse),
    )
)]
pub async fn create_ticket(
    State(state): State<AppState>,
    Json(req): Json<CreateTicketRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let command = req.validate()?;
    let ticket = state.ticket_service.create_ticket(command).await?;
    state.seat_cache.invalidate(&ticket.event_id).await;
    Ok((StatusCode::CREATED, Json(CreateTicketResponse::from(ticket))))
}

/// `DELETE /tickets/{id}` — Release a seat and delete the ticket.
///
/// # Errors
///
/// Returns [`GatewayError::TicketNotFound`] or
/// [`GatewayError::UnregistrationFailed`].
#[utoipa::path(
    delete,
    path = "/api/v1/tickets/{id}",
    tag = "Tickets",
    summary = "Cancel a ticket",
    description = "Unregisters the ticket with the provider, then deletes the local row. Accepts the local or the provider ticket id.",
    params(
        ("id" = String, Path, description = "Local or provider ticket id"),
    ),
    responses(
        (status = 200, description = "Ticket cancelled", body = CancelTicketResponse),
        (status = 404, description = "Ticket not found", body = ErrorResponse),
        (status = 409, description = "Provider refused to release the seat", body = ErrorResponse),
        (status = 502, description = "Provider unavailable", body = ErrorResponse),
    )
)]
pub async fn cancel_ticket(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let ticket = state.ticket_service.cancel_ticket(&id).await?;
    state.seat_cache.invalidate(&ticket.event_id).await;
    Ok(Json(CancelTicketResponse { success: true }))
}

/// Ticket routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tickets", post(create_ticket))
        .route("/tickets/{id}", delete(cancel_ticket))
}
