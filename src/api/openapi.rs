//! `OpenAPI` document for the REST API.

use utoipa::OpenApi;

/// `OpenAPI` documentation for `/health` and `/api/v1/*`.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "Events Sync Gateway",
        version = env!("CARGO_PKG_VERSION"),
        description = "Read access to synced events and pass-through ticket booking"
    ),
    paths(
        crate::api::handlers::system::health_handler,
        crate::api::handlers::events::get_event,
        crate::api::handlers::events::get_event_seats,
        crate::api::handlers::tickets::create_ticket,
        crate::api::handlers::tickets::cancel_ticket,
        crate::api::handlers::sync::trigger_sync,
        crate::api::handlers::sync::sync_status,
    ),
    components(
        schemas(
            crate::error::ErrorResponse,
            crate::error::ErrorBody,
            crate::api::handlers::system::HealthResponse,
            crate::api::dto::EventDetailResponse,
            crate::api::dto::PlaceDto,
            crate::api::dto::SeatsResponse,
            crate::api::dto::CreateTicketRequest,
            crate::api::dto::CreateTicketResponse,
            crate::api::dto::CancelTicketResponse,
            crate::api::dto::SyncStatusResponse,
            crate::service::SyncReport,
        )
    ),
    tags(
        (name = "System", description = "Service health"),
        (name = "Events", description = "Synced event reads"),
        (name = "Tickets", description = "Seat registration and cancellation"),
        (name = "Sync", description = "Reconciliation control"),
    ),
)]
pub struct ApiDoc;

/// Swagger UI routes serving [`ApiDoc`].
#[cfg(feature = "swagger-ui")]
pub fn swagger_routes() -> axum::Router<crate::app_state::AppState> {
    axum::Router::new().merge(
        utoipa_swagger_ui::SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/api/v1/events/{id}",
            "/api/v1/events/{id}/seats",
            "/api/v1/tickets",
            "/api/v1/tickets/{id}",
            "/api/v1/sync/trigger",
            "/api/v1/sync/status",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
