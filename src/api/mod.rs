//! REST API layer: route handlers, DTOs, seat cache, and router
//! composition.
//!
//! Resource endpoints are mounted under `/api/v1`; `/health` sits at the
//! root. With the `swagger-ui` feature the `OpenAPI` document is served at
//! `/api-doc/openapi.json` and browsable under `/docs`.

pub mod dto;
pub mod handlers;
pub mod openapi;
pub mod seat_cache;

use axum::Router;

use crate::app_state::AppState;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(openapi::swagger_routes());

    router
}
