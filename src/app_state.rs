//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::api::seat_cache::SeatCache;
use crate::service::{SyncScheduler, TicketService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Ticket usecases and event reads.
    pub ticket_service: Arc<TicketService>,
    /// Single-flight access to the sync engine.
    pub sync_scheduler: Arc<SyncScheduler>,
    /// Per-event seat listings cached at the boundary.
    pub seat_cache: SeatCache,
}
