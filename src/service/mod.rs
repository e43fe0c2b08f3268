//! Service layer: business logic orchestration.
//!
//! [`SyncService`] mirrors the provider feed into local storage,
//! [`SyncScheduler`] keeps runs single-flight, and [`TicketService`]
//! hands ticket operations through to the provider.

pub mod scheduler;
pub mod sync_service;
pub mod ticket_service;

pub use scheduler::SyncScheduler;
pub use sync_service::{SyncReport, SyncService};
pub use ticket_service::{CreateTicket, TicketService};
