//! # events-sync-gateway
//!
//! Booking gateway in front of an upstream events provider.
//!
//! A reconciliation engine mirrors the provider's paginated events feed
//! into PostgreSQL, tracking a single watermark so each run only asks for
//! records changed since the last successful one. Ticket creation and
//! cancellation are passed straight through to the provider and only
//! touch local storage once the provider has confirmed.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers + SeatCache (api/)
//!     │
//!     ├── TicketService, SyncScheduler → SyncService (service/)
//!     │
//!     ├── EventsProvider → ProviderClient, EventsPaginator (provider/)
//!     │
//!     └── SyncStore / BookingStore → PostgresStore (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod provider;
pub mod service;

#[cfg(test)]
mod testing;
