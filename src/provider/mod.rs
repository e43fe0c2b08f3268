//! Upstream events provider: client capability set and feed pagination.
//!
//! [`EventsProvider`] is the seam the reconciliation engine and ticket
//! usecases depend on. [`ProviderClient`] implements it over HTTP;
//! [`EventsPaginator`] walks the cursor-based feed one page at a time.

pub mod client;
pub mod models;
pub mod paginator;

use std::fmt;

use async_trait::async_trait;

use crate::domain::Attendee;
use crate::error::GatewayError;

pub use client::ProviderClient;
pub use models::{EventsPage, FeedRecord};
pub use paginator::EventsPaginator;

/// Operations the gateway needs from the upstream provider.
///
/// Every call carries the API-key credential. Transport failures surface
/// as [`GatewayError::ProviderUnavailable`]; declined mutations surface as
/// [`GatewayError::RegistrationRejected`] or
/// [`GatewayError::UnregistrationFailed`].
#[async_trait]
pub trait EventsProvider: Send + Sync + fmt::Debug {
    /// First page of events whose `changed_at` is at or after `watermark`.
    async fn fetch_changed_since(&self, watermark: &str) -> Result<EventsPage, GatewayError>;

    /// Continuation page for a `next` cursor returned by a prior page.
    async fn fetch_page(&self, cursor: &str) -> Result<EventsPage, GatewayError>;

    /// Seats currently available for a published event.
    async fn fetch_seats(&self, event_id: &str) -> Result<Vec<String>, GatewayError>;

    /// Registers `seat` for the attendee and returns the upstream ticket id.
    async fn register_seat(
        &self,
        event_id: &str,
        attendee: &Attendee,
        seat: &str,
    ) -> Result<String, GatewayError>;

    /// Releases an upstream registration. Returns the provider's success
    /// flag.
    async fn unregister_seat(&self, event_id: &str, ticket_id: &str)
    -> Result<bool, GatewayError>;
}
