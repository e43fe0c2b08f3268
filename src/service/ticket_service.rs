//! Ticket lifecycle: create and cancel across the provider and local
//! storage.
//!
//! The remote call always comes first. Local rows are written only after
//! the provider confirmed a registration and removed only after it
//! confirmed an unregistration.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{Attendee, Event, EventDetail, NewTicket, Ticket};
use crate::error::GatewayError;
use crate::persistence::BookingStore;
use crate::provider::EventsProvider;

/// Input for [`TicketService::create_ticket`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTicket {
    /// Event to register for.
    pub event_id: String,
    /// Who is attending.
    pub attendee: Attendee,
    /// Requested seat label.
    pub seat: String,
}

/// Booking-side usecases.
#[derive(Debug, Clone)]
pub struct TicketService {
    provider: Arc<dyn EventsProvider>,
    store: Arc<dyn BookingStore>,
}

impl TicketService {
    /// Creates a new `TicketService`.
    #[must_use]
    pub fn new(provider: Arc<dyn EventsProvider>, store: Arc<dyn BookingStore>) -> Self {
        Self { provider, store }
    }

    /// Looks up an event together with its place.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::EventNotFound`] if the event is not cached
    /// locally.
    pub async fn event_detail(&self, event_id: &str) -> Result<EventDetail, GatewayError> {
        self.store
            .find_event_detail(event_id)
            .await?
            .ok_or_else(|| GatewayError::EventNotFound(event_id.to_string()))
    }

    /// Lists seats the provider currently reports as free.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::EventNotFound`] or
    /// [`GatewayError::EventNotPublished`] before any remote call, and
    /// [`GatewayError::ProviderUnavailable`] if the fetch fails.
    pub async fn available_seats(&self, event_id: &str) -> Result<Vec<String>, GatewayError> {
        let event = self.published_event(event_id).await?;
        self.provider.fetch_seats(&event.id).await
    }

    /// Registers a seat upstream, then stores the ticket locally.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::EventNotFound`], [`GatewayError::EventNotPublished`]
    ///   or [`GatewayError::RegistrationDeadlinePassed`] when a local
    ///   precondition fails; the provider is not contacted.
    /// - [`GatewayError::RegistrationRejected`] or
    ///   [`GatewayError::ProviderUnavailable`] when the provider call
    ///   fails; nothing is written locally.
    /// - [`GatewayError::PersistenceError`] when the local write fails
    ///   after a successful registration.
    pub async fn create_ticket(&self, request: CreateTicket) -> Result<Ticket, GatewayError> {
        let CreateTicket {
            event_id,
            attendee,
            seat,
        } = request;

        let event = self.published_event(&event_id).await?;
        if event.registration_closed_at(Utc::now()) {
            return Err(GatewayError::RegistrationDeadlinePassed(event_id));
        }

        let upstream_id = self
            .provider
            .register_seat(&event.id, &attendee, &seat)
            .await?;
        tracing::info!(
            event_id = %event.id,
            seat = %seat,
            ticket_id = %upstream_id,
            "seat registered upstream"
        );

        let new_ticket = NewTicket::new(event.id.clone(), upstream_id.clone(), attendee, seat)?;
        match self.store.insert_ticket(new_ticket).await {
            Ok(ticket) => Ok(ticket),
            Err(err) => {
                // No compensating unregister is attempted.
                tracing::error!(
                    event_id = %event.id,
                    ticket_id = %upstream_id,
                    error = %err,
                    "upstream registration has no local ticket"
                );
                Err(err)
            }
        }
    }

    /// Unregisters a ticket upstream, then deletes the local row.
    ///
    /// `id` may be the local id or the provider's ticket id. Returns the
    /// removed row.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::TicketNotFound`] if no local row matches.
    /// - [`GatewayError::UnregistrationFailed`] if the provider declines;
    ///   the local row is kept so the release can be retried.
    /// - [`GatewayError::ProviderUnavailable`] on transport failure.
    /// - [`GatewayError::PersistenceError`] when the local delete fails
    ///   after the provider released the seat.
    pub async fn cancel_ticket(&self, id: &str) -> Result<Ticket, GatewayError> {
        let ticket = self
            .store
            .find_ticket(id)
            .await?
            .ok_or_else(|| GatewayError::TicketNotFound(id.to_string()))?;

        let released = self
            .provider
            .unregister_seat(&ticket.event_id, &ticket.ticket_id)
            .await?;
        if !released {
            return Err(GatewayError::UnregistrationFailed {
                status: 200,
                body: format!("provider did not release ticket {}", ticket.ticket_id),
            });
        }

        if let Err(err) = self.store.delete_ticket(&ticket).await {
            // The seat is already free upstream; retries will be refused.
            tracing::error!(
                id = %ticket.id,
                event_id = %ticket.event_id,
                ticket_id = %ticket.ticket_id,
                error = %err,
                "seat released upstream but local ticket was not deleted"
            );
            return Err(err);
        }
        tracing::info!(
            event_id = %ticket.event_id,
            ticket_id = %ticket.ticket_id,
            "ticket cancelled"
        );
        Ok(ticket)
    }

    async fn published_event(&self, event_id: &str) -> Result<Event, GatewayError> {
        let event = self
            .store
            .find_event(event_id)
            .await?
            .ok_or_else(|| GatewayError::EventNotFound(event_id.to_string()))?;
        if !event.is_published() {
            return Err(GatewayError::EventNotPublished(event_id.to_string()));
        }
        Ok(event)
    }
}
