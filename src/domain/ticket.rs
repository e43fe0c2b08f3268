//! Locally persisted tickets backed by an upstream registration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Attendee details forwarded to the provider on registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact email.
    pub email: String,
}

/// A stored ticket row.
///
/// `id` is generated locally; `ticket_id` is the identifier the provider
/// returned on registration and is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Ticket {
    /// Locally generated identifier (UUID v4 string).
    pub id: String,
    /// Event the seat was registered for.
    pub event_id: String,
    /// Provider-assigned ticket identifier.
    pub ticket_id: String,
    /// Attendee given name.
    pub first_name: String,
    /// Attendee family name.
    pub last_name: String,
    /// Attendee email.
    pub email: String,
    /// Seat label, e.g. `"A12"`.
    pub seat: String,
    /// Local creation time.
    pub created_at: DateTime<Utc>,
}

impl Ticket {
    /// Returns `true` if `id` is either the local or the upstream id.
    #[must_use]
    pub fn matches(&self, id: &str) -> bool {
        self.id == id || self.ticket_id == id
    }
}

/// A ticket ready to be persisted after a successful upstream registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicket {
    event_id: String,
    ticket_id: String,
    attendee: Attendee,
    seat: String,
}

impl NewTicket {
    /// Builds a new ticket record.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Internal`] if `ticket_id` is empty; every
    /// stored ticket must carry the provider's identifier.
    pub fn new(
        event_id: impl Into<String>,
        ticket_id: impl Into<String>,
        attendee: Attendee,
        seat: impl Into<String>,
    ) -> Result<Self, GatewayError> {
        let ticket_id = ticket_id.into();
        if ticket_id.trim().is_empty() {
            return Err(GatewayError::Internal(
                "refusing to store a ticket without an upstream ticket id".to_string(),
            ));
        }
        Ok(Self {
            event_id: event_id.into(),
            ticket_id,
            attendee,
            seat: seat.into(),
        })
    }

    /// Materializes the stored row with a fresh local id.
    #[must_use]
    pub fn into_ticket(self, created_at: DateTime<Utc>) -> Ticket {
        Ticket {
            id: uuid::Uuid::new_v4().to_string(),
            event_id: self.event_id,
            ticket_id: self.ticket_id,
            first_name: self.attendee.first_name,
            last_name: self.attendee.last_name,
            email: self.attendee.email,
            seat: self.seat,
            created_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn attendee() -> Attendee {
        Attendee {
            first_name: "Ivan".to_string(),
            last_name: "Ivanov".to_string(),
            email: "ivan@example.com".to_string(),
        }
    }

    #[test]
    fn empty_upstream_id_is_rejected() {
        assert!(NewTicket::new("evt-1", "", attendee(), "A1").is_err());
        assert!(NewTicket::new("evt-1", "   ", attendee(), "A1").is_err());
    }

    #[test]
    fn into_ticket_assigns_distinct_local_id() {
        let Ok(new_ticket) = NewTicket::new("evt-1", "up-1", attendee(), "A1") else {
            panic!("valid ticket");
        };
        let ticket = new_ticket.into_ticket(Utc::now());
        assert_ne!(ticket.id, ticket.ticket_id);
        assert_eq!(ticket.ticket_id, "up-1");
        assert!(ticket.matches("up-1"));
        assert!(ticket.matches(&ticket.id));
        assert!(!ticket.matches("other"));
    }
}
