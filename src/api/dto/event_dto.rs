//! Event read DTOs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{EventDetail, Place};

/// Venue embedded in [`EventDetailResponse`].
#[derive(Debug, Serialize, ToSchema)]
pub struct PlaceDto {
    /// Provider-assigned place id.
    pub id: String,
    /// Venue name.
    pub name: String,
    /// City.
    pub city: String,
    /// Street address.
    pub address: String,
    /// Compact seat layout, e.g. `"A1-20,B1-15"`.
    pub seats_pattern: String,
}

impl From<Place> for PlaceDto {
    fn from(place: Place) -> Self {
        Self {
            id: place.id,
            name: place.name,
            city: place.city,
            address: place.address,
            seats_pattern: place.seats_pattern,
        }
    }
}

/// Response body for `GET /events/{id}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct EventDetailResponse {
    /// Provider-assigned event id.
    pub id: String,
    /// Event name.
    pub name: String,
    /// When the event takes place.
    pub event_time: DateTime<Utc>,
    /// Last moment registration is accepted.
    pub registration_deadline: DateTime<Utc>,
    /// Provider status (`draft`, `published`, ...).
    pub status: String,
    /// Visitor count reported by the provider.
    pub number_of_visitors: i32,
    /// Last upstream change.
    pub changed_at: DateTime<Utc>,
    /// Venue.
    pub place: PlaceDto,
}

impl From<EventDetail> for EventDetailResponse {
    fn from(detail: EventDetail) -> Self {
        let EventDetail { event, place } = detail;
        Self {
            id: event.id,
            name: event.name,
            event_time: event.event_time,
            registration_deadline: event.registration_deadline,
            status: event.status,
            number_of_visitors: event.number_of_visitors,
            changed_at: event.changed_at,
            place: place.into(),
        }
    }
}

/// Response body for `GET /events/{id}/seats`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SeatsResponse {
    /// Event the seats belong to.
    pub event_id: String,
    /// Free seat labels as reported by the provider.
    pub seats: Vec<String>,
}
