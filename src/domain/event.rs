//! Event records mirrored from the provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Place;

/// Status value under which the provider accepts registrations.
pub const STATUS_PUBLISHED: &str = "published";

/// An event as last seen in the provider feed.
///
/// `status` is kept as the provider's raw string (`draft`, `published`,
/// `cancelled`, `closed`, ...). `place_id` must reference a stored
/// [`Place`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Event {
    /// Provider-assigned identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// When the event takes place.
    pub event_time: DateTime<Utc>,
    /// Last instant at which tickets may be registered.
    pub registration_deadline: DateTime<Utc>,
    /// Raw provider status.
    pub status: String,
    /// Visitor count reported by the provider.
    pub number_of_visitors: i32,
    /// Last upstream modification; drives the sync watermark.
    pub changed_at: DateTime<Utc>,
    /// Upstream creation time.
    pub created_at: DateTime<Utc>,
    /// When `status` last changed upstream.
    pub status_changed_at: DateTime<Utc>,
    /// Venue this event belongs to.
    pub place_id: String,
}

impl Event {
    /// Returns `true` if the provider has opened the event for registration.
    #[must_use]
    pub fn is_published(&self) -> bool {
        self.status == STATUS_PUBLISHED
    }

    /// Returns `true` if `now` is later than the registration deadline.
    ///
    /// A registration exactly at the deadline is still accepted.
    #[must_use]
    pub fn registration_closed_at(&self, now: DateTime<Utc>) -> bool {
        now > self.registration_deadline
    }
}

/// An event joined with its venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventDetail {
    /// The event row.
    pub event: Event,
    /// The venue referenced by `event.place_id`.
    pub place: Place,
}
