//! Wire models for the provider's paginated events feed.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::timestamp::deserialize_instant;
use crate::domain::{Event, Place};
use crate::error::GatewayError;

/// One page of the events feed.
///
/// Records are kept as raw JSON so that a single malformed record fails
/// when it is reached rather than when the page is fetched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventsPage {
    /// Event records in feed order.
    #[serde(default)]
    pub results: Vec<serde_json::Value>,
    /// Opaque continuation cursor; `None` once the feed is exhausted.
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPlace {
    id: String,
    name: String,
    city: String,
    address: String,
    seats_pattern: String,
    #[serde(deserialize_with = "deserialize_instant")]
    changed_at: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_instant")]
    created_at: DateTime<Utc>,
}

/// A feed record: an event with its place embedded.
#[derive(Debug, Deserialize)]
pub struct FeedRecord {
    id: String,
    name: String,
    place: RawPlace,
    #[serde(deserialize_with = "deserialize_instant")]
    event_time: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_instant")]
    registration_deadline: DateTime<Utc>,
    status: String,
    number_of_visitors: i32,
    #[serde(deserialize_with = "deserialize_instant")]
    changed_at: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_instant")]
    created_at: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_instant")]
    status_changed_at: DateTime<Utc>,
}

impl FeedRecord {
    /// Parses a raw feed value into the place and event it describes.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MalformedRecord`] if a field is missing or
    /// has the wrong shape.
    pub fn parse(raw: serde_json::Value) -> Result<(Place, Event), GatewayError> {
        let record: Self = serde_json::from_value(raw)
            .map_err(|e| GatewayError::MalformedRecord(e.to_string()))?;
        Ok(record.into_models())
    }

    fn into_models(self) -> (Place, Event) {
        let place = Place {
            id: self.place.id,
            name: self.place.name,
            city: self.place.city,
            address: self.place.address,
            seats_pattern: self.place.seats_pattern,
            changed_at: self.place.changed_at,
            created_at: self.place.created_at,
        };
        let event = Event {
            id: self.id,
            name: self.name,
            event_time: self.event_time,
            registration_deadline: self.registration_deadline,
            status: self.status,
            number_of_visitors: self.number_of_visitors,
            changed_at: self.changed_at,
            created_at: self.created_at,
            status_changed_at: self.status_changed_at,
            place_id: place.id.clone(),
        };
        (place, event)
    }
}
