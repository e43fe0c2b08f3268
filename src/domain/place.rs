//! Venue records mirrored from the provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A venue as last seen in the provider feed.
///
/// Identity is the provider-assigned `id`. The local row is a cache and
/// is overwritten wholesale on every upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Place {
    /// Provider-assigned identifier.
    pub id: String,
    /// Venue name.
    pub name: String,
    /// City the venue is in.
    pub city: String,
    /// Street address.
    pub address: String,
    /// Compact seat layout, e.g. `"A1-20,B1-15"`.
    pub seats_pattern: String,
    /// Last upstream modification.
    pub changed_at: DateTime<Utc>,
    /// Upstream creation time.
    pub created_at: DateTime<Utc>,
}
