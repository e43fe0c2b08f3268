//! Storage traits used by the service layer.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Event, EventDetail, NewTicket, Place, SyncWatermark, Ticket};
use crate::error::GatewayError;

/// Storage operations owned by the reconciliation engine.
///
/// Status transitions (`mark_running`, `mark_error`) commit on their own.
/// Place/event writes go through a [`SyncBatch`] that commits together
/// with the watermark advance.
#[async_trait]
pub trait SyncStore: Send + Sync + fmt::Debug {
    /// Returns the singleton watermark, creating it on first use.
    async fn load_or_create_watermark(&self) -> Result<SyncWatermark, GatewayError>;

    /// Returns the watermark without creating it.
    async fn watermark(&self) -> Result<Option<SyncWatermark>, GatewayError>;

    /// Records `running` and the run start time, committed immediately.
    async fn mark_running(&self, started_at: DateTime<Utc>) -> Result<(), GatewayError>;

    /// Records `error`, committed immediately. `last_changed_at` is left
    /// untouched.
    async fn mark_error(&self) -> Result<(), GatewayError>;

    /// Opens the unit of work for one run's place/event writes.
    async fn begin_batch(&self) -> Result<Box<dyn SyncBatch>, GatewayError>;
}

/// One run's uncommitted place/event writes.
///
/// Each upsert is visible to later upserts in the same batch. Dropping a
/// batch without committing discards its writes.
#[async_trait]
pub trait SyncBatch: Send + fmt::Debug {
    /// Inserts the place or overwrites its mutable fields.
    async fn upsert_place(&mut self, place: &Place) -> Result<(), GatewayError>;

    /// Inserts the event or overwrites its mutable fields, including
    /// `place_id`. The referenced place must already exist in the batch
    /// or in committed state.
    async fn upsert_event(&mut self, event: &Event) -> Result<(), GatewayError>;

    /// Commits all writes together with `sync_status = success` and, when
    /// given, the new `last_changed_at`.
    async fn commit(
        self: Box<Self>,
        last_changed_at: Option<DateTime<Utc>>,
    ) -> Result<(), GatewayError>;

    /// Discards all writes.
    async fn rollback(self: Box<Self>) -> Result<(), GatewayError>;
}

/// Storage operations used by the booking flow.
#[async_trait]
pub trait BookingStore: Send + Sync + fmt::Debug {
    /// Looks up a cached event.
    async fn find_event(&self, event_id: &str) -> Result<Option<Event>, GatewayError>;

    /// Looks up a cached event joined with its place.
    async fn find_event_detail(&self, event_id: &str)
    -> Result<Option<EventDetail>, GatewayError>;

    /// Persists a ticket for a confirmed upstream registration.
    async fn insert_ticket(&self, ticket: NewTicket) -> Result<Ticket, GatewayError>;

    /// Finds a ticket by local id or by upstream ticket id.
    async fn find_ticket(&self, id: &str) -> Result<Option<Ticket>, GatewayError>;

    /// Deletes a ticket row.
    async fn delete_ticket(&self, ticket: &Ticket) -> Result<(), GatewayError>;
}
