//! In-process store with the same transactional contract as
//! [`super::PostgresStore`].
//!
//! Batch writes are staged privately and only become visible to other
//! readers when the batch commits.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::store::{BookingStore, SyncBatch, SyncStore};
use crate::domain::{Event, EventDetail, NewTicket, Place, SyncStatus, SyncWatermark, Ticket};
use crate::error::GatewayError;

#[derive(Debug, Default)]
struct MemoryState {
    places: BTreeMap<String, Place>,
    events: BTreeMap<String, Event>,
    tickets: BTreeMap<String, Ticket>,
    watermark: Option<SyncWatermark>,
}

/// Shared in-memory store. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<MemoryState>>,
    fail_ticket_writes: Arc<AtomicBool>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent ticket inserts and deletes fail with a persistence
    /// error.
    pub fn fail_ticket_writes(&self, fail: bool) {
        self.fail_ticket_writes.store(fail, Ordering::SeqCst);
    }

    /// Stores a place and event directly, bypassing the sync engine.
    pub async fn seed(&self, place: Place, event: Event) {
        let mut state = self.state.write().await;
        state.places.insert(place.id.clone(), place);
        state.events.insert(event.id.clone(), event);
    }

    /// All committed places, ordered by id.
    pub async fn places(&self) -> Vec<Place> {
        self.state.read().await.places.values().cloned().collect()
    }

    /// All committed events, ordered by id.
    pub async fn events(&self) -> Vec<Event> {
        self.state.read().await.events.values().cloned().collect()
    }

    /// All stored tickets, ordered by local id.
    pub async fn tickets(&self) -> Vec<Ticket> {
        self.state.read().await.tickets.values().cloned().collect()
    }
}

#[async_trait]
impl SyncStore for InMemoryStore {
    async fn load_or_create_watermark(&self) -> Result<SyncWatermark, GatewayError> {
        let mut state = self.state.write().await;
        Ok(*state.watermark.get_or_insert_with(SyncWatermark::default))
    }

    async fn watermark(&self) -> Result<Option<SyncWatermark>, GatewayError> {
        Ok(self.state.read().await.watermark)
    }

    async fn mark_running(&self, started_at: DateTime<Utc>) -> Result<(), GatewayError> {
        let mut state = self.state.write().await;
        let watermark = state.watermark.get_or_insert_with(SyncWatermark::default);
        watermark.sync_status = SyncStatus::Running;
        watermark.last_sync_time = Some(started_at);
        Ok(())
    }

    async fn mark_error(&self) -> Result<(), GatewayError> {
        let mut state = self.state.write().await;
        if let Some(watermark) = state.watermark.as_mut() {
            watermark.sync_status = SyncStatus::Error;
        }
        Ok(())
    }

    async fn begin_batch(&self) -> Result<Box<dyn SyncBatch>, GatewayError> {
        Ok(Box::new(MemoryBatch {
            state: Arc::clone(&self.state),
            places: BTreeMap::new(),
            events: BTreeMap::new(),
        }))
    }
}

#[derive(Debug)]
struct MemoryBatch {
    state: Arc<RwLock<MemoryState>>,
    places: BTreeMap<String, Place>,
    events: BTreeMap<String, Event>,
}

#[async_trait]
impl SyncBatch for MemoryBatch {
    async fn upsert_place(&mut self, place: &Place) -> Result<(), GatewayError> {
        let existing = match self.places.get(&place.id) {
            Some(staged) => Some(staged.clone()),
            None => self.state.read().await.places.get(&place.id).cloned(),
        };
        let row = match existing {
            Some(mut row) => {
                row.name.clone_from(&place.name);
                row.city.clone_from(&place.city);
                row.address.clone_from(&place.address);
                row.seats_pattern.clone_from(&place.seats_pattern);
                row.changed_at = place.changed_at;
                row
            }
            None => place.clone(),
        };
        self.places.insert(row.id.clone(), row);
        Ok(())
    }

    async fn upsert_event(&mut self, event: &Event) -> Result<(), GatewayError> {
        let state = self.state.read().await;
        if !self.places.contains_key(&event.place_id)
            && !state.places.contains_key(&event.place_id)
        {
            return Err(GatewayError::PersistenceError(format!(
                "event {} references unknown place {}",
                event.id, event.place_id
            )));
        }

        let existing = self
            .events
            .get(&event.id)
            .or_else(|| state.events.get(&event.id))
            .cloned();
        drop(state);

        let row = match existing {
            Some(mut row) => {
                row.name.clone_from(&event.name);
                row.event_time = event.event_time;
                row.registration_deadline = event.registration_deadline;
                row.status.clone_from(&event.status);
                row.number_of_visitors = event.number_of_visitors;
                row.changed_at = event.changed_at;
                row.status_changed_at = event.status_changed_at;
                row.place_id.clone_from(&event.place_id);
                row
            }
            None => event.clone(),
        };
        self.events.insert(row.id.clone(), row);
        Ok(())
    }

    async fn commit(
        self: Box<Self>,
        last_changed_at: Option<DateTime<Utc>>,
    ) -> Result<(), GatewayError> {
        let Self {
            state,
            places,
            events,
        } = *self;
        let mut state = state.write().await;
        state.places.extend(places);
        state.events.extend(events);
        let watermark = state.watermark.get_or_insert_with(SyncWatermark::default);
        watermark.sync_status = SyncStatus::Success;
        if let Some(ts) = last_changed_at {
            watermark.last_changed_at = Some(ts);
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), GatewayError> {
        Ok(())
    }
}

#[async_trait]
impl BookingStore for InMemoryStore {
    async fn find_event(&self, event_id: &str) -> Result<Option<Event>, GatewayError> {
        Ok(self.state.read().await.events.get(event_id).cloned())
    }

    async fn find_event_detail(
        &self,
        event_id: &str,
    ) -> Result<Option<EventDetail>, GatewayError> {
        let state = self.state.read().await;
        let Some(event) = state.events.get(event_id) else {
            return Ok(None);
        };
        let place = state.places.get(&event.place_id).cloned().ok_or_else(|| {
            GatewayError::PersistenceError(format!(
                "event {event_id} references missing place {}",
                event.place_id
            ))
        })?;
        Ok(Some(EventDetail {
            event: event.clone(),
            place,
        }))
    }

    async fn insert_ticket(&self, ticket: NewTicket) -> Result<Ticket, GatewayError> {
        if self.fail_ticket_writes.load(Ordering::SeqCst) {
            return Err(GatewayError::PersistenceError(
                "ticket writes are disabled".to_string(),
            ));
        }
        let ticket = ticket.into_ticket(Utc::now());
        let mut state = self.state.write().await;
        if !state.events.contains_key(&ticket.event_id) {
            return Err(GatewayError::PersistenceError(format!(
                "ticket references unknown event {}",
                ticket.event_id
            )));
        }
        state.tickets.insert(ticket.id.clone(), ticket.clone());
        Ok(ticket)
    }

    async fn find_ticket(&self, id: &str) -> Result<Option<Ticket>, GatewayError> {
        let state = self.state.read().await;
        if let Some(ticket) = state.tickets.get(id) {
            return Ok(Some(ticket.clone()));
        }
        Ok(state.tickets.values().find(|t| t.matches(id)).cloned())
    }

    async fn delete_ticket(&self, ticket: &Ticket) -> Result<(), GatewayError> {
        if self.fail_ticket_writes.load(Ordering::SeqCst) {
            return Err(GatewayError::PersistenceError(
                "ticket writes are disabled".to_string(),
            ));
        }
        self.state
            .write()
            .await
            .tickets
            .remove(&ticket.id)
            .map(|_| ())
            .ok_or_else(|| GatewayError::TicketNotFound(ticket.id.clone()))
    }
}
