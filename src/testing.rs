//! Scripted collaborators shared by unit tests.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::json;

use crate::domain::Attendee;
use crate::error::GatewayError;
use crate::provider::{EventsPage, EventsProvider};

/// How the scripted provider answers a register call.
#[derive(Debug, Clone)]
pub(crate) enum RegisterBehavior {
    Accept(String),
    Reject { status: u16, body: String },
    Unavailable,
}

/// How the scripted provider answers an unregister call.
#[derive(Debug, Clone)]
pub(crate) enum UnregisterBehavior {
    Confirm,
    Decline,
    Fail { status: u16, body: String },
}

/// In-process [`EventsProvider`] that replays a fixed list of pages and
/// records every call it receives.
#[derive(Debug)]
pub(crate) struct ScriptedProvider {
    pages: Mutex<VecDeque<EventsPage>>,
    calls: Mutex<Vec<String>>,
    seats: Vec<String>,
    register: RegisterBehavior,
    unregister: UnregisterBehavior,
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self {
            pages: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            seats: Vec::new(),
            register: RegisterBehavior::Accept("upstream-ticket-1".to_string()),
            unregister: UnregisterBehavior::Confirm,
        }
    }
}

impl ScriptedProvider {
    pub(crate) fn with_pages(pages: Vec<EventsPage>) -> Self {
        Self {
            pages: Mutex::new(pages.into()),
            ..Self::default()
        }
    }

    pub(crate) fn registering(mut self, behavior: RegisterBehavior) -> Self {
        self.register = behavior;
        self
    }

    pub(crate) fn unregistering(mut self, behavior: UnregisterBehavior) -> Self {
        self.unregister = behavior;
        self
    }

    pub(crate) fn with_seats(mut self, seats: &[&str]) -> Self {
        self.seats = seats.iter().map(|s| (*s).to_string()).collect();
        self
    }

    pub(crate) fn push_page(&self, page: EventsPage) {
        self.pages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(page);
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn calls_starting_with(&self, prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    fn next_page(&self) -> Result<EventsPage, GatewayError> {
        self.pages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .ok_or_else(|| GatewayError::ProviderUnavailable("no scripted page left".to_string()))
    }
}

#[async_trait]
impl EventsProvider for ScriptedProvider {
    async fn fetch_changed_since(&self, watermark: &str) -> Result<EventsPage, GatewayError> {
        self.record(format!("since:{watermark}"));
        self.next_page()
    }

    async fn fetch_page(&self, cursor: &str) -> Result<EventsPage, GatewayError> {
        self.record(format!("page:{cursor}"));
        self.next_page()
    }

    async fn fetch_seats(&self, event_id: &str) -> Result<Vec<String>, GatewayError> {
        self.record(format!("seats:{event_id}"));
        Ok(self.seats.clone())
    }

    async fn register_seat(
        &self,
        event_id: &str,
        _attendee: &Attendee,
        seat: &str,
    ) -> Result<String, GatewayError> {
        self.record(format!("register:{event_id}:{seat}"));
        match &self.register {
            RegisterBehavior::Accept(ticket_id) => Ok(ticket_id.clone()),
            RegisterBehavior::Reject { status, body } => Err(GatewayError::RegistrationRejected {
                status: *status,
                body: body.clone(),
            }),
            RegisterBehavior::Unavailable => Err(GatewayError::ProviderUnavailable(
                "connection reset".to_string(),
            )),
        }
    }

    async fn unregister_seat(
        &self,
        event_id: &str,
        ticket_id: &str,
    ) -> Result<bool, GatewayError> {
        self.record(format!("unregister:{event_id}:{ticket_id}"));
        match &self.unregister {
            UnregisterBehavior::Confirm => Ok(true),
            UnregisterBehavior::Decline => Ok(false),
            UnregisterBehavior::Fail { status, body } => Err(GatewayError::UnregistrationFailed {
                status: *status,
                body: body.clone(),
            }),
        }
    }
}

/// A feed record for `event_id` at `place_id`.
pub(crate) fn feed_record(
    event_id: &str,
    place_id: &str,
    status: &str,
    changed_at: &str,
    registration_deadline: &str,
) -> serde_json::Value {
    json!({
        "id": event_id,
        "name": format!("Event {event_id}"),
        "place": {
            "id": place_id,
            "name": format!("Place {place_id}"),
            "city": "Moscow",
            "address": "Tverskaya 1",
            "seats_pattern": "A1-20,B1-15",
            "changed_at": changed_at,
            "created_at": "2023-01-01T00:00:00+00:00"
        },
        "event_time": "2030-01-01T19:00:00+00:00",
        "registration_deadline": registration_deadline,
        "status": status,
        "number_of_visitors": 0,
        "changed_at": changed_at,
        "created_at": "2023-01-01T00:00:00+00:00",
        "status_changed_at": changed_at
    })
}

/// A single page holding `records` with an optional cursor.
pub(crate) fn page_of(records: Vec<serde_json::Value>, next: Option<&str>) -> EventsPage {
    EventsPage {
        results: records,
        next: next.map(str::to_owned),
    }
}
