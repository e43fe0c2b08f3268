//! PostgreSQL implementation of the persistence layer.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use super::store::{BookingStore, SyncBatch, SyncStore};
use crate::domain::{Event, EventDetail, NewTicket, Place, SyncStatus, SyncWatermark, Ticket};
use crate::error::GatewayError;

/// Id of the single `sync_metadata` row.
const WATERMARK_ROW_ID: i32 = 1;

const EVENT_COLUMNS: &str = "id, name, event_time, registration_deadline, status, \
     number_of_visitors, changed_at, created_at, status_changed_at, place_id";

const TICKET_COLUMNS: &str =
    "id, event_id, ticket_id, first_name, last_name, email, seat, created_at";

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new store over the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the bundled migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), GatewayError> {
        sqlx::migrate!()
            .run(&self.pool)
            .await
            .map_err(|e| GatewayError::PersistenceError(format!("migration failed: {e}")))
    }
}

type WatermarkRow = (
    Option<DateTime<Utc>>,
    Option<DateTime<Utc>>,
    Option<String>,
);

fn watermark_from_row(
    (last_sync_time, last_changed_at, sync_status): WatermarkRow,
) -> Result<SyncWatermark, GatewayError> {
    let sync_status = match sync_status {
        Some(raw) => raw.parse()?,
        None => SyncStatus::Idle,
    };
    Ok(SyncWatermark {
        last_sync_time,
        last_changed_at,
        sync_status,
    })
}

#[async_trait]
impl SyncStore for PostgresStore {
    async fn load_or_create_watermark(&self) -> Result<SyncWatermark, GatewayError> {
        sqlx::query("INSERT INTO sync_metadata (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
            .bind(WATERMARK_ROW_ID)
            .execute(&self.pool)
            .await?;

        let row = sqlx::query_as::<_, WatermarkRow>(
            "SELECT last_sync_time, last_changed_at, sync_status FROM sync_metadata WHERE id = $1",
        )
        .bind(WATERMARK_ROW_ID)
        .fetch_one(&self.pool)
        .await?;

        watermark_from_row(row)
    }

    async fn watermark(&self) -> Result<Option<SyncWatermark>, GatewayError> {
        let row = sqlx::query_as::<_, WatermarkRow>(
            "SELECT last_sync_time, last_changed_at, sync_status FROM sync_metadata WHERE id = $1",
        )
        .bind(WATERMARK_ROW_ID)
        .fetch_optional(&self.pool)
        .await?;

        row.map(watermark_from_row).transpose()
    }

    async fn mark_running(&self, started_at: DateTime<Utc>) -> Result<(), GatewayError> {
        sqlx::query(
            "INSERT INTO sync_metadata (id, sync_status, last_sync_time) VALUES ($1, $2, $3) \
             ON CONFLICT (id) DO UPDATE \
             SET sync_status = EXCLUDED.sync_status, last_sync_time = EXCLUDED.last_sync_time",
        )
        .bind(WATERMARK_ROW_ID)
        .bind(SyncStatus::Running.as_str())
        .bind(started_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_error(&self) -> Result<(), GatewayError> {
        sqlx::query("UPDATE sync_metadata SET sync_status = $2 WHERE id = $1")
            .bind(WATERMARK_ROW_ID)
            .bind(SyncStatus::Error.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn begin_batch(&self) -> Result<Box<dyn SyncBatch>, GatewayError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgSyncBatch { tx }))
    }
}

/// A sync run's open transaction.
struct PgSyncBatch {
    tx: Transaction<'static, Postgres>,
}

impl fmt::Debug for PgSyncBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgSyncBatch").finish_non_exhaustive()
    }
}

#[async_trait]
impl SyncBatch for PgSyncBatch {
    async fn upsert_place(&mut self, place: &Place) -> Result<(), GatewayError> {
        sqlx::query(
            "INSERT INTO places (id, name, city, address, seats_pattern, changed_at, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (id) DO UPDATE SET \
             name = EXCLUDED.name, city = EXCLUDED.city, address = EXCLUDED.address, \
             seats_pattern = EXCLUDED.seats_pattern, changed_at = EXCLUDED.changed_at",
        )
        .bind(&place.id)
        .bind(&place.name)
        .bind(&place.city)
        .bind(&place.address)
        .bind(&place.seats_pattern)
        .bind(place.changed_at)
        .bind(place.created_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn upsert_event(&mut self, event: &Event) -> Result<(), GatewayError> {
        sqlx::query(
            "INSERT INTO events (id, name, event_time, registration_deadline, status, \
             number_of_visitors, changed_at, created_at, status_changed_at, place_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (id) DO UPDATE SET \
             name = EXCLUDED.name, event_time = EXCLUDED.event_time, \
             registration_deadline = EXCLUDED.registration_deadline, status = EXCLUDED.status, \
             number_of_visitors = EXCLUDED.number_of_visitors, changed_at = EXCLUDED.changed_at, \
             status_changed_at = EXCLUDED.status_changed_at, place_id = EXCLUDED.place_id",
        )
        .bind(&event.id)
        .bind(&event.name)
        .bind(event.event_time)
        .bind(event.registration_deadline)
        .bind(&event.status)
        .bind(event.number_of_visitors)
        .bind(event.changed_at)
        .bind(event.created_at)
        .bind(event.status_changed_at)
        .bind(&event.place_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn commit(
        self: Box<Self>,
        last_changed_at: Option<DateTime<Utc>>,
    ) -> Result<(), GatewayError> {
        let Self { mut tx } = *self;
        sqlx::query(
            "UPDATE sync_metadata \
             SET sync_status = $2, last_changed_at = COALESCE($3, last_changed_at) \
             WHERE id = $1",
        )
        .bind(WATERMARK_ROW_ID)
        .bind(SyncStatus::Success.as_str())
        .bind(last_changed_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), GatewayError> {
        let Self { tx } = *self;
        tx.rollback().await?;
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct EventDetailRow {
    #[sqlx(flatten)]
    event: Event,
    place_name: String,
    place_city: String,
    place_address: String,
    place_seats_pattern: String,
    place_changed_at: DateTime<Utc>,
    place_created_at: DateTime<Utc>,
}

impl From<EventDetailRow> for EventDetail {
    fn from(row: EventDetailRow) -> Self {
        let place = Place {
            id: row.event.place_id.clone(),
            name: row.place_name,
            city: row.place_city,
            address: row.place_address,
            seats_pattern: row.place_seats_pattern,
            changed_at: row.place_changed_at,
            created_at: row.place_created_at,
        };
        Self {
            event: row.event,
            place,
        }
    }
}

#[async_trait]
impl BookingStore for PostgresStore {
    async fn find_event(&self, event_id: &str) -> Result<Option<Event>, GatewayError> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(event)
    }

    async fn find_event_detail(
        &self,
        event_id: &str,
    ) -> Result<Option<EventDetail>, GatewayError> {
        let row = sqlx::query_as::<_, EventDetailRow>(
            "SELECT e.id, e.name, e.event_time, e.registration_deadline, e.status, \
             e.number_of_visitors, e.changed_at, e.created_at, e.status_changed_at, e.place_id, \
             p.name AS place_name, p.city AS place_city, p.address AS place_address, \
             p.seats_pattern AS place_seats_pattern, p.changed_at AS place_changed_at, \
             p.created_at AS place_created_at \
             FROM events e JOIN places p ON p.id = e.place_id \
             WHERE e.id = $1",
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(EventDetail::from))
    }

    async fn insert_ticket(&self, ticket: NewTicket) -> Result<Ticket, GatewayError> {
        let ticket = ticket.into_ticket(Utc::now());
        sqlx::query(&format!(
            "INSERT INTO tickets ({TICKET_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        ))
        .bind(&ticket.id)
        .bind(&ticket.event_id)
        .bind(&ticket.ticket_id)
        .bind(&ticket.first_name)
        .bind(&ticket.last_name)
        .bind(&ticket.email)
        .bind(&ticket.seat)
        .bind(ticket.created_at)
        .execute(&self.pool)
        .await?;
        Ok(ticket)
    }

    async fn find_ticket(&self, id: &str) -> Result<Option<Ticket>, GatewayError> {
        let ticket = sqlx::query_as::<_, Ticket>(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE id = $1 OR ticket_id = $1 \
             ORDER BY (id = $1) DESC LIMIT 1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(ticket)
    }

    async fn delete_ticket(&self, ticket: &Ticket) -> Result<(), GatewayError> {
        let result = sqlx::query("DELETE FROM tickets WHERE id = $1")
            .bind(&ticket.id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(GatewayError::TicketNotFound(ticket.id.clone()));
        }
        Ok(())
    }
}
