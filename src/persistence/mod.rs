//! Persistence layer: local replica of places/events, tickets, and the
//! sync watermark.
//!
//! The [`SyncStore`] and [`BookingStore`] traits are the seams the
//! service layer depends on. [`PostgresStore`] is the production
//! implementation over `sqlx::PgPool`; [`InMemoryStore`] keeps the same
//! transactional contract in process.

pub mod memory;
pub mod postgres;
pub mod store;

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use store::{BookingStore, SyncBatch, SyncStore};
