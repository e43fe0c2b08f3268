//! Domain layer: cached upstream entities, local tickets, and the sync
//! watermark.
//!
//! [`Place`] and [`Event`] are read replicas of provider-owned records and
//! are only ever written by the reconciliation engine. [`Ticket`] rows are
//! owned locally but only exist alongside a confirmed upstream
//! registration.

pub mod event;
pub mod place;
pub mod ticket;
pub mod timestamp;
pub mod watermark;

pub use event::{Event, EventDetail};
pub use place::Place;
pub use ticket::{Attendee, NewTicket, Ticket};
pub use watermark::{SyncStatus, SyncWatermark};
