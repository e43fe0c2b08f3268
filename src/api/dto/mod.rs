//! Data Transfer Objects for REST request/response serialization.
//!
//! Timestamps are serialized as RFC 3339 strings in UTC.

pub mod event_dto;
pub mod sync_dto;
pub mod ticket_dto;

pub use event_dto::*;
pub use sync_dto::*;
pub use ticket_dto::*;
