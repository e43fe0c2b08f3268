//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the central error type for the gateway. Each variant
//! belongs to an [`ErrorKind`] and maps to a specific HTTP status code and
//! structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 4002,
///     "message": "registration rejected by provider (status 409)",
///     "details": "seat already taken"
///   }
/// }
/// ```
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`GatewayError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Remote diagnostic text, present for provider rejections.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Coarse classification of a [`GatewayError`].
///
/// The boundary layer and the scheduler branch on this instead of
/// inspecting message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Expected business rejection (missing event, closed registration, ...).
    Validation,
    /// The provider declined a ticket operation.
    RemoteRejection,
    /// The provider could not be reached or answered a read with non-2xx.
    Transport,
    /// A reconciliation run failed.
    SyncFailure,
    /// The request conflicts with work already in flight.
    Conflict,
    /// Storage or other server-side failure.
    Internal,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category           | HTTP Status                    |
/// |-----------|--------------------|--------------------------------|
/// | 1000–1999 | Validation         | 400 Bad Request                |
/// | 2000–2999 | State/Not Found    | 404 Not Found / 409 Conflict   |
/// | 3000–3999 | Server             | 500 Internal Server Error      |
/// | 4000–4999 | Upstream provider  | 502 Bad Gateway / 409 Conflict |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// No locally cached event with the given id.
    #[error("event not found: {0}")]
    EventNotFound(String),

    /// The event exists but is not open for registration.
    #[error("event is not published: {0}")]
    EventNotPublished(String),

    /// The event's registration deadline is in the past.
    #[error("registration deadline has passed for event {0}")]
    RegistrationDeadlinePassed(String),

    /// No local ticket matches the given local or upstream id.
    #[error("ticket not found: {0}")]
    TicketNotFound(String),

    /// Request validation failed at the boundary.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The provider refused to register the seat.
    #[error("registration rejected by provider (status {status})")]
    RegistrationRejected {
        /// HTTP status returned by the provider.
        status: u16,
        /// Raw response body returned by the provider.
        body: String,
    },

    /// The provider did not confirm the seat release.
    #[error("unregistration failed at provider (status {status})")]
    UnregistrationFailed {
        /// HTTP status returned by the provider.
        status: u16,
        /// Raw response body returned by the provider.
        body: String,
    },

    /// Network failure, timeout, or non-2xx answer on a provider read.
    #[error("events provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// A feed record could not be parsed into a place and an event.
    #[error("malformed feed record: {0}")]
    MalformedRecord(String),

    /// A reconciliation run failed; wraps the underlying cause.
    #[error("sync failed: {0}")]
    SyncFailed(#[source] Box<GatewayError>),

    /// A reconciliation run is already in flight.
    #[error("a sync run is already in progress")]
    SyncInProgress,

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the [`ErrorKind`] this variant belongs to.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::EventNotFound(_)
            | Self::EventNotPublished(_)
            | Self::RegistrationDeadlinePassed(_)
            | Self::TicketNotFound(_)
            | Self::InvalidRequest(_) => ErrorKind::Validation,
            Self::RegistrationRejected { .. } | Self::UnregistrationFailed { .. } => {
                ErrorKind::RemoteRejection
            }
            Self::ProviderUnavailable(_) | Self::MalformedRecord(_) => ErrorKind::Transport,
            Self::SyncFailed(_) => ErrorKind::SyncFailure,
            Self::SyncInProgress => ErrorKind::Conflict,
            Self::PersistenceError(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::EventNotPublished(_) => 1002,
            Self::RegistrationDeadlinePassed(_) => 1003,
            Self::EventNotFound(_) => 2001,
            Self::TicketNotFound(_) => 2002,
            Self::SyncInProgress => 2003,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
            Self::SyncFailed(_) => 3002,
            Self::ProviderUnavailable(_) => 4001,
            Self::RegistrationRejected { .. } => 4002,
            Self::UnregistrationFailed { .. } => 4003,
            Self::MalformedRecord(_) => 4004,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_)
            | Self::EventNotPublished(_)
            | Self::RegistrationDeadlinePassed(_) => StatusCode::BAD_REQUEST,
            Self::EventNotFound(_) | Self::TicketNotFound(_) => StatusCode::NOT_FOUND,
            Self::SyncInProgress
            | Self::RegistrationRejected { .. }
            | Self::UnregistrationFailed { .. } => StatusCode::CONFLICT,
            Self::ProviderUnavailable(_) | Self::MalformedRecord(_) => StatusCode::BAD_GATEWAY,
            Self::SyncFailed(_) | Self::PersistenceError(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Remote diagnostic text passed through verbatim from the provider.
    #[must_use]
    pub fn remote_details(&self) -> Option<&str> {
        match self {
            Self::RegistrationRejected { body, .. } | Self::UnregistrationFailed { body, .. } => {
                Some(body.as_str())
            }
            _ => None,
        }
    }
}

impl From<sqlx::Error> for GatewayError {
    fn from(err: sqlx::Error) -> Self {
        Self::PersistenceError(err.to_string())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match self.kind() {
            ErrorKind::Validation | ErrorKind::Conflict => {
                tracing::debug!(error = %self, "request rejected");
            }
            ErrorKind::RemoteRejection => {
                tracing::warn!(
                    error = %self,
                    details = ?self.remote_details(),
                    "provider declined"
                );
            }
            ErrorKind::Transport | ErrorKind::SyncFailure | ErrorKind::Internal => {
                tracing::error!(error = %self, "request failed");
            }
        }

        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: self.remote_details().map(str::to_owned),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
