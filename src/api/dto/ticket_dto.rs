//! Ticket DTOs for create and cancel.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Attendee, Ticket};
use crate::error::GatewayError;
use crate::service::CreateTicket;

/// Request body for `POST /tickets`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateTicketRequest {
    /// Event to register for.
    pub event_id: String,
    /// Attendee given name.
    pub first_name: String,
    /// Attendee family name.
    pub last_name: String,
    /// Attendee email.
    pub email: String,
    /// Requested seat label, e.g. `"A12"`.
    pub seat: String,
}

impl CreateTicketRequest {
    /// Validates the body and converts it into a usecase command.
    ///
    /// Surrounding whitespace is trimmed from every field.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] if a field is blank or the
    /// email is not of the form `local@domain.tld`.
    pub fn validate(self) -> Result<CreateTicket, GatewayError> {
        let event_id = required("event_id", &self.event_id)?;
        let first_name = required("first_name", &self.first_name)?;
        let last_name = required("last_name", &self.last_name)?;
        let email = required("email", &self.email)?;
        let seat = required("seat", &self.seat)?;

        if !looks_like_email(&email) {
            return Err(GatewayError::InvalidRequest(format!(
                "invalid email: {email}"
            )));
        }

        Ok(CreateTicket {
            event_id,
            attendee: Attendee {
                first_name,
                last_name,
                email,
            },
            seat,
        })
    }
}

fn required(field: &str, value: &str) -> Result<String, GatewayError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(GatewayError::InvalidRequest(format!("missing {field}")));
    }
    Ok(trimmed.to_string())
}

fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.contains(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
}

/// Response body for `POST /tickets` (201 Created).
#[derive(Debug, Serialize, ToSchema)]
pub struct CreateTicketResponse {
    /// Provider-assigned ticket id.
    pub ticket_id: String,
    /// Local ticket id.
    pub id: String,
}

impl From<Ticket> for CreateTicketResponse {
    fn from(ticket: Ticket) -> Self {
        Self {
            ticket_id: ticket.ticket_id,
            id: ticket.id,
        }
    }
}

/// Response body for `DELETE /tickets/{id}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct CancelTicketResponse {
    /// Always `true`; failures are reported as errors.
    pub success: bool,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn body() -> CreateTicketRequest {
        CreateTicketRequest {
            event_id: " e1 ".to_string(),
            first_name: "Olga".to_string(),
            last_name: "Sidorova".to_string(),
            email: "olga@example.org".to_string(),
            seat: "B7".to_string(),
        }
    }

    #[test]
    fn valid_body_becomes_command() {
        let Ok(command) = body().validate() else {
            panic!("body should validate");
        };
        assert_eq!(command.event_id, "e1");
        assert_eq!(command.attendee.email, "olga@example.org");
        assert_eq!(command.seat, "B7");
    }

    #[test]
    fn blank_field_is_rejected() {
        let mut req = body();
        req.seat = "   ".to_string();
        let Err(GatewayError::InvalidRequest(msg)) = req.validate() else {
            panic!("blank seat must be rejected");
        };
        assert_eq!(msg, "missing seat");
    }

    #[test]
    fn email_shape_is_checked() {
        for bad in [
            "olga",
            "@example.org",
            "olga@",
            "olga@example",
            "o lga@example.org",
            "a@b@c.d",
        ] {
            let mut req = body();
            req.email = bad.to_string();
            assert!(
                matches!(req.validate(), Err(GatewayError::InvalidRequest(_))),
                "{bad} should be rejected"
            );
        }
    }
}
