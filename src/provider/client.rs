//! HTTP client for the upstream events provider.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode, Url, redirect};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use super::{EventsPage, EventsProvider};
use crate::domain::Attendee;
use crate::error::GatewayError;

/// Header carrying the provider credential.
pub const API_KEY_HEADER: &str = "x-api-key";

/// `reqwest`-backed [`EventsProvider`].
///
/// Reads follow redirects; register/unregister calls do not, so a
/// redirected mutation is reported back instead of silently replayed.
#[derive(Debug, Clone)]
pub struct ProviderClient {
    base_url: Url,
    reads: Client,
    writes: Client,
}

#[derive(Debug, Deserialize)]
struct SeatsResponse {
    #[serde(default)]
    seats: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RegisterResponse {
    ticket_id: String,
}

#[derive(Debug, Deserialize)]
struct UnregisterResponse {
    #[serde(default)]
    success: bool,
}

impl ProviderClient {
    /// Builds a client for the provider at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] if the URL or API key is
    /// unusable, and [`GatewayError::Internal`] if the HTTP client cannot
    /// be constructed.
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| GatewayError::InvalidRequest(format!("invalid provider url: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(GatewayError::InvalidRequest(format!(
                "provider url {base_url} cannot be used as a base"
            )));
        }

        let mut key = HeaderValue::from_str(api_key)
            .map_err(|_| GatewayError::InvalidRequest("invalid provider api key".to_string()))?;
        key.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, key);

        let reads = Client::builder()
            .default_headers(headers.clone())
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Internal(format!("failed to build http client: {e}")))?;
        let writes = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| GatewayError::Internal(format!("failed to build http client: {e}")))?;

        Ok(Self {
            base_url,
            reads,
            writes,
        })
    }

    /// Builds `{base}/api/events/{segments...}/`, percent-encoding each
    /// segment.
    fn events_url(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| GatewayError::Internal("provider url cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["api", "events"])
            .extend(segments)
            .push("");
        Ok(url)
    }

    /// Resolves a `next` cursor: absolute URLs are used verbatim, relative
    /// ones are joined onto the base URL.
    fn cursor_url(&self, cursor: &str) -> Result<Url, GatewayError> {
        let resolved = if cursor.starts_with("http://") || cursor.starts_with("https://") {
            Url::parse(cursor)
        } else {
            self.base_url.join(cursor)
        };
        resolved
            .map_err(|e| GatewayError::ProviderUnavailable(format!("bad cursor {cursor:?}: {e}")))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, GatewayError> {
        tracing::debug!(%url, "provider read");
        let response = self
            .reads
            .get(url.clone())
            .send()
            .await
            .map_err(|e| GatewayError::ProviderUnavailable(format!("GET {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::ProviderUnavailable(format!(
                "GET {url} returned {status}: {body}"
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| GatewayError::ProviderUnavailable(format!("GET {url}: invalid body: {e}")))
    }
}

#[async_trait]
impl EventsProvider for ProviderClient {
    async fn fetch_changed_since(&self, watermark: &str) -> Result<EventsPage, GatewayError> {
        let mut url = self.events_url(&[])?;
        url.query_pairs_mut().append_pair("changed_at", watermark);
        self.get_json(url).await
    }

    async fn fetch_page(&self, cursor: &str) -> Result<EventsPage, GatewayError> {
        let url = self.cursor_url(cursor)?;
        self.get_json(url).await
    }

    async fn fetch_seats(&self, event_id: &str) -> Result<Vec<String>, GatewayError> {
        let url = self.events_url(&[event_id, "seats"])?;
        let body: SeatsResponse = self.get_json(url).await?;
        Ok(body.seats)
    }

    async fn register_seat(
        &self,
        event_id: &str,
        attendee: &Attendee,
        seat: &str,
    ) -> Result<String, GatewayError> {
        let url = self.events_url(&[event_id, "register"])?;
        let payload = json!({
            "first_name": attendee.first_name,
            "last_name": attendee.last_name,
            "email": attendee.email,
            "seat": seat,
        });

        let response = self
            .writes
            .post(url.clone())
            .json(&payload)
            .send()
            .await
            .map_err(|e| GatewayError::ProviderUnavailable(format!("POST {url}: {e}")))?;

        let status = response.status();
        if status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::ProviderUnavailable(format!(
                "POST {url} returned {status}: {body}"
            )));
        }
        if status != StatusCode::OK && status != StatusCode::CREATED {
            return Err(GatewayError::RegistrationRejected {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body: RegisterResponse = response.json().await.map_err(|e| {
            GatewayError::ProviderUnavailable(format!("POST {url}: invalid body: {e}"))
        })?;
        if body.ticket_id.trim().is_empty() {
            return Err(GatewayError::RegistrationRejected {
                status: status.as_u16(),
                body: "provider returned an empty ticket id".to_string(),
            });
        }
        Ok(body.ticket_id)
    }

    async fn unregister_seat(
        &self,
        event_id: &str,
        ticket_id: &str,
    ) -> Result<bool, GatewayError> {
        let url = self.events_url(&[event_id, "unregister"])?;
        let response = self
            .writes
            .delete(url.clone())
            .json(&json!({ "ticket_id": ticket_id }))
            .send()
            .await
            .map_err(|e| GatewayError::ProviderUnavailable(format!("DELETE {url}: {e}")))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(GatewayError::UnregistrationFailed {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body: UnregisterResponse = response.json().await.map_err(|e| {
            GatewayError::ProviderUnavailable(format!("DELETE {url}: invalid body: {e}"))
        })?;
        Ok(body.success)
    }
}
