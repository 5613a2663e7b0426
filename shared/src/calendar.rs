//! Google Calendar client.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::credentials::TokenProvider;
use crate::models::CalendarEventRequest;
use crate::{Error, Result};

/// The one remote operation the webhook needs.
#[async_trait]
pub trait CalendarService: Send + Sync {
    /// Insert `event` into `calendar_id` and return the new event id.
    async fn insert_event(&self, calendar_id: &str, event: &CalendarEventRequest) -> Result<String>;
}

/// Subset of the created event resource we care about.
#[derive(Debug, Deserialize)]
struct InsertedEvent {
    id: Option<String>,
}

/// Google API error envelope: `{"error": {"code": 403, "message": "..."}}`
#[derive(Debug, Deserialize)]
struct GoogleErrorEnvelope {
    error: GoogleError,
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    message: String,
}

/// Calendar v3 REST client authenticated with a cached OAuth token.
pub struct GoogleCalendarClient {
    http_client: reqwest::Client,
    tokens: Arc<TokenProvider>,
    api_base: String,
}

impl GoogleCalendarClient {
    pub fn new(http_client: reqwest::Client, tokens: Arc<TokenProvider>, api_base: impl Into<String>) -> Self {
        Self {
            http_client,
            tokens,
            api_base: api_base.into(),
        }
    }

    fn events_url(&self, calendar_id: &str) -> String {
        format!(
            "{}/calendars/{}/events",
            self.api_base,
            urlencoding::encode(calendar_id)
        )
    }
}

#[async_trait]
impl CalendarService for GoogleCalendarClient {
    async fn insert_event(&self, calendar_id: &str, event: &CalendarEventRequest) -> Result<String> {
        let access_token = self.tokens.access_token().await?;

        let response = self
            .http_client
            .post(self.events_url(calendar_id))
            .bearer_auth(access_token)
            .json(event)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("Calendar API request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            if status == reqwest::StatusCode::UNAUTHORIZED {
                warn!("Calendar API rejected the access token, dropping cached credentials");
                self.tokens.invalidate().await;
            }

            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GoogleErrorEnvelope>(&error_text)
                .map(|envelope| envelope.error.message)
                .unwrap_or(error_text);
            return Err(Error::Upstream(format!("{}: {}", status, message)));
        }

        let inserted: InsertedEvent = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("Failed to parse calendar response: {}", e)))?;

        let event_id = inserted
            .id
            .ok_or_else(|| Error::Upstream("Calendar response has no event id".to_string()))?;

        info!("Inserted event {} into calendar {}", event_id, calendar_id);
        Ok(event_id)
    }
}
