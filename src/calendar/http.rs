//! HTTP client for the hosted calendar function.

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use super::{CalendarClient, CalendarError, CalendarEvent, CalendarRequest};
use crate::config::Settings;

const REQUEST_TIMEOUT_SECS: u64 = 15;

pub struct HttpCalendarClient {
    client: Client,
    url: Url,
    token: Option<String>,
}

impl HttpCalendarClient {
    pub fn new(url: Url, token: Option<String>) -> Result<Self, CalendarError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| CalendarError::Request(e.to_string()))?;

        Ok(Self { client, url, token })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, CalendarError> {
        let url = settings
            .calendar_url
            .clone()
            .ok_or(CalendarError::NotConfigured)?;
        Self::new(url, settings.calendar_token.clone())
    }

    /// POST a request and return the raw response body.
    fn send(&self, request: &CalendarRequest) -> Result<String, CalendarError> {
        log::debug!("calendar {} -> {}", request.action().as_str(), self.url);

        let mut builder = self
            .client
            .post(self.url.clone())
            .header("User-Agent", concat!("keepintouch/", env!("CARGO_PKG_VERSION")))
            .json(request);
        if let Some(ref token) = self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .map_err(|e| CalendarError::Request(e.to_string()))?;

        let status = response.status();
        let body = response.text().unwrap_or_default();
        if !status.is_success() {
            return Err(CalendarError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    fn send_json<R: DeserializeOwned>(&self, request: &CalendarRequest) -> Result<R, CalendarError> {
        let body = self.send(request)?;
        serde_json::from_str(&body).map_err(|e| CalendarError::Response(e.to_string()))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedResponse {
    #[serde(alias = "eventId")]
    id: String,
}

#[derive(Deserialize)]
struct EventsResponse {
    #[serde(alias = "items", default)]
    events: Vec<CalendarEvent>,
}

#[derive(Deserialize)]
struct DeletedResponse {
    #[serde(default)]
    deleted: u32,
}

impl CalendarClient for HttpCalendarClient {
    fn create_event(&self, event: &CalendarEvent) -> Result<String, CalendarError> {
        let created: CreatedResponse = self.send_json(&CalendarRequest::CreateEvent { event })?;
        Ok(created.id)
    }

    fn delete_event(&self, event_id: &str) -> Result<(), CalendarError> {
        self.send(&CalendarRequest::DeleteEvent { event_id })?;
        Ok(())
    }

    fn list_events(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, CalendarError> {
        let listed: EventsResponse = self.send_json(&CalendarRequest::ListEvents {
            time_min: from.to_rfc3339_opts(SecondsFormat::Secs, true),
            time_max: to.to_rfc3339_opts(SecondsFormat::Secs, true),
        })?;
        Ok(listed.events)
    }

    fn delete_existing_reminders(&self, contact_name: &str) -> Result<u32, CalendarError> {
        let body = self.send(&CalendarRequest::DeleteExistingReminders { contact_name })?;
        if body.trim().is_empty() {
            return Ok(0);
        }
        let deleted: DeletedResponse =
            serde_json::from_str(&body).map_err(|e| CalendarError::Response(e.to_string()))?;
        Ok(deleted.deleted)
    }
}
