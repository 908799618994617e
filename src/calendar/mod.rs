//! Calendar collaborator
//!
//! Reminders and activities can be mirrored to an external calendar. The
//! calendar lives behind a hosted function that accepts `{ action, ... }`
//! JSON; this module owns the payload shapes and the client trait, and
//! `http` talks to the function.

mod http;

pub use http::HttpCalendarClient;

use anyhow::Result;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::Database;
use crate::models::{Activity, Contact};

pub const REMINDER_TITLE_PREFIX: &str = "Keep in touch: ";
pub const REMINDER_EVENT_MINUTES: i64 = 30;
pub const DEFAULT_ACTIVITY_MINUTES: i64 = 60;
const POPUP_MINUTES_BEFORE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CalendarAction {
    CreateEvent,
    DeleteEvent,
    ListEvents,
    DeleteExistingReminders,
}

impl CalendarAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateEvent => "createEvent",
            Self::DeleteEvent => "deleteEvent",
            Self::ListEvents => "listEvents",
            Self::DeleteExistingReminders => "deleteExistingReminders",
        }
    }
}

/// Body posted to the calendar function, tagged with its action.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum CalendarRequest<'a> {
    CreateEvent {
        event: &'a CalendarEvent,
    },
    #[serde(rename_all = "camelCase")]
    DeleteEvent {
        event_id: &'a str,
    },
    #[serde(rename_all = "camelCase")]
    ListEvents {
        time_min: String,
        time_max: String,
    },
    #[serde(rename_all = "camelCase")]
    DeleteExistingReminders {
        contact_name: &'a str,
    },
}

impl CalendarRequest<'_> {
    pub fn action(&self) -> CalendarAction {
        match self {
            Self::CreateEvent { .. } => CalendarAction::CreateEvent,
            Self::DeleteEvent { .. } => CalendarAction::DeleteEvent,
            Self::ListEvents { .. } => CalendarAction::ListEvents,
            Self::DeleteExistingReminders { .. } => CalendarAction::DeleteExistingReminders,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    /// RFC 3339 instant
    pub date_time: String,
    pub time_zone: String,
}

impl EventTime {
    pub fn new(at: DateTime<Utc>, time_zone: &str) -> Self {
        Self {
            date_time: at.to_rfc3339_opts(SecondsFormat::Secs, true),
            time_zone: time_zone.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderOverride {
    /// "popup" or "email"
    pub method: String,
    pub minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventReminders {
    pub use_default: bool,
    #[serde(default)]
    pub overrides: Vec<ReminderOverride>,
}

impl Default for EventReminders {
    fn default() -> Self {
        Self {
            use_default: false,
            overrides: vec![ReminderOverride {
                method: "popup".to_string(),
                minutes: POPUP_MINUTES_BEFORE,
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "summary")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub start: EventTime,
    pub end: EventTime,
    #[serde(default)]
    pub attendees: Vec<Attendee>,
    #[serde(default)]
    pub reminders: EventReminders,
}

#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("calendar is not configured (set calendar_function_url)")]
    NotConfigured,

    #[error("calendar request failed: {0}")]
    Request(String),

    #[error("calendar service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected calendar response: {0}")]
    Response(String),
}

/// Operations the calendar function supports.
pub trait CalendarClient {
    /// Create an event, returning the id the calendar assigned.
    fn create_event(&self, event: &CalendarEvent) -> Result<String, CalendarError>;

    fn delete_event(&self, event_id: &str) -> Result<(), CalendarError>;

    fn list_events(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, CalendarError>;

    /// Remove every reminder event previously created for a contact.
    /// Returns how many were removed.
    fn delete_existing_reminders(&self, contact_name: &str) -> Result<u32, CalendarError>;
}

/// The calendar event for a contact's next reminder, if one is scheduled.
pub fn reminder_event(contact: &Contact, time_zone: &str) -> Option<CalendarEvent> {
    let start = contact.reminder.next_reminder?;
    let end = start + Duration::minutes(REMINDER_EVENT_MINUTES);

    let mut lines = Vec::new();
    if let Some(label) = contact.reminder.label() {
        lines.push(format!("Reminder: {}", label));
    }
    if let Some(phone) = contact.primary_phone() {
        lines.push(format!("Phone: {}", phone));
    }
    if let Some(ref email) = contact.email {
        lines.push(format!("Email: {}", email));
    }

    Some(CalendarEvent {
        id: None,
        title: format!("{}{}", REMINDER_TITLE_PREFIX, contact.full_name),
        description: (!lines.is_empty()).then(|| lines.join("\n")),
        location: None,
        start: EventTime::new(start, time_zone),
        end: EventTime::new(end, time_zone),
        attendees: Vec::new(),
        reminders: EventReminders::default(),
    })
}

/// The calendar event for an activity. Participants with an email address
/// are invited.
pub fn activity_event(activity: &Activity, participants: &[Contact], time_zone: &str) -> CalendarEvent {
    let end = activity
        .ends_at
        .unwrap_or(activity.starts_at + Duration::minutes(DEFAULT_ACTIVITY_MINUTES));

    let attendees = participants
        .iter()
        .filter_map(|c| {
            c.email.as_ref().map(|email| Attendee {
                email: email.clone(),
                display_name: Some(c.full_name.clone()),
            })
        })
        .collect();

    CalendarEvent {
        id: None,
        title: activity.title.clone(),
        description: activity.description.clone(),
        location: activity.location.clone(),
        start: EventTime::new(activity.starts_at, time_zone),
        end: EventTime::new(end, time_zone),
        attendees,
        reminders: EventReminders::default(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Created(String),
    Removed,
    Unchanged,
}

/// Make the calendar match a contact's reminder: drop the event created
/// last time, then create one for the current next reminder.
pub fn sync_contact_reminder(
    db: &Database,
    client: &dyn CalendarClient,
    contact: &Contact,
    time_zone: &str,
) -> Result<SyncOutcome> {
    let previous = db.get_calendar_event_id(contact.id)?;
    if let Some(ref event_id) = previous {
        if let Err(e) = client.delete_event(event_id) {
            // The user may have deleted it by hand already.
            log::warn!("could not delete calendar event {}: {}", event_id, e);
        }
    }

    match reminder_event(contact, time_zone) {
        Some(event) => {
            let event_id = client.create_event(&event)?;
            log::debug!("calendar event {} for {}", event_id, contact.full_name);
            db.set_calendar_event_id(contact.id, Some(&event_id))?;
            Ok(SyncOutcome::Created(event_id))
        }
        None if previous.is_some() => {
            db.set_calendar_event_id(contact.id, None)?;
            Ok(SyncOutcome::Removed)
        }
        None => Ok(SyncOutcome::Unchanged),
    }
}
