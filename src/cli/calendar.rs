use anyhow::Result;
use chrono::{Duration, Utc};
use uuid::Uuid;

use super::ui::{format_datetime, require_contact};
use super::CalendarCommands;
use crate::calendar::{sync_contact_reminder, CalendarClient, HttpCalendarClient, SyncOutcome};
use crate::config::Settings;
use crate::db::Database;

pub fn run_calendar(db: &Database, command: CalendarCommands) -> Result<()> {
    let settings = Settings::load(db)?;
    let client = HttpCalendarClient::from_settings(&settings)?;

    match command {
        CalendarCommands::Sync => {
            let contacts = db.scheduled_reminders()?;
            if contacts.is_empty() {
                println!("No reminders scheduled.");
                return Ok(());
            }

            let mut synced = 0;
            let mut failed = 0;
            for contact in &contacts {
                match sync_contact_reminder(db, &client, contact, &settings.calendar_time_zone) {
                    Ok(_) => synced += 1,
                    Err(e) => {
                        eprintln!("{}: {}", contact.full_name, e);
                        failed += 1;
                    }
                }
            }

            println!("Synced {} reminders", synced);
            if failed > 0 {
                println!("Errors: {}", failed);
            }
        }

        CalendarCommands::Clear { identifier } => {
            let contact = require_contact(db, &identifier)?;
            let removed = client.delete_existing_reminders(&contact.full_name)?;
            db.set_calendar_event_id(contact.id, None)?;
            println!("Removed {} events for {}", removed, contact.full_name);
        }

        CalendarCommands::Events { days } => {
            let now = Utc::now();
            let events = client.list_events(now, now + Duration::days(days.max(1)))?;
            if events.is_empty() {
                println!("No events in the next {} days.", days);
            }
            for event in &events {
                let when = chrono::DateTime::parse_from_rfc3339(&event.start.date_time)
                    .map(|dt| format_datetime(dt.with_timezone(&Utc)))
                    .unwrap_or_else(|_| event.start.date_time.clone());
                println!("  {}  {}", when, event.title);
            }
        }
    }
    Ok(())
}

/// Bring the calendar in line with a contact's reminder, if a calendar is
/// configured. Failures are reported but never fail the calling command.
pub(crate) fn push_reminder(db: &Database, settings: &Settings, contact_id: Uuid) {
    if !settings.calendar_configured() {
        return;
    }
    if let Err(e) = try_push_reminder(db, settings, contact_id) {
        eprintln!("Warning: calendar not updated: {}", e);
    }
}

fn try_push_reminder(db: &Database, settings: &Settings, contact_id: Uuid) -> Result<()> {
    let Some(contact) = db.get_contact(contact_id)? else {
        return Ok(());
    };
    let client = HttpCalendarClient::from_settings(settings)?;
    match sync_contact_reminder(db, &client, &contact, &settings.calendar_time_zone)? {
        SyncOutcome::Created(id) => log::debug!("calendar event {} created", id),
        SyncOutcome::Removed => log::debug!("calendar event removed for {}", contact.full_name),
        SyncOutcome::Unchanged => {}
    }
    Ok(())
}
