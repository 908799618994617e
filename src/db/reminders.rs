//! Reminder scheduling against the store.
//!
//! Status changes go through [`Database::set_reminder_status`], which holds
//! the write lock from the read of the old anchor to the write of the new
//! one, so two clients completing the same reminder advance it twice in
//! sequence instead of both advancing from the same stale date.

use anyhow::{bail, Result};
use chrono::{DateTime, Local, Utc};
use rusqlite::params;
use uuid::Uuid;

use super::{format_ts, parse_ts, Database};
use crate::models::{Contact, ReminderState, ReminderStatus};
use crate::reminders::{
    compute_next_reminder, next_custom_reminder, CustomRecurrence, ReminderFrequency,
};

/// Outcome of a reminder status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub status: ReminderStatus,
    pub previous_reminder: Option<DateTime<Utc>>,
    pub next_reminder: Option<DateTime<Utc>>,
    /// A custom series hit its end condition and the reminder was cleared.
    pub series_finished: bool,
}

struct StoredReminder {
    frequency: Option<String>,
    next_reminder: Option<String>,
    custom_recurrence: Option<String>,
    occurrences_completed: u32,
}

impl Database {
    /// Start (or restart) a reminder for a contact, first due one period from `now`.
    ///
    /// `custom` is required for `Custom` and ignored otherwise. Passing `None`
    /// as the frequency clears the reminder. Returns `None` if the contact
    /// doesn't exist.
    pub fn set_reminder(
        &self,
        id: Uuid,
        frequency: Option<ReminderFrequency>,
        custom: Option<CustomRecurrence>,
        now: DateTime<Utc>,
    ) -> Result<Option<ReminderState>> {
        let Some(frequency) = frequency else {
            return Ok(self.clear_reminder(id)?.then(ReminderState::default));
        };

        let anchor = now.with_timezone(&Local);
        let (next, custom) = match frequency {
            ReminderFrequency::Custom => {
                let Some(custom) = custom else {
                    bail!("a custom reminder needs an interval and unit");
                };
                custom.validate()?;
                let Some(next) = next_custom_reminder(&custom, &anchor, 0) else {
                    bail!("recurrence ends before its first reminder");
                };
                (next, Some(custom))
            }
            fixed => (fixed.next_after(&anchor), None),
        };
        let next = next.with_timezone(&Utc);

        let custom_json = custom.as_ref().map(serde_json::to_string).transpose()?;
        let rows = self.conn.execute(
            r#"UPDATE contacts SET
                reminder_frequency = ?, next_reminder = ?, reminder_status = 'pending',
                custom_recurrence = ?, occurrences_completed = 0, updated_at = ?
               WHERE id = ?"#,
            params![
                frequency.as_str(),
                format_ts(&next),
                custom_json,
                format_ts(&now),
                id.to_string(),
            ],
        )?;
        if rows == 0 {
            return Ok(None);
        }

        log::debug!("reminder for {} set to {} (next {})", id, frequency, next);
        Ok(Some(ReminderState {
            frequency: Some(frequency),
            next_reminder: Some(next),
            status: ReminderStatus::Pending,
            custom_recurrence: custom,
            occurrences_completed: 0,
        }))
    }

    /// Remove a contact's reminder entirely.
    pub fn clear_reminder(&self, id: Uuid) -> Result<bool> {
        let rows = self.conn.execute(
            r#"UPDATE contacts SET
                reminder_frequency = NULL, next_reminder = NULL, reminder_status = 'pending',
                custom_recurrence = NULL, occurrences_completed = 0, updated_at = ?
               WHERE id = ?"#,
            params![format_ts(&Utc::now()), id.to_string()],
        )?;
        Ok(rows > 0)
    }

    /// Change a reminder's status.
    ///
    /// `Completed` moves `next_reminder` one period past its current value (or
    /// past `now` if unset) and stamps `last_contacted = now`. `Pending` and
    /// `Skipped` only change the status. Returns `None` if the contact doesn't
    /// exist.
    pub fn set_reminder_status(
        &self,
        id: Uuid,
        status: ReminderStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<StatusChange>> {
        self.write_transaction(|| self.apply_reminder_status(id, status, now))
    }

    fn apply_reminder_status(
        &self,
        id: Uuid,
        status: ReminderStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<StatusChange>> {
        let stored = self.conn.query_row(
            r#"SELECT reminder_frequency, next_reminder, custom_recurrence, occurrences_completed
               FROM contacts WHERE id = ?"#,
            [id.to_string()],
            |row| {
                Ok(StoredReminder {
                    frequency: row.get(0)?,
                    next_reminder: row.get(1)?,
                    custom_recurrence: row.get(2)?,
                    occurrences_completed: row.get(3)?,
                })
            },
        );
        let stored = match stored {
            Ok(s) => s,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let previous = stored.next_reminder.as_deref().and_then(parse_ts);

        if status != ReminderStatus::Completed {
            self.conn.execute(
                "UPDATE contacts SET reminder_status = ?, updated_at = ? WHERE id = ?",
                params![status.as_str(), format_ts(&now), id.to_string()],
            )?;
            log::debug!("reminder for {} marked {}", id, status.as_str());
            return Ok(Some(StatusChange {
                status,
                previous_reminder: previous,
                next_reminder: previous,
                series_finished: false,
            }));
        }

        let completed = stored.occurrences_completed.saturating_add(1);
        let anchor = previous.unwrap_or(now).with_timezone(&Local);
        let next = match stored.frequency.as_deref() {
            None => None,
            Some(label) => match ReminderFrequency::from_label(label) {
                Some(ReminderFrequency::Custom) => {
                    match stored
                        .custom_recurrence
                        .as_deref()
                        .and_then(|json| serde_json::from_str::<CustomRecurrence>(json).ok())
                    {
                        Some(custom) => next_custom_reminder(&custom, &anchor, completed),
                        None => Some(anchor),
                    }
                }
                _ => Some(compute_next_reminder(label, &anchor)),
            },
        }
        .map(|dt| dt.with_timezone(&Utc));

        let series_finished = stored.frequency.is_some() && next.is_none();

        // The guard on next_reminder turns a lost update into an error instead
        // of silently advancing from a stale anchor.
        let rows = if series_finished {
            self.conn.execute(
                r#"UPDATE contacts SET
                    reminder_frequency = NULL, next_reminder = NULL, custom_recurrence = NULL,
                    occurrences_completed = 0, reminder_status = 'completed',
                    last_contacted = ?1, updated_at = ?1
                   WHERE id = ?2 AND next_reminder IS ?3"#,
                params![format_ts(&now), id.to_string(), stored.next_reminder],
            )?
        } else {
            self.conn.execute(
                r#"UPDATE contacts SET
                    next_reminder = ?1, occurrences_completed = ?2, reminder_status = 'completed',
                    last_contacted = ?3, updated_at = ?3
                   WHERE id = ?4 AND next_reminder IS ?5"#,
                params![
                    next.as_ref().map(format_ts),
                    if stored.frequency.is_some() { completed } else { 0 },
                    format_ts(&now),
                    id.to_string(),
                    stored.next_reminder,
                ],
            )?
        };
        if rows == 0 {
            bail!("reminder for {} changed while it was being completed", id);
        }

        log::debug!(
            "reminder for {} completed: {:?} -> {:?}{}",
            id,
            previous,
            next,
            if series_finished { " (series finished)" } else { "" }
        );
        Ok(Some(StatusChange {
            status,
            previous_reminder: previous,
            next_reminder: next,
            series_finished,
        }))
    }

    /// Contacts whose next reminder is at or before `now`, soonest first.
    pub fn due_reminders(&self, now: DateTime<Utc>) -> Result<Vec<Contact>> {
        let mut stmt = self.conn.prepare(
            r#"SELECT * FROM contacts
               WHERE next_reminder IS NOT NULL AND next_reminder <= ?
               ORDER BY next_reminder ASC"#,
        )?;

        let contacts = stmt
            .query_map([format_ts(&now)], Self::row_to_contact)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(contacts)
    }

    /// Every contact with a scheduled reminder, soonest first.
    pub fn scheduled_reminders(&self) -> Result<Vec<Contact>> {
        let mut stmt = self.conn.prepare(
            r#"SELECT * FROM contacts
               WHERE next_reminder IS NOT NULL
               ORDER BY next_reminder ASC"#,
        )?;

        let contacts = stmt
            .query_map([], Self::row_to_contact)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(contacts)
    }

    pub fn set_calendar_event_id(&self, id: Uuid, event_id: Option<&str>) -> Result<bool> {
        let rows = self.conn.execute(
            "UPDATE contacts SET calendar_event_id = ? WHERE id = ?",
            params![event_id, id.to_string()],
        )?;
        Ok(rows > 0)
    }

    pub fn get_calendar_event_id(&self, id: Uuid) -> Result<Option<String>> {
        let result = self.conn.query_row(
            "SELECT calendar_event_id FROM contacts WHERE id = ?",
            [id.to_string()],
            |row| row.get::<_, Option<String>>(0),
        );

        match result {
            Ok(event_id) => Ok(event_id),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
