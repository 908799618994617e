//! Reminder scheduling.
//!
//! Fixed cadences (`Every week` .. `Every 3 months`) and user-defined custom
//! recurrences. Everything here is pure date arithmetic; persisting the
//! result and the status workflow live in `db::reminders`.

mod custom;
mod frequency;

pub use custom::{
    compute_next_occurrences, describe_recurrence, describe_recurrence_end, next_custom_reminder,
    CustomRecurrence, RecurrenceEnds, RecurrenceError, RecurrenceUnit, DEFAULT_PREVIEW_COUNT,
};
pub use frequency::{compute_next_reminder, ReminderFrequency, REMINDER_HOUR};

use chrono::{DateTime, TimeZone};

/// Next reminder for a frequency plus optional custom schedule.
///
/// Fixed frequencies always produce a date. `Custom` produces `None` once the
/// series has ended (or if no schedule is attached), which callers treat as
/// "reminder finished".
pub fn next_reminder_for<Tz: TimeZone>(
    frequency: ReminderFrequency,
    custom: Option<&CustomRecurrence>,
    anchor: &DateTime<Tz>,
    completed: u32,
) -> Option<DateTime<Tz>> {
    match frequency {
        ReminderFrequency::Custom => custom.and_then(|c| next_custom_reminder(c, anchor, completed)),
        fixed => Some(fixed.next_after(anchor)),
    }
}
