use anyhow::{anyhow, bail, Result};
use chrono::{Local, NaiveTime, TimeZone, Utc};

use super::add::frequency_labels;
use super::calendar::push_reminder;
use super::ui::{format_date, parse_date, require_contact};
use super::{CustomArgs, RemindCommands};
use crate::config::Settings;
use crate::db::Database;
use crate::models::{Contact, ReminderStatus};
use crate::reminders::{
    compute_next_occurrences, describe_recurrence, describe_recurrence_end, CustomRecurrence,
    RecurrenceEnds, RecurrenceUnit, ReminderFrequency, REMINDER_HOUR,
};

impl CustomArgs {
    fn is_empty(&self) -> bool {
        self.every.is_none() && self.unit.is_none() && self.until.is_none() && self.times.is_none()
    }

    /// Build the recurrence these options describe, or `None` if none were given.
    pub fn to_recurrence(&self) -> Result<Option<CustomRecurrence>> {
        if self.is_empty() {
            return Ok(None);
        }

        let unit_label = self
            .unit
            .as_deref()
            .ok_or_else(|| anyhow!("--unit is required (day, week, month or year)"))?;
        let unit = RecurrenceUnit::parse(unit_label)
            .ok_or_else(|| anyhow!("Unknown unit '{}'. Use day, week, month or year", unit_label))?;

        let mut recurrence = CustomRecurrence::new(self.every.unwrap_or(1), unit);
        if let Some(ref until) = self.until {
            recurrence = recurrence.ending_on(parse_date(until)?);
        } else if let Some(times) = self.times {
            recurrence = recurrence.ending_after(times);
        }
        recurrence.validate()?;
        Ok(Some(recurrence))
    }
}

fn parse_frequency(label: &str) -> Result<ReminderFrequency> {
    ReminderFrequency::parse(label).ok_or_else(|| {
        anyhow!("Unknown frequency '{}'. Use one of: {}", label, frequency_labels())
    })
}

/// "Jane Doe - Monthly - in 3 days"
fn describe_contact(contact: &Contact, mark_overdue: bool) -> String {
    let label = contact.reminder.label().unwrap_or_else(|| "none".into());
    let when = contact
        .reminder
        .next_reminder
        .map(format_date)
        .unwrap_or_else(|| "not scheduled".into());
    let marker = if mark_overdue && contact.reminder.is_due(Utc::now()) {
        "[!]"
    } else {
        "[ ]"
    };
    format!("  {} {} - {} - {}", marker, contact.full_name, label, when)
}

pub fn run_remind(db: &Database, command: RemindCommands) -> Result<()> {
    match command {
        RemindCommands::Set {
            identifier,
            frequency,
            custom,
        } => {
            let frequency = parse_frequency(&frequency)?;
            let recurrence = custom.to_recurrence()?;
            match (frequency, &recurrence) {
                (ReminderFrequency::Custom, None) => {
                    bail!("Custom reminders need --every N and --unit")
                }
                (ReminderFrequency::Custom, Some(_)) | (_, None) => {}
                (_, Some(_)) => eprintln!("Ignoring custom options for {}", frequency),
            }

            let contact = require_contact(db, &identifier)?;
            let state = db
                .set_reminder(contact.id, Some(frequency), recurrence, Utc::now())?
                .ok_or_else(|| anyhow!("Not found: {}", identifier))?;

            let label = state.label().unwrap_or_else(|| frequency.to_string());
            match state.next_reminder {
                Some(next) => println!("{} - {} - next {}", contact.full_name, label, format_date(next)),
                None => println!("{} - {}", contact.full_name, label),
            }
            if let Some(ref custom) = state.custom_recurrence {
                if custom.ends != RecurrenceEnds::Never {
                    println!("  ends {}", describe_recurrence_end(custom));
                }
            }

            let settings = Settings::load(db)?;
            push_reminder(db, &settings, contact.id);
        }

        RemindCommands::Done { identifier } => {
            let contact = require_contact(db, &identifier)?;
            if !contact.reminder.is_scheduled() {
                println!("{} has no reminder.", contact.full_name);
            }

            let change = db
                .set_reminder_status(contact.id, ReminderStatus::Completed, Utc::now())?
                .ok_or_else(|| anyhow!("Not found: {}", identifier))?;

            if change.series_finished {
                println!("Done: {} (reminder series finished)", contact.full_name);
            } else if let Some(next) = change.next_reminder {
                println!("Done: {} - next {}", contact.full_name, format_date(next));
            } else {
                println!("Done: {}", contact.full_name);
            }

            if contact.reminder.is_scheduled() {
                let settings = Settings::load(db)?;
                push_reminder(db, &settings, contact.id);
            }
        }

        RemindCommands::Skip { identifier } => {
            set_status(db, &identifier, ReminderStatus::Skipped)?;
        }

        RemindCommands::Pending { identifier } => {
            set_status(db, &identifier, ReminderStatus::Pending)?;
        }

        RemindCommands::Clear { identifier } => {
            let contact = require_contact(db, &identifier)?;
            db.clear_reminder(contact.id)?;
            println!("Cleared: {}", contact.full_name);

            let settings = Settings::load(db)?;
            push_reminder(db, &settings, contact.id);
        }

        RemindCommands::Due => {
            let due = db.due_reminders(Utc::now())?;
            if due.is_empty() {
                println!("No reminders due.");
            } else {
                println!("Due ({}):\n", due.len());
                for contact in &due {
                    println!("{}", describe_contact(contact, false));
                }
            }
        }

        RemindCommands::List => {
            let scheduled = db.scheduled_reminders()?;
            if scheduled.is_empty() {
                println!("No reminders scheduled.");
            } else {
                println!("All reminders ({}):\n", scheduled.len());
                for contact in &scheduled {
                    println!("{}", describe_contact(contact, true));
                }
            }
        }

        RemindCommands::Preview { custom, from, count } => {
            let recurrence = custom
                .to_recurrence()?
                .ok_or_else(|| anyhow!("Give at least --unit (and usually --every)"))?;
            for line in preview_lines(&recurrence, from.as_deref(), count)? {
                println!("{}", line);
            }
        }
    }
    Ok(())
}

fn set_status(db: &Database, identifier: &str, status: ReminderStatus) -> Result<()> {
    let contact = require_contact(db, identifier)?;
    db.set_reminder_status(contact.id, status, Utc::now())?
        .ok_or_else(|| anyhow!("Not found: {}", identifier))?;
    println!("{}: {}", contact.full_name, status.as_str());
    Ok(())
}

/// Summary line, end condition, then the next `count` dates.
fn preview_lines(recurrence: &CustomRecurrence, from: Option<&str>, count: usize) -> Result<Vec<String>> {
    let anchor = match from {
        Some(s) => {
            let noon = NaiveTime::from_hms_opt(REMINDER_HOUR, 0, 0)
                .ok_or_else(|| anyhow!("Invalid time"))?;
            let naive = parse_date(s)?.and_time(noon);
            Local
                .from_local_datetime(&naive)
                .earliest()
                .ok_or_else(|| anyhow!("Invalid local time: {}", naive))?
        }
        None => Local::now(),
    };

    let mut lines = vec![describe_recurrence(recurrence)];
    let end = describe_recurrence_end(recurrence);
    if !end.is_empty() {
        lines[0] = format!("{}, {}", lines[0], end);
    }
    for date in compute_next_occurrences(recurrence, &anchor, count) {
        lines.push(format!("  {}", date.format("%a %b %-d, %Y")));
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn args(every: Option<u32>, unit: Option<&str>) -> CustomArgs {
        CustomArgs {
            every,
            unit: unit.map(String::from),
            until: None,
            times: None,
        }
    }

    #[test]
    fn test_to_recurrence() {
        assert!(CustomArgs::default().to_recurrence().unwrap().is_none());

        let rec = args(Some(3), Some("weeks")).to_recurrence().unwrap().unwrap();
        assert_eq!(rec.interval, 3);
        assert_eq!(rec.unit, RecurrenceUnit::Week);
        assert_eq!(rec.ends, RecurrenceEnds::Never);

        let mut until = args(Some(1), Some("month"));
        until.until = Some("2026-12-31".into());
        let rec = until.to_recurrence().unwrap().unwrap();
        assert_eq!(rec.ends, RecurrenceEnds::On);
        assert_eq!(rec.end_date, NaiveDate::from_ymd_opt(2026, 12, 31));

        let mut times = args(None, Some("day"));
        times.times = Some(5);
        let rec = times.to_recurrence().unwrap().unwrap();
        assert_eq!(rec.interval, 1);
        assert_eq!(rec.occurrences, Some(5));
    }

    #[test]
    fn test_to_recurrence_errors() {
        assert!(args(Some(2), None).to_recurrence().is_err());
        assert!(args(Some(2), Some("fortnight")).to_recurrence().is_err());
        assert!(args(Some(0), Some("day")).to_recurrence().is_err());

        let mut zero_times = args(Some(1), Some("day"));
        zero_times.times = Some(0);
        assert!(zero_times.to_recurrence().is_err());
    }

    #[test]
    fn test_preview_lines() {
        let rec = CustomRecurrence::new(2, RecurrenceUnit::Week).ending_after(4);
        let lines = preview_lines(&rec, Some("2026-03-02"), 3).unwrap();
        assert_eq!(lines[0], "Every 2 weeks, after 4 occurrences");
        assert_eq!(
            &lines[1..],
            &["  Mon Mar 16, 2026", "  Mon Mar 30, 2026", "  Mon Apr 13, 2026"]
        );
    }

    #[test]
    fn test_parse_frequency() {
        assert_eq!(parse_frequency("Every 2 months").unwrap(), ReminderFrequency::EveryTwoMonths);
        assert!(parse_frequency("yearly").is_err());
    }
}
