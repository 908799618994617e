use anyhow::{anyhow, bail, Result};
use uuid::Uuid;

use super::ui::{format_datetime, parse_datetime, require_contact};
use super::ActivityCommands;
use crate::calendar::{activity_event, CalendarClient, HttpCalendarClient};
use crate::config::Settings;
use crate::db::{ActivityFilter, Database};
use crate::models::{Activity, Contact};

pub fn run_activity(db: &Database, command: ActivityCommands) -> Result<()> {
    match command {
        ActivityCommands::Add {
            title,
            at,
            until,
            with,
            location,
            description,
            calendar,
        } => {
            let starts_at = parse_datetime(&at)?;
            let ends_at = until.as_deref().map(parse_datetime).transpose()?;
            if ends_at.is_some_and(|end| end < starts_at) {
                bail!("An activity can't end before it starts");
            }

            let participants = resolve_contacts(db, &with)?;

            let mut activity = Activity::new(title, starts_at);
            activity.ends_at = ends_at;
            activity.location = location;
            activity.description = description;
            activity.contact_ids = participants.iter().map(|c| c.id).collect();
            db.insert_activity(&activity)?;

            println!("Scheduled: {} ({})", activity.title, format_datetime(starts_at));
            println!("  id {}", activity.id);

            if calendar {
                let settings = Settings::load(db)?;
                let client = HttpCalendarClient::from_settings(&settings)?;
                let event = activity_event(&activity, &participants, &settings.calendar_time_zone);
                let event_id = client.create_event(&event)?;
                println!("Calendar event {}", event_id);
            }
        }

        ActivityCommands::List {
            from,
            to,
            search,
            with,
            limit,
        } => {
            let filter = ActivityFilter {
                from: from.as_deref().map(parse_datetime).transpose()?,
                until: to.as_deref().map(parse_datetime).transpose()?,
                text: search,
                contact_ids: resolve_contacts(db, &with)?.iter().map(|c| c.id).collect(),
                limit,
            };

            let activities = db.list_activities(&filter)?;
            if activities.is_empty() {
                println!("No activities.");
                return Ok(());
            }
            for activity in &activities {
                println!("{}", describe(db, activity)?);
            }
        }

        ActivityCommands::Delete { id } => {
            let id = Uuid::parse_str(id.trim()).map_err(|_| anyhow!("Not an activity id: {}", id))?;
            if db.delete_activity(id)? {
                println!("Deleted.");
            } else {
                println!("No activity with id {}", id);
            }
        }
    }
    Ok(())
}

fn resolve_contacts(db: &Database, identifiers: &[String]) -> Result<Vec<Contact>> {
    identifiers.iter().map(|i| require_contact(db, i)).collect()
}

/// "2026-04-03 18:00  Dinner @ Chez Panisse (Jane Doe, John Roe)"
fn describe(db: &Database, activity: &Activity) -> Result<String> {
    let mut line = format!("  {}  {}", format_datetime(activity.starts_at), activity.title);
    if let Some(ref location) = activity.location {
        line.push_str(&format!(" @ {}", location));
    }

    let mut names = Vec::new();
    for id in &activity.contact_ids {
        if let Some(contact) = db.get_contact(*id)? {
            names.push(contact.full_name);
        }
    }
    if !names.is_empty() {
        line.push_str(&format!(" ({})", names.join(", ")));
    }
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_describe() {
        let db = Database::open_memory().unwrap();
        let jane = Contact::new("Jane Doe".into());
        db.insert_contact(&jane).unwrap();

        let starts = Utc.with_ymd_and_hms(2026, 4, 3, 18, 0, 0).unwrap();
        let mut activity = Activity::new("Dinner".into(), starts);
        activity.location = Some("Chez Panisse".into());
        activity.contact_ids = vec![jane.id];

        let line = describe(&db, &activity).unwrap();
        assert!(line.ends_with("Dinner @ Chez Panisse (Jane Doe)"));
    }

    #[test]
    fn test_resolve_contacts_fails_on_unknown() {
        let db = Database::open_memory().unwrap();
        assert!(resolve_contacts(&db, &["Nobody Here".to_string()]).is_err());
        assert!(resolve_contacts(&db, &[]).unwrap().is_empty());
    }
}
