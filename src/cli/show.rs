use anyhow::Result;

use super::ui::{confirm, find_contact_by_identifier, format_date, format_datetime};
use crate::db::{ActivityFilter, Database};
use crate::models::Contact;
use crate::reminders::{describe_recurrence_end, ReminderFrequency};

const RECENT_ACTIVITIES: u32 = 5;

/// Execute the show command
pub fn run_show(db: &Database, identifier: &str) -> Result<()> {
    let Some(contact) = find_contact_by_identifier(db, identifier)? else {
        println!("No matches.");
        return Ok(());
    };

    for line in detail_lines(&contact) {
        println!("{}", line);
    }

    let activities = db.list_activities(&ActivityFilter {
        contact_ids: vec![contact.id],
        limit: Some(RECENT_ACTIVITIES),
        ..Default::default()
    })?;
    if !activities.is_empty() {
        println!("\nactivities");
        for activity in &activities {
            println!("  {}  {}", format_datetime(activity.starts_at), activity.title);
        }
    }
    Ok(())
}

/// Execute the delete command
pub fn run_delete(db: &Database, identifier: &str, yes: bool) -> Result<()> {
    let Some(contact) = find_contact_by_identifier(db, identifier)? else {
        println!("No matches.");
        return Ok(());
    };

    if !yes && !confirm(&format!("Delete {}?", contact.full_name))? {
        println!("Cancelled.");
        return Ok(());
    }

    if db.delete_contact(contact.id)? {
        println!("Deleted.");
    }
    Ok(())
}

fn detail_lines(contact: &Contact) -> Vec<String> {
    let mut lines = vec![contact.full_name.clone()];
    let mut field = |label: &str, value: &Option<String>| {
        if let Some(v) = value {
            lines.push(format!("  {:<10} {}", label, v));
        }
    };

    field("title", &contact.job_title);
    field("company", &contact.company);
    field("email", &contact.email);
    field("mobile", &contact.mobile_phone);
    field("work", &contact.business_phone);
    field("linkedin", &contact.linkedin_url);
    field("notes", &contact.notes);

    let reminder = &contact.reminder;
    if let Some(label) = reminder.label() {
        let mut line = format!("  {:<10} {}", "reminder", label);
        if reminder.frequency == Some(ReminderFrequency::Custom) {
            if let Some(ref custom) = reminder.custom_recurrence {
                let end = describe_recurrence_end(custom);
                if !end.is_empty() {
                    line.push_str(&format!(", {}", end));
                }
            }
        }
        lines.push(line);
        if let Some(next) = reminder.next_reminder {
            lines.push(format!(
                "  {:<10} {} ({})",
                "next",
                format_date(next),
                reminder.status.as_str()
            ));
        }
    }
    if let Some(last) = contact.last_contacted {
        lines.push(format!("  {:<10} {}", "last seen", format_datetime(last)));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reminders::{CustomRecurrence, RecurrenceUnit};

    #[test]
    fn test_detail_lines() {
        let mut contact = Contact::new("Jane Doe".into());
        contact.email = Some("jane@x.com".into());
        contact.reminder.frequency = Some(ReminderFrequency::Custom);
        contact.reminder.custom_recurrence =
            Some(CustomRecurrence::new(3, RecurrenceUnit::Week).ending_after(2));

        let lines = detail_lines(&contact);
        assert_eq!(lines[0], "Jane Doe");
        assert!(lines.iter().any(|l| l.contains("jane@x.com")));
        assert!(lines
            .iter()
            .any(|l| l.contains("Every 3 weeks, after 2 occurrences")));
        assert!(!lines.iter().any(|l| l.contains("company")));
    }
}
