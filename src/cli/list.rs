use anyhow::Result;

use super::ui::format_date;
use crate::db::Database;
use crate::models::Contact;

/// Contact data prepared for list display
pub struct ContactListRow {
    pub display_name: String,
    pub title_and_org: Option<String>,
    pub contact_line: Option<String>,
    pub reminder: Option<String>,
}

impl ContactListRow {
    pub fn from_contact(contact: &Contact) -> Self {
        let title_and_org = match (&contact.job_title, &contact.company) {
            (Some(t), Some(c)) => Some(format!("{} at {}", t, c)),
            (Some(t), None) => Some(t.clone()),
            (None, Some(c)) => Some(c.clone()),
            (None, None) => None,
        };
        let contact_line = contact
            .email
            .clone()
            .or_else(|| contact.primary_phone().map(String::from));
        let reminder = match (contact.reminder.label(), contact.reminder.next_reminder) {
            (Some(label), Some(next)) => Some(format!("{}, next {}", label, format_date(next))),
            (Some(label), None) => Some(label),
            _ => None,
        };

        Self {
            display_name: contact.full_name.clone(),
            title_and_org,
            contact_line,
            reminder,
        }
    }

    pub fn render(&self) -> String {
        let mut line = self.display_name.clone();
        for part in [&self.title_and_org, &self.contact_line].into_iter().flatten() {
            line.push_str(" · ");
            line.push_str(part);
        }
        if let Some(ref reminder) = self.reminder {
            line.push_str(&format!(" [{}]", reminder));
        }
        line
    }
}

fn print_rows(contacts: &[Contact]) {
    for contact in contacts {
        println!("  {}", ContactListRow::from_contact(contact).render());
    }
}

/// Execute the list command
pub fn run_list(db: &Database, page: u32, limit: u32) -> Result<()> {
    let total = db.count_contacts()?;
    if total == 0 {
        println!("No contacts yet. Add one with `keepintouch add` or `keepintouch import`.");
        return Ok(());
    }

    let limit = limit.max(1);
    let pages = total.div_ceil(limit);
    let page = page.clamp(1, pages);
    let contacts = db.list_contacts(limit, (page - 1) * limit)?;

    print_rows(&contacts);
    println!("\nPage {}/{} ({} contacts)", page, pages, total);
    Ok(())
}

/// Execute the search command
pub fn run_search(db: &Database, query: &str, limit: u32) -> Result<()> {
    let results = db.search_contacts(query.trim(), limit)?;
    if results.is_empty() {
        println!("No matches.");
        return Ok(());
    }
    print_rows(&results);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_render() {
        let mut contact = Contact::new("Jane Doe".into());
        contact.job_title = Some("CTO".into());
        contact.company = Some("Acme".into());
        contact.mobile_phone = Some("555-0100".into());
        assert_eq!(
            ContactListRow::from_contact(&contact).render(),
            "Jane Doe · CTO at Acme · 555-0100"
        );

        let bare = Contact::new("Solo".into());
        assert_eq!(ContactListRow::from_contact(&bare).render(), "Solo");
    }

    #[test]
    fn test_row_shows_reminder_label() {
        use crate::reminders::ReminderFrequency;

        let mut contact = Contact::new("Pat".into());
        contact.reminder.frequency = Some(ReminderFrequency::EveryWeek);
        let row = ContactListRow::from_contact(&contact);
        assert_eq!(row.reminder.as_deref(), Some("Every week"));
    }
}
