use anyhow::{anyhow, bail, Result};
use chrono::Utc;
use inquire::Confirm;

use super::ui::{is_valid_email, minimal_render_config, require_contact, text_input};
use super::{AddArgs, ContactFields, EditArgs};
use crate::config::Settings;
use crate::db::Database;
use crate::models::Contact;
use crate::reminders::ReminderFrequency;

/// Execute the add command
pub fn run_add(db: &Database, args: AddArgs) -> Result<()> {
    let name = match args.name {
        Some(name) => name,
        None => match text_input("name:", None)? {
            Some(name) => name,
            None => {
                println!("Cancelled.");
                return Ok(());
            }
        },
    };

    let settings = Settings::load(db)?;
    let frequency = initial_frequency(args.remind.as_deref(), &settings)?;

    let mut contact = Contact::new(String::new());
    apply_fields(&mut contact, Some(name), args.fields)?;

    if let Some(duplicate) = check_duplicate(db, &contact)? {
        println!("Warning: Similar contact exists:");
        println!("  {}", duplicate);
        println!();

        let confirmed = Confirm::new("Continue anyway?")
            .with_render_config(minimal_render_config())
            .with_default(false)
            .prompt()
            .unwrap_or(false);

        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    db.insert_contact(&contact)?;
    println!("Created: {}", contact.full_name);

    if let Some(frequency) = frequency {
        if let Some(state) = db.set_reminder(contact.id, Some(frequency), None, Utc::now())? {
            if let Some(next) = state.next_reminder {
                println!("Reminder: {} (next {})", frequency, super::ui::format_date(next));
            }
        }
        super::calendar::push_reminder(db, &settings, contact.id);
    }

    Ok(())
}

/// Execute the edit command. An empty value clears a field.
pub fn run_edit(db: &Database, args: EditArgs) -> Result<()> {
    let mut contact = require_contact(db, &args.identifier)?;
    apply_fields(&mut contact, args.name, args.fields)?;

    if db.update_contact(&contact)? {
        println!("Saved.");
    } else {
        println!("Not found: {}", args.identifier);
    }
    Ok(())
}

/// The reminder a new contact starts with: the requested frequency, or the
/// configured default.
pub(crate) fn initial_frequency(
    requested: Option<&str>,
    settings: &Settings,
) -> Result<Option<ReminderFrequency>> {
    match requested {
        Some(label) => match ReminderFrequency::parse(label) {
            Some(ReminderFrequency::Custom) => {
                bail!("Use `remind set <contact> custom --every N --unit U` for custom reminders")
            }
            Some(frequency) => Ok(Some(frequency)),
            None => Err(anyhow!(
                "Unknown frequency '{}'. Use one of: {}",
                label,
                frequency_labels()
            )),
        },
        None => Ok(settings.default_frequency),
    }
}

pub(crate) fn frequency_labels() -> String {
    ReminderFrequency::ALL
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Copy provided values onto a contact, validating as we go.
fn apply_fields(contact: &mut Contact, name: Option<String>, fields: ContactFields) -> Result<()> {
    if let Some(name) = name {
        let name = name.trim();
        if name.is_empty() {
            bail!("A name is required.");
        }
        contact.full_name = name.to_string();
    }

    if let Some(ref e) = fields.email {
        if !e.trim().is_empty() && !is_valid_email(e.trim()) {
            bail!("Invalid email format: {}", e);
        }
    }

    set_optional(&mut contact.email, fields.email);
    set_optional(&mut contact.mobile_phone, fields.phone);
    set_optional(&mut contact.business_phone, fields.work_phone);
    set_optional(&mut contact.company, fields.company);
    set_optional(&mut contact.job_title, fields.title);
    set_optional(&mut contact.linkedin_url, fields.linkedin);
    set_optional(&mut contact.notes, fields.notes);
    Ok(())
}

fn set_optional(field: &mut Option<String>, value: Option<String>) {
    if let Some(value) = value {
        let value = value.trim();
        *field = (!value.is_empty()).then(|| value.to_string());
    }
}

/// Find an existing contact with the same email or the same name.
fn check_duplicate(db: &Database, contact: &Contact) -> Result<Option<String>> {
    if let Some(ref email) = contact.email {
        if let Some(existing) = db.get_contact_by_email(email)? {
            return Ok(Some(format!("{} <{}>", existing.full_name, email)));
        }
    }
    let same_name = db.find_contacts_by_name(&contact.full_name)?;
    Ok(same_name.into_iter().next().map(|c| c.full_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> ContactFields {
        ContactFields {
            email: None,
            phone: None,
            work_phone: None,
            company: None,
            title: None,
            linkedin: None,
            notes: None,
        }
    }

    #[test]
    fn test_apply_fields_sets_and_clears() {
        let mut contact = Contact::new("Jane".into());
        contact.company = Some("Old Co".into());

        let mut f = fields();
        f.email = Some(" jane@x.com ".into());
        f.company = Some("".into());
        f.title = Some("CTO".into());
        apply_fields(&mut contact, Some("Jane Doe".into()), f).unwrap();

        assert_eq!(contact.full_name, "Jane Doe");
        assert_eq!(contact.email.as_deref(), Some("jane@x.com"));
        assert_eq!(contact.company, None);
        assert_eq!(contact.job_title.as_deref(), Some("CTO"));
    }

    #[test]
    fn test_apply_fields_rejects_bad_input() {
        let mut contact = Contact::new("Jane".into());
        assert!(apply_fields(&mut contact, Some("  ".into()), fields()).is_err());

        let mut f = fields();
        f.email = Some("not-an-email".into());
        assert!(apply_fields(&mut contact, None, f).is_err());
    }

    #[test]
    fn test_initial_frequency() {
        let mut settings = Settings::default();
        assert_eq!(initial_frequency(None, &settings).unwrap(), None);
        assert_eq!(
            initial_frequency(Some("quarterly"), &settings).unwrap(),
            Some(ReminderFrequency::EveryThreeMonths)
        );
        assert!(initial_frequency(Some("custom"), &settings).is_err());
        assert!(initial_frequency(Some("hourly"), &settings).is_err());

        settings.default_frequency = Some(ReminderFrequency::Monthly);
        assert_eq!(
            initial_frequency(None, &settings).unwrap(),
            Some(ReminderFrequency::Monthly)
        );
    }

    #[test]
    fn test_check_duplicate() {
        let db = Database::open_memory().unwrap();
        let mut existing = Contact::new("Jane Doe".into());
        existing.email = Some("jane@x.com".into());
        db.insert_contact(&existing).unwrap();

        let mut by_email = Contact::new("J. Doe".into());
        by_email.email = Some("JANE@x.com".into());
        assert!(check_duplicate(&db, &by_email).unwrap().is_some());

        let by_name = Contact::new("jane doe".into());
        assert_eq!(check_duplicate(&db, &by_name).unwrap().as_deref(), Some("Jane Doe"));

        let fresh = Contact::new("John Roe".into());
        assert!(check_duplicate(&db, &fresh).unwrap().is_none());
    }
}
