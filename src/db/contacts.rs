use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, Row};
use uuid::Uuid;

use super::{format_ts, parse_ts, parse_uuid, Database};
use crate::models::{Contact, ReminderState, ReminderStatus};
use crate::reminders::{CustomRecurrence, ReminderFrequency};

impl Database {
    // ==================== CONTACT CREATE ====================

    pub fn insert_contact(&self, contact: &Contact) -> Result<()> {
        let custom = contact
            .reminder
            .custom_recurrence
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        self.conn.execute(
            r#"INSERT INTO contacts (
                id, full_name, search_name, email, mobile_phone, business_phone,
                company, job_title, linkedin_url, notes,
                reminder_frequency, next_reminder, reminder_status, custom_recurrence,
                occurrences_completed, last_contacted, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                contact.id.to_string(),
                contact.full_name,
                contact.search_name(),
                contact.email,
                contact.mobile_phone,
                contact.business_phone,
                contact.company,
                contact.job_title,
                contact.linkedin_url,
                contact.notes,
                contact.reminder.frequency.map(|f| f.as_str()),
                contact.reminder.next_reminder.as_ref().map(format_ts),
                contact.reminder.status.as_str(),
                custom,
                contact.reminder.occurrences_completed,
                contact.last_contacted.as_ref().map(format_ts),
                format_ts(&contact.created_at),
                format_ts(&contact.updated_at),
            ],
        )?;
        Ok(())
    }

    // ==================== CONTACT READ ====================

    pub fn get_contact(&self, id: Uuid) -> Result<Option<Contact>> {
        let mut stmt = self.conn.prepare("SELECT * FROM contacts WHERE id = ?")?;
        let result = stmt.query_row([id.to_string()], Self::row_to_contact);

        match result {
            Ok(contact) => Ok(Some(contact)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_contact_by_email(&self, email: &str) -> Result<Option<Contact>> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM contacts WHERE lower(email) = lower(?) LIMIT 1")?;
        let result = stmt.query_row([email], Self::row_to_contact);

        match result {
            Ok(contact) => Ok(Some(contact)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_contacts(&self, limit: u32, offset: u32) -> Result<Vec<Contact>> {
        let mut stmt = self.conn.prepare(
            "SELECT * FROM contacts ORDER BY search_name ASC LIMIT ? OFFSET ?",
        )?;

        let contacts = stmt
            .query_map([limit, offset], Self::row_to_contact)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(contacts)
    }

    pub fn count_contacts(&self) -> Result<u32> {
        let count: u32 = self
            .conn
            .query_row("SELECT COUNT(*) FROM contacts", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Case-insensitive match on name, email or company.
    pub fn search_contacts(&self, query: &str, limit: u32) -> Result<Vec<Contact>> {
        let pattern = format!("%{}%", query.to_lowercase());
        let mut stmt = self.conn.prepare(
            r#"SELECT * FROM contacts
               WHERE search_name LIKE ?1
                  OR lower(email) LIKE ?1
                  OR lower(company) LIKE ?1
               ORDER BY search_name ASC
               LIMIT ?2"#,
        )?;

        let contacts = stmt
            .query_map(params![pattern, limit], Self::row_to_contact)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(contacts)
    }

    /// Exact (case-insensitive) full-name matches.
    pub fn find_contacts_by_name(&self, name: &str) -> Result<Vec<Contact>> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM contacts WHERE search_name = ? ORDER BY created_at ASC")?;

        let contacts = stmt
            .query_map([name.trim().to_lowercase()], Self::row_to_contact)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(contacts)
    }

    // ==================== CONTACT UPDATE ====================

    /// Update a contact's details. Reminder fields are left alone; they change
    /// only through the reminder operations. Sets `updated_at` to now.
    pub fn update_contact(&self, contact: &Contact) -> Result<bool> {
        let rows = self.conn.execute(
            r#"UPDATE contacts SET
                full_name = ?, search_name = ?, email = ?, mobile_phone = ?,
                business_phone = ?, company = ?, job_title = ?, linkedin_url = ?,
                notes = ?, updated_at = ?
               WHERE id = ?"#,
            params![
                contact.full_name,
                contact.search_name(),
                contact.email,
                contact.mobile_phone,
                contact.business_phone,
                contact.company,
                contact.job_title,
                contact.linkedin_url,
                contact.notes,
                format_ts(&Utc::now()),
                contact.id.to_string(),
            ],
        )?;
        Ok(rows > 0)
    }

    // ==================== CONTACT DELETE ====================

    /// Delete a contact; its activity links go with it (via CASCADE).
    pub fn delete_contact(&self, id: Uuid) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM contacts WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    // ==================== ROW MAPPING ====================

    pub(crate) fn row_to_contact(row: &Row) -> rusqlite::Result<Contact> {
        let id: String = row.get("id")?;
        let frequency: Option<String> = row.get("reminder_frequency")?;
        let next_reminder: Option<String> = row.get("next_reminder")?;
        let status: String = row.get("reminder_status")?;
        let custom: Option<String> = row.get("custom_recurrence")?;
        let last_contacted: Option<String> = row.get("last_contacted")?;
        let created_at: String = row.get("created_at")?;
        let updated_at: String = row.get("updated_at")?;

        let custom_recurrence = custom.and_then(|json| {
            serde_json::from_str::<CustomRecurrence>(&json)
                .map_err(|e| log::warn!("contact {}: bad custom recurrence: {}", id, e))
                .ok()
        });

        Ok(Contact {
            id: parse_uuid(&id)?,
            full_name: row.get("full_name")?,
            email: row.get("email")?,
            mobile_phone: row.get("mobile_phone")?,
            business_phone: row.get("business_phone")?,
            company: row.get("company")?,
            job_title: row.get("job_title")?,
            linkedin_url: row.get("linkedin_url")?,
            notes: row.get("notes")?,
            reminder: ReminderState {
                frequency: frequency.as_deref().and_then(ReminderFrequency::from_label),
                next_reminder: next_reminder.as_deref().and_then(parse_ts),
                status: ReminderStatus::parse(&status),
                custom_recurrence,
                occurrences_completed: row.get("occurrences_completed")?,
            },
            last_contacted: last_contacted.as_deref().and_then(parse_ts),
            created_at: parse_ts(&created_at).unwrap_or_else(Utc::now),
            updated_at: parse_ts(&updated_at).unwrap_or_else(Utc::now),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(name: &str, email: Option<&str>) -> Contact {
        let mut c = Contact::new(name.to_string());
        c.email = email.map(String::from);
        c
    }

    #[test]
    fn test_contact_crud() {
        let db = Database::open_memory().unwrap();
        let mut contact = sample("Jane Doe", Some("jane@x.com"));
        contact.company = Some("Acme".into());
        db.insert_contact(&contact).unwrap();

        let loaded = db.get_contact(contact.id).unwrap().unwrap();
        assert_eq!(loaded.full_name, "Jane Doe");
        assert_eq!(loaded.company.as_deref(), Some("Acme"));
        assert!(loaded.reminder.frequency.is_none());
        assert_eq!(loaded.reminder.status, ReminderStatus::Pending);

        contact.job_title = Some("CTO".into());
        assert!(db.update_contact(&contact).unwrap());
        let loaded = db.get_contact(contact.id).unwrap().unwrap();
        assert_eq!(loaded.job_title.as_deref(), Some("CTO"));

        assert!(db.delete_contact(contact.id).unwrap());
        assert!(db.get_contact(contact.id).unwrap().is_none());
        assert!(!db.delete_contact(contact.id).unwrap());
    }

    #[test]
    fn test_list_and_count_sorted_by_name() {
        let db = Database::open_memory().unwrap();
        for name in ["zoe Last", "Adam First", "mia Middle"] {
            db.insert_contact(&sample(name, None)).unwrap();
        }

        assert_eq!(db.count_contacts().unwrap(), 3);
        let names: Vec<String> = db
            .list_contacts(10, 0)
            .unwrap()
            .into_iter()
            .map(|c| c.full_name)
            .collect();
        assert_eq!(names, vec!["Adam First", "mia Middle", "zoe Last"]);
        assert_eq!(db.list_contacts(1, 1).unwrap()[0].full_name, "mia Middle");
    }

    #[test]
    fn test_search_and_lookup() {
        let db = Database::open_memory().unwrap();
        let mut jane = sample("Jane Doe", Some("Jane@Example.com"));
        jane.company = Some("Initech".into());
        db.insert_contact(&jane).unwrap();
        db.insert_contact(&sample("John Roe", None)).unwrap();

        assert_eq!(db.search_contacts("doe", 10).unwrap().len(), 1);
        assert_eq!(db.search_contacts("INITECH", 10).unwrap().len(), 1);
        assert_eq!(db.search_contacts("o", 10).unwrap().len(), 2);

        assert!(db.get_contact_by_email("jane@example.com").unwrap().is_some());
        assert!(db.get_contact_by_email("nobody@example.com").unwrap().is_none());

        assert_eq!(db.find_contacts_by_name(" jane doe ").unwrap().len(), 1);
    }

    #[test]
    fn test_custom_recurrence_round_trip() {
        use crate::reminders::RecurrenceUnit;

        let db = Database::open_memory().unwrap();
        let mut contact = sample("Pat Lee", None);
        contact.reminder.frequency = Some(ReminderFrequency::Custom);
        contact.reminder.next_reminder = Some(Utc::now());
        contact.reminder.custom_recurrence =
            Some(CustomRecurrence::new(3, RecurrenceUnit::Week).ending_after(4));
        db.insert_contact(&contact).unwrap();

        let loaded = db.get_contact(contact.id).unwrap().unwrap();
        assert_eq!(loaded.reminder.frequency, Some(ReminderFrequency::Custom));
        assert_eq!(loaded.reminder.custom_recurrence, contact.reminder.custom_recurrence);
    }
}
