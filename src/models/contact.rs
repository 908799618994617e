use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ReminderState;
use crate::import::ImportedContact;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: Uuid,
    pub full_name: String,
    pub email: Option<String>,
    pub mobile_phone: Option<String>,
    pub business_phone: Option<String>,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub linkedin_url: Option<String>,
    pub notes: Option<String>,
    pub reminder: ReminderState,
    pub last_contacted: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contact {
    pub fn new(full_name: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            full_name,
            email: None,
            mobile_phone: None,
            business_phone: None,
            company: None,
            job_title: None,
            linkedin_url: None,
            notes: None,
            reminder: ReminderState::default(),
            last_contacted: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Lowercased name used for matching and sorting.
    pub fn search_name(&self) -> String {
        self.full_name.to_lowercase()
    }

    pub fn primary_phone(&self) -> Option<&str> {
        self.mobile_phone
            .as_deref()
            .or(self.business_phone.as_deref())
    }
}

impl From<ImportedContact> for Contact {
    /// The candidate's selection id is dropped; the contact gets its own id.
    fn from(imported: ImportedContact) -> Self {
        let mut contact = Contact::new(imported.full_name);
        contact.email = imported.email;
        contact.mobile_phone = imported.mobile_phone;
        contact.business_phone = imported.business_phone;
        contact.company = imported.company;
        contact.job_title = imported.job_title;
        contact.linkedin_url = imported.linkedin_url;
        contact
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_imported_gets_fresh_id() {
        let mut imported = ImportedContact::new("Jane Doe".into());
        imported.email = Some("jane@x.com".into());
        imported.business_phone = Some("555-0001".into());
        let selection_id = imported.selection_id;

        let contact = Contact::from(imported);
        assert_ne!(contact.id, selection_id);
        assert_eq!(contact.full_name, "Jane Doe");
        assert_eq!(contact.email.as_deref(), Some("jane@x.com"));
        assert_eq!(contact.primary_phone(), Some("555-0001"));
        assert!(contact.reminder.frequency.is_none());
    }
}
