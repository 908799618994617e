use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Something scheduled with one or more contacts: coffee, a call, a dinner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub contact_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Activity {
    pub fn new(title: String, starts_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            description: None,
            location: None,
            starts_at,
            ends_at: None,
            contact_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn involves(&self, contact_id: Uuid) -> bool {
        self.contact_ids.contains(&contact_id)
    }
}
