use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Row};
use uuid::Uuid;

use super::{format_ts, parse_ts, parse_uuid, Database};
use crate::models::Activity;

/// Criteria for listing activities. Empty filter lists everything.
#[derive(Debug, Clone, Default)]
pub struct ActivityFilter {
    /// Starting at or after this instant
    pub from: Option<DateTime<Utc>>,
    /// Starting before this instant
    pub until: Option<DateTime<Utc>>,
    /// Case-insensitive match on title, description or location
    pub text: Option<String>,
    /// Activity must include every one of these contacts
    pub contact_ids: Vec<Uuid>,
    pub limit: Option<u32>,
}

impl Database {
    pub fn insert_activity(&self, activity: &Activity) -> Result<()> {
        self.write_transaction(|| self.write_activity(activity, true))
    }

    /// Replace an activity's fields and participants. Sets `updated_at` to now.
    pub fn update_activity(&self, activity: &Activity) -> Result<bool> {
        self.write_transaction(|| self.write_activity(activity, false))?;
        Ok(self.get_activity(activity.id)?.is_some())
    }

    fn write_activity(&self, activity: &Activity, is_new: bool) -> Result<()> {
        let id = activity.id.to_string();
        if is_new {
            self.conn.execute(
                r#"INSERT INTO activities (
                    id, title, description, location, starts_at, ends_at, created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
                params![
                    id,
                    activity.title,
                    activity.description,
                    activity.location,
                    format_ts(&activity.starts_at),
                    activity.ends_at.as_ref().map(format_ts),
                    format_ts(&activity.created_at),
                    format_ts(&activity.updated_at),
                ],
            )?;
        } else {
            let rows = self.conn.execute(
                r#"UPDATE activities SET
                    title = ?, description = ?, location = ?, starts_at = ?, ends_at = ?,
                    updated_at = ?
                   WHERE id = ?"#,
                params![
                    activity.title,
                    activity.description,
                    activity.location,
                    format_ts(&activity.starts_at),
                    activity.ends_at.as_ref().map(format_ts),
                    format_ts(&Utc::now()),
                    id,
                ],
            )?;
            if rows == 0 {
                return Ok(());
            }
            self.conn
                .execute("DELETE FROM activity_contacts WHERE activity_id = ?", [&id])?;
        }

        for contact_id in &activity.contact_ids {
            self.conn.execute(
                "INSERT OR IGNORE INTO activity_contacts (activity_id, contact_id) VALUES (?, ?)",
                params![id, contact_id.to_string()],
            )?;
        }
        Ok(())
    }

    pub fn get_activity(&self, id: Uuid) -> Result<Option<Activity>> {
        let mut stmt = self.conn.prepare("SELECT * FROM activities WHERE id = ?")?;
        let result = stmt.query_row([id.to_string()], Self::row_to_activity);

        match result {
            Ok(mut activity) => {
                activity.contact_ids = self.activity_contact_ids(id)?;
                Ok(Some(activity))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn delete_activity(&self, id: Uuid) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM activities WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    /// Activities matching `filter`, earliest first.
    pub fn list_activities(&self, filter: &ActivityFilter) -> Result<Vec<Activity>> {
        let mut sql = String::from("SELECT a.* FROM activities a WHERE 1 = 1");
        let mut values: Vec<String> = Vec::new();

        if let Some(from) = filter.from {
            sql.push_str(" AND a.starts_at >= ?");
            values.push(format_ts(&from));
        }
        if let Some(until) = filter.until {
            sql.push_str(" AND a.starts_at < ?");
            values.push(format_ts(&until));
        }
        if let Some(text) = filter.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            sql.push_str(
                " AND (lower(a.title) LIKE ? OR lower(a.description) LIKE ? OR lower(a.location) LIKE ?)",
            );
            let pattern = format!("%{}%", text.to_lowercase());
            values.extend(std::iter::repeat(pattern).take(3));
        }
        for contact_id in &filter.contact_ids {
            sql.push_str(
                " AND EXISTS (SELECT 1 FROM activity_contacts ac WHERE ac.activity_id = a.id AND ac.contact_id = ?)",
            );
            values.push(contact_id.to_string());
        }
        sql.push_str(" ORDER BY a.starts_at ASC");
        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut activities = stmt
            .query_map(params_from_iter(values.iter()), Self::row_to_activity)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        for activity in &mut activities {
            activity.contact_ids = self.activity_contact_ids(activity.id)?;
        }
        Ok(activities)
    }

    fn activity_contact_ids(&self, activity_id: Uuid) -> Result<Vec<Uuid>> {
        let mut stmt = self.conn.prepare(
            "SELECT contact_id FROM activity_contacts WHERE activity_id = ? ORDER BY contact_id",
        )?;
        let ids = stmt
            .query_map([activity_id.to_string()], |row| {
                let id: String = row.get(0)?;
                parse_uuid(&id)
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
    }

    fn row_to_activity(row: &Row) -> rusqlite::Result<Activity> {
        let id: String = row.get("id")?;
        let starts_at: String = row.get("starts_at")?;
        let ends_at: Option<String> = row.get("ends_at")?;
        let created_at: String = row.get("created_at")?;
        let updated_at: String = row.get("updated_at")?;

        Ok(Activity {
            id: parse_uuid(&id)?,
            title: row.get("title")?,
            description: row.get("description")?,
            location: row.get("location")?,
            starts_at: parse_ts(&starts_at).unwrap_or_else(Utc::now),
            ends_at: ends_at.as_deref().and_then(parse_ts),
            contact_ids: Vec::new(),
            created_at: parse_ts(&created_at).unwrap_or_else(Utc::now),
            updated_at: parse_ts(&updated_at).unwrap_or_else(Utc::now),
        })
    }
}
