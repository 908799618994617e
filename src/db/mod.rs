use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Connection;
use std::path::PathBuf;
use uuid::Uuid;

mod activities;
mod contacts;
mod reminders;
mod schema;
mod settings;

pub use activities::ActivityFilter;
pub use reminders::StatusChange;
pub use schema::SCHEMA_VERSION;

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at the configured path, creating it and running migrations
    pub fn open() -> Result<Self> {
        let path = crate::config::database_path()?;
        Self::open_at(path)
    }

    pub fn open_at(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        // Another process may hold the write lock while completing a reminder.
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open in-memory database for testing
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Run `f` inside `BEGIN IMMEDIATE`. Commits on success; rolls back if
    /// `f` or the commit itself fails, so the connection is never left in an
    /// open transaction.
    pub(crate) fn write_transaction<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        self.conn.execute("BEGIN IMMEDIATE", [])?;

        let result = f().and_then(|value| {
            self.conn.execute("COMMIT", [])?;
            Ok(value)
        });
        if result.is_err() && !self.conn.is_autocommit() {
            if let Err(e) = self.conn.execute("ROLLBACK", []) {
                log::warn!("rollback failed: {}", e);
            }
        }
        result
    }

    fn migrate(&self) -> Result<()> {
        let version = self.get_schema_version()?;

        if version < 1 {
            self.conn
                .execute_batch(&format!("BEGIN TRANSACTION; {} COMMIT;", schema::SCHEMA_V1))?;
            self.set_schema_version(1)?;
        }
        if version < 2 {
            self.conn
                .execute_batch(&format!("BEGIN TRANSACTION; {} COMMIT;", schema::MIGRATION_V2))?;
            self.set_schema_version(2)?;
        }

        Ok(())
    }

    fn get_schema_version(&self) -> Result<i32> {
        let result: Result<i32, _> =
            self.conn
                .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                    row.get(0)
                });

        match result {
            Ok(v) => Ok(v),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
            Err(rusqlite::Error::SqliteFailure(err, msg)) => {
                // "no such table" is reported as a generic SQLITE_ERROR
                if err.code == rusqlite::ErrorCode::Unknown
                    && msg.as_ref().is_some_and(|m| m.contains("no such table"))
                {
                    Ok(0)
                } else {
                    Err(rusqlite::Error::SqliteFailure(err, msg).into())
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    fn set_schema_version(&self, version: i32) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO schema_version (id, version) VALUES (1, ?)",
            [version],
        )?;
        Ok(())
    }
}

/// Timestamps are stored as fixed-width RFC 3339 UTC so SQL can compare them as text.
pub(crate) fn format_ts(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub(crate) fn parse_ts(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

/// Helper to convert UUID parse errors to rusqlite errors
pub(crate) fn parse_uuid(s: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_memory() {
        let db = Database::open_memory().unwrap();
        assert_eq!(db.get_schema_version().unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_failed_commit_rolls_back() {
        let db = Database::open_memory().unwrap();

        // Deferred foreign keys are only checked at COMMIT, so the commit fails.
        let result = db.write_transaction(|| {
            db.conn.execute_batch(
                "PRAGMA defer_foreign_keys = ON;
                 INSERT INTO activity_contacts (activity_id, contact_id) VALUES ('a', 'c');",
            )?;
            Ok(())
        });

        assert!(result.is_err());
        assert!(db.conn.is_autocommit());
        let links: i64 = db
            .conn
            .query_row("SELECT COUNT(*) FROM activity_contacts", [], |row| row.get(0))
            .unwrap();
        assert_eq!(links, 0);

        // The connection is usable for the next write.
        db.write_transaction(|| Ok(())).unwrap();
    }

    #[test]
    fn test_failed_closure_rolls_back() {
        let db = Database::open_memory().unwrap();
        let result: Result<()> = db.write_transaction(|| {
            db.conn
                .execute("INSERT INTO app_settings (key, value) VALUES ('k', 'v')", [])?;
            anyhow::bail!("stop")
        });
        assert!(result.is_err());
        assert!(db.conn.is_autocommit());
        assert!(db.get_setting("k").unwrap().is_none());
    }

    #[test]
    fn test_tables_exist() {
        let db = Database::open_memory().unwrap();

        let tables: Vec<String> = db
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(tables.contains(&"contacts".to_string()));
        assert!(tables.contains(&"activities".to_string()));
        assert!(tables.contains(&"activity_contacts".to_string()));
        assert!(tables.contains(&"app_settings".to_string()));
    }

    #[test]
    fn test_reopen_keeps_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("contacts.db");

        Database::open_at(path.clone()).unwrap();
        let db = Database::open_at(path).unwrap();
        assert_eq!(db.get_schema_version().unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_timestamp_format_round_trips() {
        let dt = DateTime::parse_from_rfc3339("2026-03-10T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let s = format_ts(&dt);
        assert_eq!(s, "2026-03-10T12:00:00Z");
        assert_eq!(parse_ts(&s), Some(dt));
        assert_eq!(parse_ts("not a date"), None);
    }
}
