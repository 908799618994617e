use anyhow::Result;
use rusqlite::params;

use super::Database;

impl Database {
    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let result = self.conn.query_row(
            "SELECT value FROM app_settings WHERE key = ?",
            [key],
            |row| row.get(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO app_settings (key, value) VALUES (?, ?)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn delete_setting(&self, key: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM app_settings WHERE key = ?", [key])?;
        Ok(rows > 0)
    }

    /// All stored settings, sorted by key.
    pub fn list_settings(&self) -> Result<Vec<(String, String)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, value FROM app_settings ORDER BY key")?;
        let settings = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_round_trip() {
        let db = Database::open_memory().unwrap();
        assert_eq!(db.get_setting("calendar_time_zone").unwrap(), None);

        db.set_setting("calendar_time_zone", "UTC").unwrap();
        db.set_setting("calendar_time_zone", "Europe/Paris").unwrap();
        db.set_setting("default_frequency", "Monthly").unwrap();
        assert_eq!(
            db.get_setting("calendar_time_zone").unwrap().as_deref(),
            Some("Europe/Paris")
        );

        let all = db.list_settings().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].0, "calendar_time_zone");

        assert!(db.delete_setting("default_frequency").unwrap());
        assert!(!db.delete_setting("default_frequency").unwrap());
        assert_eq!(db.list_settings().unwrap().len(), 1);
    }
}
