use anyhow::Result;

use super::ConfigCommands;
use crate::config::{
    database_path, validate_setting, Settings, KNOWN_SETTINGS, SETTING_CALENDAR_TOKEN,
};
use crate::db::Database;

pub fn run_config(db: &Database, command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Get { key } => match db.get_setting(&key)? {
            Some(value) => println!("{}", display_value(&key, &value)),
            None => println!("{} is not set", key),
        },

        ConfigCommands::Set { key, value } => {
            validate_setting(&key, &value)?;
            db.set_setting(&key, value.trim())?;
            println!("Saved.");
        }

        ConfigCommands::Unset { key } => {
            if db.delete_setting(&key)? {
                println!("Removed.");
            } else {
                println!("{} is not set", key);
            }
        }

        ConfigCommands::List => {
            let stored = db.list_settings()?;
            for key in KNOWN_SETTINGS {
                let value = stored
                    .iter()
                    .find(|(k, _)| k == key)
                    .map(|(_, v)| display_value(key, v))
                    .unwrap_or_else(|| "-".to_string());
                println!("  {:<22} {}", key, value);
            }

            let effective = Settings::load(db)?;
            if let Some(url) = effective.calendar_url {
                println!("\ncalendar: {} ({})", url, effective.calendar_time_zone);
            }
        }

        ConfigCommands::Path => {
            println!("{}", database_path()?.display());
        }
    }
    Ok(())
}

/// Secrets are shown masked.
fn display_value(key: &str, value: &str) -> String {
    if key == SETTING_CALENDAR_TOKEN {
        let tail: String = value
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("****{}", tail)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_masked() {
        assert_eq!(display_value(SETTING_CALENDAR_TOKEN, "secret-abcd"), "****abcd");
        assert_eq!(display_value("calendar_time_zone", "UTC"), "UTC");
    }
}
