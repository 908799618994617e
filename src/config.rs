//! Configuration management
//!
//! Settings come from environment variables and the `app_settings` table.
//! Environment variables take precedence over stored settings.

use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::path::PathBuf;
use url::Url;

use crate::db::Database;
use crate::reminders::ReminderFrequency;

// Settings keys for database storage
pub const SETTING_CALENDAR_URL: &str = "calendar_function_url";
pub const SETTING_CALENDAR_TOKEN: &str = "calendar_token";
pub const SETTING_CALENDAR_TIME_ZONE: &str = "calendar_time_zone";
pub const SETTING_DEFAULT_FREQUENCY: &str = "default_frequency";

pub const KNOWN_SETTINGS: [&str; 4] = [
    SETTING_CALENDAR_URL,
    SETTING_CALENDAR_TOKEN,
    SETTING_CALENDAR_TIME_ZONE,
    SETTING_DEFAULT_FREQUENCY,
];

// Environment variable names
const ENV_DB: &str = "KEEPINTOUCH_DB";
const ENV_CALENDAR_URL: &str = "KEEPINTOUCH_CALENDAR_URL";
const ENV_CALENDAR_TOKEN: &str = "KEEPINTOUCH_CALENDAR_TOKEN";

pub const DEFAULT_TIME_ZONE: &str = "UTC";

/// Location of the contact database: `$KEEPINTOUCH_DB`, else
/// `<config dir>/keepintouch/contacts.db`.
pub fn database_path() -> Result<PathBuf> {
    if let Some(path) = env::var_os(ENV_DB).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    let config_dir =
        dirs::config_dir().ok_or_else(|| anyhow!("Could not find config directory"))?;
    Ok(config_dir.join("keepintouch").join("contacts.db"))
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub calendar_url: Option<Url>,
    pub calendar_token: Option<String>,
    /// IANA zone name sent with calendar events
    pub calendar_time_zone: String,
    pub default_frequency: Option<ReminderFrequency>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            calendar_url: None,
            calendar_token: None,
            calendar_time_zone: DEFAULT_TIME_ZONE.to_string(),
            default_frequency: None,
        }
    }
}

impl Settings {
    /// Load from environment variables and database settings.
    pub fn load(db: &Database) -> Result<Self> {
        Self::load_with(db, |name| env::var(name).ok())
    }

    /// Load using `lookup` in place of the process environment.
    pub fn load_with(db: &Database, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let from_env = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let calendar_url = match from_env(ENV_CALENDAR_URL) {
            Some(url) => Some(url),
            None => db.get_setting(SETTING_CALENDAR_URL)?,
        }
        .map(|raw| parse_function_url(&raw))
        .transpose()?;

        let calendar_token = match from_env(ENV_CALENDAR_TOKEN) {
            Some(token) => Some(token),
            None => db.get_setting(SETTING_CALENDAR_TOKEN)?,
        };

        let calendar_time_zone = db
            .get_setting(SETTING_CALENDAR_TIME_ZONE)?
            .filter(|tz| !tz.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TIME_ZONE.to_string());

        let default_frequency = db
            .get_setting(SETTING_DEFAULT_FREQUENCY)?
            .and_then(|label| {
                let parsed = ReminderFrequency::parse(&label);
                if parsed.is_none() {
                    log::warn!("ignoring unknown default frequency '{}'", label);
                }
                parsed
            })
            .filter(|f| *f != ReminderFrequency::Custom);

        Ok(Self {
            calendar_url,
            calendar_token,
            calendar_time_zone,
            default_frequency,
        })
    }

    pub fn calendar_configured(&self) -> bool {
        self.calendar_url.is_some()
    }
}

/// Check a value before it is stored under `key`.
pub fn validate_setting(key: &str, value: &str) -> Result<()> {
    match key {
        SETTING_CALENDAR_URL => parse_function_url(value).map(|_| ()),
        SETTING_DEFAULT_FREQUENCY => match ReminderFrequency::parse(value) {
            Some(ReminderFrequency::Custom) => {
                bail!("Custom needs an interval; pick a fixed frequency as the default")
            }
            Some(_) => Ok(()),
            None => bail!("Unknown frequency '{}'", value),
        },
        SETTING_CALENDAR_TIME_ZONE if value.trim().is_empty() => {
            bail!("Time zone cannot be empty")
        }
        SETTING_CALENDAR_TOKEN | SETTING_CALENDAR_TIME_ZONE => Ok(()),
        _ => bail!(
            "Unknown setting '{}'. Known settings: {}",
            key,
            KNOWN_SETTINGS.join(", ")
        ),
    }
}

fn parse_function_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("Invalid calendar URL '{}'", raw))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        bail!("Invalid calendar URL '{}': must use http or https", raw);
    }
    Ok(url)
}
