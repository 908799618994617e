//! Shared UI primitives for keepintouch
//!
//! Conventions:
//! - Prompts: lowercase with colon and space: `name: `
//! - Feedback: single word when possible: `Saved.`

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Days, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use inquire::{ui::RenderConfig, Confirm, Select, Text};
use uuid::Uuid;

use crate::db::Database;
use crate::models::Contact;

const PAGE_SIZE: usize = 15;

/// Hour used when a date is given without a time.
const DEFAULT_HOUR: u32 = 9;

/// Get a minimal render config for inquire prompts
pub fn minimal_render_config() -> RenderConfig<'static> {
    RenderConfig::default_colored()
        .with_prompt_prefix(inquire::ui::Styled::new(""))
        .with_answered_prompt_prefix(inquire::ui::Styled::new(""))
}

pub fn page_size() -> usize {
    PAGE_SIZE
}

/// Prompt for text input with optional default value
pub fn text_input(prompt: &str, default: Option<&str>) -> Result<Option<String>> {
    let mut builder = Text::new(prompt).with_render_config(minimal_render_config());

    if let Some(d) = default {
        if !d.is_empty() {
            builder = builder.with_default(d);
        }
    }

    Ok(builder.prompt_skippable()?)
}

/// Prompt for yes/no confirmation (default: no)
pub fn confirm(prompt: &str) -> Result<bool> {
    let result = Confirm::new(prompt)
        .with_render_config(minimal_render_config())
        .with_default(false)
        .prompt()?;
    Ok(result)
}

/// Format a contact for selection display: "Name (email)"
fn format_contact_for_select(contact: &Contact) -> String {
    match contact.email.as_deref().or(contact.company.as_deref()) {
        Some(extra) => format!("{} ({})", contact.full_name, extra),
        None => contact.full_name.clone(),
    }
}

/// Let the user pick one of several contacts. A single contact goes
/// straight through.
pub fn select_contact(contacts: &[Contact]) -> Result<Option<Contact>> {
    match contacts {
        [] => return Ok(None),
        [only] => return Ok(Some(only.clone())),
        _ => {}
    }

    let options: Vec<String> = contacts.iter().map(format_contact_for_select).collect();
    let result = Select::new("select:", options.clone())
        .with_render_config(minimal_render_config())
        .with_page_size(PAGE_SIZE)
        .with_vim_mode(true)
        .prompt_skippable()?;

    Ok(result.and_then(|selected| {
        options
            .iter()
            .position(|o| *o == selected)
            .map(|idx| contacts[idx].clone())
    }))
}

/// Find a contact by UUID, email, or name. Several name matches prompt a
/// selection.
pub fn find_contact_by_identifier(db: &Database, identifier: &str) -> Result<Option<Contact>> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Ok(None);
    }

    if let Ok(uuid) = Uuid::parse_str(identifier) {
        return db.get_contact(uuid);
    }

    if identifier.contains('@') {
        if let Some(contact) = db.get_contact_by_email(identifier)? {
            return Ok(Some(contact));
        }
    }

    let exact = db.find_contacts_by_name(identifier)?;
    if !exact.is_empty() {
        return select_contact(&exact);
    }

    let results = db.search_contacts(identifier, u32::MAX)?;
    select_contact(&results)
}

/// Like `find_contact_by_identifier`, but a miss is an error.
pub fn require_contact(db: &Database, identifier: &str) -> Result<Contact> {
    find_contact_by_identifier(db, identifier)?.ok_or_else(|| anyhow!("Not found: {}", identifier))
}

/// Validate email format
pub fn is_valid_email(email: &str) -> bool {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return false;
    }
    let (local, domain) = (parts[0], parts[1]);
    !local.is_empty() && !domain.is_empty() && domain.contains('.')
}

/// Parse a date or date-time in local time.
/// Supports: "today", "tomorrow", "+Nd", "+Nw", YYYY-MM-DD, and
/// "YYYY-MM-DD HH:MM". Dates without a time land at 9am.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim().to_lowercase();

    for fmt in ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&s, fmt) {
            return local_to_utc(naive);
        }
    }

    let date = parse_date(&s)?;
    let time = NaiveTime::from_hms_opt(DEFAULT_HOUR, 0, 0).ok_or_else(|| anyhow!("Invalid time"))?;
    local_to_utc(date.and_time(time))
}

/// Parse a calendar date: "today", "tomorrow", "+Nd", "+Nw" or YYYY-MM-DD.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim().to_lowercase();
    let today = Local::now().date_naive();

    let date = match s.as_str() {
        "today" => today,
        "tomorrow" => today + Duration::days(1),
        _ if s.starts_with('+') => {
            let (n, days_per_unit) = parse_relative(&s[1..])?;
            n.checked_mul(days_per_unit)
                .and_then(|days| u64::try_from(days).ok())
                .and_then(|days| today.checked_add_days(Days::new(days)))
                .ok_or_else(|| anyhow!("Date out of range: {}", s))?
        }
        _ => NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|_| {
            anyhow!("Invalid date. Use: today, tomorrow, +3d, +1w, or YYYY-MM-DD")
        })?,
    };
    Ok(date)
}

/// Parse relative date suffix like "3d" or "2w". Returns (number, days_per_unit).
fn parse_relative(s: &str) -> Result<(i64, i64)> {
    let (num_str, multiplier) = match s.chars().last() {
        Some('d') => (&s[..s.len() - 1], 1),
        Some('w') => (&s[..s.len() - 1], 7),
        _ => bail!("Use +Nd or +Nw (e.g., +3d, +1w)"),
    };
    let n: i64 = num_str
        .parse()
        .map_err(|_| anyhow!("Invalid number: {}", num_str))?;
    if n < 0 {
        bail!("Number must be positive");
    }
    Ok((n, multiplier))
}

fn local_to_utc(naive: NaiveDateTime) -> Result<DateTime<Utc>> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| anyhow!("Invalid local time: {}", naive))
}

/// Format a reminder date relative to `today`.
pub fn format_relative(date: DateTime<Utc>, today: NaiveDate) -> String {
    let local = date.with_timezone(&Local);
    let days = (local.date_naive() - today).num_days();
    match days {
        d if d < -1 => format!("{} days overdue", -d),
        -1 => "1 day overdue".into(),
        0 => "today".into(),
        1 => "tomorrow".into(),
        2..=7 => format!("in {} days", days),
        _ => local.format("%Y-%m-%d").to_string(),
    }
}

pub fn format_date(date: DateTime<Utc>) -> String {
    format_relative(date, Local::now().date_naive())
}

pub fn format_datetime(date: DateTime<Utc>) -> String {
    date.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}
