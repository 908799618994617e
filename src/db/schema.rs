pub const SCHEMA_VERSION: i32 = 2;

pub const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS contacts (
    id TEXT PRIMARY KEY,
    full_name TEXT NOT NULL,
    search_name TEXT NOT NULL,
    email TEXT,
    mobile_phone TEXT,
    business_phone TEXT,
    company TEXT,
    job_title TEXT,
    linkedin_url TEXT,
    notes TEXT,
    reminder_frequency TEXT,
    next_reminder TEXT,
    reminder_status TEXT NOT NULL DEFAULT 'pending',
    custom_recurrence TEXT,
    occurrences_completed INTEGER NOT NULL DEFAULT 0,
    last_contacted TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_contact_search ON contacts(search_name);
CREATE INDEX IF NOT EXISTS idx_contact_email ON contacts(email);
CREATE INDEX IF NOT EXISTS idx_contact_next_reminder ON contacts(next_reminder);

CREATE TABLE IF NOT EXISTS activities (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT,
    location TEXT,
    starts_at TEXT NOT NULL,
    ends_at TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_activity_starts ON activities(starts_at);

CREATE TABLE IF NOT EXISTS activity_contacts (
    activity_id TEXT NOT NULL,
    contact_id TEXT NOT NULL,
    PRIMARY KEY (activity_id, contact_id),
    FOREIGN KEY (activity_id) REFERENCES activities(id) ON DELETE CASCADE,
    FOREIGN KEY (contact_id) REFERENCES contacts(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_activity_contact ON activity_contacts(contact_id);

CREATE TABLE IF NOT EXISTS app_settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// V2 migration: remember the calendar event created for a contact's reminder
/// so it can be replaced when the reminder moves.
pub const MIGRATION_V2: &str = r#"
ALTER TABLE contacts ADD COLUMN calendar_event_id TEXT;
"#;
