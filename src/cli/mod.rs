use clap::{Args, Parser, Subcommand};

pub mod activity;
pub mod add;
pub mod calendar;
pub mod config;
pub mod import;
pub mod list;
pub mod remind;
pub mod show;
pub mod ui;

pub use activity::run_activity;
pub use add::{run_add, run_edit};
pub use calendar::run_calendar;
pub use config::run_config;
pub use import::run_import;
pub use list::{run_list, run_search};
pub use remind::run_remind;
pub use show::{run_delete, run_show};

#[derive(Parser)]
#[command(name = "keepintouch")]
#[command(about = "Stay-in-touch reminders for the people you know")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a new contact
    Add(AddArgs),
    /// Change a contact's details
    Edit(EditArgs),
    /// List contacts with pagination
    List(ListArgs),
    /// Search contacts by name, email or company
    Search(SearchArgs),
    /// Show full details for a contact
    Show(ShowArgs),
    /// Delete a contact
    Delete(DeleteArgs),
    /// Import contacts from a CSV, LinkedIn or vCard file
    Import(ImportArgs),
    /// Manage stay-in-touch reminders
    Remind {
        #[command(subcommand)]
        command: RemindCommands,
    },
    /// Schedule and browse activities
    Activity {
        #[command(subcommand)]
        command: ActivityCommands,
    },
    /// Read and write settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Mirror reminders to the calendar service
    Calendar {
        #[command(subcommand)]
        command: CalendarCommands,
    },
}

#[derive(Args)]
pub struct ContactFields {
    #[arg(short, long)]
    pub email: Option<String>,
    /// Mobile phone
    #[arg(short, long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub work_phone: Option<String>,
    #[arg(short, long)]
    pub company: Option<String>,
    /// Job title
    #[arg(short, long)]
    pub title: Option<String>,
    #[arg(long)]
    pub linkedin: Option<String>,
    #[arg(short, long)]
    pub notes: Option<String>,
}

#[derive(Args)]
pub struct AddArgs {
    /// Full name (prompted if omitted)
    pub name: Option<String>,
    #[command(flatten)]
    pub fields: ContactFields,
    /// Reminder frequency, e.g. "monthly" or "Every 2 weeks"
    #[arg(short, long)]
    pub remind: Option<String>,
}

#[derive(Args)]
pub struct EditArgs {
    /// Contact name, email or UUID
    pub identifier: String,
    /// New full name
    #[arg(long)]
    pub name: Option<String>,
    #[command(flatten)]
    pub fields: ContactFields,
}

#[derive(Args)]
pub struct ListArgs {
    #[arg(short, long, default_value = "1")]
    pub page: u32,
    #[arg(short, long, default_value = "20")]
    pub limit: u32,
}

#[derive(Args)]
pub struct SearchArgs {
    pub query: String,
    #[arg(short, long, default_value = "50")]
    pub limit: u32,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Contact name, email or UUID
    pub identifier: String,
}

#[derive(Args)]
pub struct DeleteArgs {
    /// Contact name, email or UUID
    pub identifier: String,
    /// Skip confirmation
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args)]
pub struct ImportArgs {
    /// File to import
    pub file: String,
    /// Force a format: csv, linkedin or vcard (guessed if omitted)
    #[arg(short, long)]
    pub format: Option<String>,
    /// Show what would be imported without saving
    #[arg(short, long)]
    pub dry_run: bool,
    /// Import every new contact without asking
    #[arg(short, long)]
    pub yes: bool,
    /// Reminder frequency for imported contacts
    #[arg(short, long)]
    pub remind: Option<String>,
}

/// Options describing a custom recurrence.
#[derive(Args, Clone, Default)]
pub struct CustomArgs {
    /// Repeat every N units
    #[arg(long, value_name = "N")]
    pub every: Option<u32>,
    /// day, week, month or year
    #[arg(long)]
    pub unit: Option<String>,
    /// Stop after this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE", conflicts_with = "times")]
    pub until: Option<String>,
    /// Stop after N reminders
    #[arg(long, value_name = "N")]
    pub times: Option<u32>,
}

#[derive(Subcommand)]
pub enum RemindCommands {
    /// Start a reminder: a fixed frequency, or "custom" with --every/--unit
    Set {
        identifier: String,
        frequency: String,
        #[command(flatten)]
        custom: CustomArgs,
    },
    /// Mark the current reminder done and schedule the next one
    Done { identifier: String },
    /// Skip the current reminder
    Skip { identifier: String },
    /// Put a reminder back to pending
    Pending { identifier: String },
    /// Remove a contact's reminder
    Clear { identifier: String },
    /// Show reminders that are due
    Due,
    /// Show every scheduled reminder
    List,
    /// Preview the dates a custom recurrence produces
    Preview {
        #[command(flatten)]
        custom: CustomArgs,
        /// Start from this date instead of today
        #[arg(long)]
        from: Option<String>,
        #[arg(short, long, default_value_t = crate::reminders::DEFAULT_PREVIEW_COUNT)]
        count: usize,
    },
}

#[derive(Subcommand)]
pub enum ActivityCommands {
    /// Schedule an activity
    Add {
        title: String,
        /// Start: "YYYY-MM-DD HH:MM", YYYY-MM-DD, today, tomorrow, +3d
        #[arg(long)]
        at: String,
        /// End time, same formats as --at
        #[arg(long)]
        until: Option<String>,
        /// Participant name, email or UUID (repeatable)
        #[arg(short, long = "with")]
        with: Vec<String>,
        #[arg(short, long)]
        location: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        /// Also create a calendar event
        #[arg(long)]
        calendar: bool,
    },
    /// List activities
    List {
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
        /// Text in title, description or location
        #[arg(short, long)]
        search: Option<String>,
        /// Only activities including this contact (repeatable)
        #[arg(short, long = "with")]
        with: Vec<String>,
        #[arg(short, long)]
        limit: Option<u32>,
    },
    /// Delete an activity by id
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print one setting
    Get { key: String },
    /// Store a setting
    Set { key: String, value: String },
    /// Remove a stored setting
    Unset { key: String },
    /// Print every stored setting
    List,
    /// Print the database location
    Path,
}

#[derive(Subcommand)]
pub enum CalendarCommands {
    /// Create or replace calendar events for every scheduled reminder
    Sync,
    /// Remove a contact's reminder events from the calendar
    Clear { identifier: String },
    /// List upcoming calendar events
    Events {
        #[arg(short, long, default_value = "14")]
        days: i64,
    },
}
