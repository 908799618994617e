mod activity;
mod contact;
mod reminder;

pub use activity::Activity;
pub use contact::Contact;
pub use reminder::{ReminderState, ReminderStatus};
