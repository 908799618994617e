use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::reminders::{CustomRecurrence, ReminderFrequency};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    #[default]
    Pending,
    Completed,
    Skipped,
}

impl ReminderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Skipped => "skipped",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "completed" => Self::Completed,
            "skipped" => Self::Skipped,
            _ => Self::Pending,
        }
    }
}

/// Stay-in-touch reminder attached to a contact.
///
/// `next_reminder` is set exactly when `frequency` is. `custom_recurrence`
/// only means something when the frequency is `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ReminderState {
    pub frequency: Option<ReminderFrequency>,
    pub next_reminder: Option<DateTime<Utc>>,
    pub status: ReminderStatus,
    pub custom_recurrence: Option<CustomRecurrence>,
    /// Reminders marked done in the current series; ends `after N` series.
    pub occurrences_completed: u32,
}

impl ReminderState {
    pub fn is_scheduled(&self) -> bool {
        self.next_reminder.is_some()
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_reminder.is_some_and(|next| next <= now)
    }

    /// Label for listings: "Every 2 weeks", or the custom cadence.
    pub fn label(&self) -> Option<String> {
        match (self.frequency, &self.custom_recurrence) {
            (Some(ReminderFrequency::Custom), Some(custom)) => {
                Some(crate::reminders::describe_recurrence(custom))
            }
            (Some(f), _) => Some(f.as_str().to_string()),
            (None, _) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reminders::RecurrenceUnit;
    use chrono::Duration;

    #[test]
    fn test_status_parse() {
        assert_eq!(ReminderStatus::parse("completed"), ReminderStatus::Completed);
        assert_eq!(ReminderStatus::parse("skipped"), ReminderStatus::Skipped);
        assert_eq!(ReminderStatus::parse("pending"), ReminderStatus::Pending);
        assert_eq!(ReminderStatus::parse("bogus"), ReminderStatus::Pending);
    }

    #[test]
    fn test_is_due() {
        let now = Utc::now();
        let mut state = ReminderState::default();
        assert!(!state.is_due(now));

        state.next_reminder = Some(now - Duration::hours(1));
        assert!(state.is_due(now));

        state.next_reminder = Some(now + Duration::hours(1));
        assert!(!state.is_due(now));
    }

    #[test]
    fn test_label() {
        let mut state = ReminderState {
            frequency: Some(ReminderFrequency::Monthly),
            ..Default::default()
        };
        assert_eq!(state.label().as_deref(), Some("Monthly"));

        state.frequency = Some(ReminderFrequency::Custom);
        state.custom_recurrence = Some(CustomRecurrence::new(10, RecurrenceUnit::Day));
        assert_eq!(state.label().as_deref(), Some("Every 10 days"));
    }
}
