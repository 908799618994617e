use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};

use super::custom::RecurrenceUnit;

/// Hour of day (in the anchor's time zone) every computed reminder lands on.
pub const REMINDER_HOUR: u32 = 12;

/// How often a contact should be reminded to get in touch.
///
/// Stored and displayed by label (`"Every 2 weeks"`). `Custom` carries no
/// period of its own; its schedule lives in a [`super::CustomRecurrence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReminderFrequency {
    #[serde(rename = "Every week")]
    EveryWeek,
    #[serde(rename = "Every 2 weeks")]
    EveryTwoWeeks,
    #[serde(rename = "Monthly")]
    Monthly,
    #[serde(rename = "Every 2 months")]
    EveryTwoMonths,
    #[serde(rename = "Every 3 months")]
    EveryThreeMonths,
    #[serde(rename = "Custom")]
    Custom,
}

impl ReminderFrequency {
    pub const ALL: [Self; 6] = [
        Self::EveryWeek,
        Self::EveryTwoWeeks,
        Self::Monthly,
        Self::EveryTwoMonths,
        Self::EveryThreeMonths,
        Self::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EveryWeek => "Every week",
            Self::EveryTwoWeeks => "Every 2 weeks",
            Self::Monthly => "Monthly",
            Self::EveryTwoMonths => "Every 2 months",
            Self::EveryThreeMonths => "Every 3 months",
            Self::Custom => "Custom",
        }
    }

    /// Exact stored label, e.g. `"Every 2 weeks"`. Case and spacing must match.
    pub fn from_label(s: &str) -> Option<Self> {
        Self::ALL.iter().find(|f| f.as_str() == s).copied()
    }

    /// Parse a label or a command-line shorthand (`weekly`, `quarterly`, ...).
    /// Returns `None` for anything unrecognized.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Some(f) = Self::from_label(s) {
            return Some(f);
        }
        match s.to_lowercase().as_str() {
            "every week" | "weekly" | "1w" => Some(Self::EveryWeek),
            "every 2 weeks" | "biweekly" | "fortnightly" | "2w" => Some(Self::EveryTwoWeeks),
            "monthly" | "every month" | "1m" => Some(Self::Monthly),
            "every 2 months" | "bimonthly" | "2m" => Some(Self::EveryTwoMonths),
            "every 3 months" | "quarterly" | "3m" => Some(Self::EveryThreeMonths),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }

    /// Fixed step between reminders, or `None` for `Custom`.
    pub fn period(&self) -> Option<(u32, RecurrenceUnit)> {
        match self {
            Self::EveryWeek => Some((1, RecurrenceUnit::Week)),
            Self::EveryTwoWeeks => Some((2, RecurrenceUnit::Week)),
            Self::Monthly => Some((1, RecurrenceUnit::Month)),
            Self::EveryTwoMonths => Some((2, RecurrenceUnit::Month)),
            Self::EveryThreeMonths => Some((3, RecurrenceUnit::Month)),
            Self::Custom => None,
        }
    }

    /// Next reminder after `anchor`: one period later, at [`REMINDER_HOUR`].
    ///
    /// `Custom` has no fixed period and returns the anchor unchanged.
    pub fn next_after<Tz: TimeZone>(&self, anchor: &DateTime<Tz>) -> DateTime<Tz> {
        let Some((n, unit)) = self.period() else {
            return anchor.clone();
        };
        match unit.advance(anchor.date_naive(), n) {
            Some(date) => at_reminder_hour(date, &anchor.timezone()),
            None => anchor.clone(),
        }
    }
}

impl std::fmt::Display for ReminderFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compute the next reminder for a stored frequency label.
///
/// Only the exact labels of [`ReminderFrequency`] are recognized; shorthands
/// such as `weekly` are for user input only. Unrecognized labels are not an error: the anchor comes back unchanged so
/// old or hand-edited data never blocks the reminder workflow.
pub fn compute_next_reminder<Tz: TimeZone>(frequency: &str, anchor: &DateTime<Tz>) -> DateTime<Tz> {
    match ReminderFrequency::from_label(frequency) {
        Some(f) => f.next_after(anchor),
        None => {
            log::debug!("unrecognized reminder frequency {:?}, keeping anchor", frequency);
            anchor.clone()
        }
    }
}

/// `date` at the reminder hour in `tz`.
pub(crate) fn at_reminder_hour<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Tz> {
    let time = NaiveTime::from_hms_opt(REMINDER_HOUR, 0, 0).unwrap_or(NaiveTime::MIN);
    let naive = date.and_time(time);
    // Noon can only be missing on a zone that skips it entirely; read it as UTC then.
    tz.from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| tz.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset, Timelike, Utc};

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_parse_labels_and_shorthands() {
        for f in ReminderFrequency::ALL {
            assert_eq!(ReminderFrequency::parse(f.as_str()), Some(f));
        }
        assert_eq!(ReminderFrequency::parse("weekly"), Some(ReminderFrequency::EveryWeek));
        assert_eq!(ReminderFrequency::parse("Quarterly"), Some(ReminderFrequency::EveryThreeMonths));
        assert_eq!(ReminderFrequency::parse("Every 4 weeks"), None);
        assert_eq!(ReminderFrequency::from_label("weekly"), None);
        assert_eq!(ReminderFrequency::from_label("monthly"), None);
        assert_eq!(ReminderFrequency::from_label("Monthly"), Some(ReminderFrequency::Monthly));
        assert_eq!(ReminderFrequency::parse(""), None);
    }

    #[test]
    fn test_serde_uses_labels() {
        let json = serde_json::to_string(&ReminderFrequency::EveryTwoWeeks).unwrap();
        assert_eq!(json, "\"Every 2 weeks\"");
        let back: ReminderFrequency = serde_json::from_str("\"Every 3 months\"").unwrap();
        assert_eq!(back, ReminderFrequency::EveryThreeMonths);
    }

    #[test]
    fn test_fixed_periods() {
        let anchor = utc(2026, 3, 10, 8, 30);
        assert_eq!(compute_next_reminder("Every week", &anchor), utc(2026, 3, 17, 12, 0));
        assert_eq!(compute_next_reminder("Every 2 weeks", &anchor), utc(2026, 3, 24, 12, 0));
        assert_eq!(compute_next_reminder("Monthly", &anchor), utc(2026, 4, 10, 12, 0));
        assert_eq!(compute_next_reminder("Every 2 months", &anchor), utc(2026, 5, 10, 12, 0));
        assert_eq!(compute_next_reminder("Every 3 months", &anchor), utc(2026, 6, 10, 12, 0));
    }

    #[test]
    fn test_result_is_after_anchor_at_noon() {
        let anchors = [
            utc(2026, 1, 1, 0, 0),
            utc(2026, 6, 15, 12, 0),
            utc(2026, 12, 31, 23, 59),
        ];
        for anchor in anchors {
            for f in ReminderFrequency::ALL.iter().filter(|f| f.period().is_some()) {
                let next = f.next_after(&anchor);
                assert!(next > anchor, "{} from {}", f, anchor);
                assert_eq!(next.hour(), REMINDER_HOUR);
                assert_eq!(next.minute(), 0);
                assert_eq!(next.second(), 0);
            }
        }
    }

    #[test]
    fn test_month_end_clamps() {
        let jan31 = utc(2026, 1, 31, 9, 0);
        assert_eq!(compute_next_reminder("Monthly", &jan31), utc(2026, 2, 28, 12, 0));

        let leap = utc(2028, 1, 31, 9, 0);
        assert_eq!(compute_next_reminder("Monthly", &leap), utc(2028, 2, 29, 12, 0));

        let nov30 = utc(2026, 11, 30, 9, 0);
        assert_eq!(compute_next_reminder("Every 3 months", &nov30), utc(2027, 2, 28, 12, 0));
    }

    #[test]
    fn test_unrecognized_frequency_keeps_anchor() {
        let anchor = utc(2026, 3, 10, 8, 30);
        assert_eq!(compute_next_reminder("Every fortnight-ish", &anchor), anchor);
        assert_eq!(compute_next_reminder("Custom", &anchor), anchor);
        assert_eq!(compute_next_reminder("weekly", &anchor), anchor);
        assert_eq!(compute_next_reminder("monthly", &anchor), anchor);
        assert_eq!(compute_next_reminder(" Every week", &anchor), anchor);
    }

    #[test]
    fn test_two_single_weeks_differ_from_two_weeks_when_crossing_midnight() {
        // Noon in UTC+14 is the previous day in UTC, so renormalising on every
        // call shifts the calendar date between the two routes.
        let tz = FixedOffset::east_opt(14 * 3600).unwrap();
        let anchor = tz.with_ymd_and_hms(2026, 3, 10, 23, 0, 0).unwrap();

        let two_weeks = compute_next_reminder("Every 2 weeks", &anchor);
        let stepped = compute_next_reminder(
            "Every week",
            &compute_next_reminder("Every week", &anchor).with_timezone(&Utc),
        );

        assert_eq!(two_weeks.hour(), REMINDER_HOUR);
        assert_ne!(two_weeks.with_timezone(&Utc), stepped);
    }

    #[test]
    fn test_time_of_day_is_dropped() {
        let morning = utc(2026, 3, 10, 0, 1);
        let evening = utc(2026, 3, 10, 23, 59);
        let a = compute_next_reminder("Every week", &morning);
        let b = compute_next_reminder("Every week", &evening);
        assert_eq!(a, b);
        assert_eq!(a - morning, Duration::days(7) + Duration::minutes(11 * 60 + 59));
    }

    #[test]
    fn test_noon_in_offset_zone() {
        let tz = FixedOffset::west_opt(5 * 3600).unwrap();
        let anchor = tz.with_ymd_and_hms(2026, 7, 1, 22, 0, 0).unwrap();
        let next = compute_next_reminder("Every week", &anchor);
        assert_eq!(next, tz.with_ymd_and_hms(2026, 7, 8, 12, 0, 0).unwrap());
    }
}
