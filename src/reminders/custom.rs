use chrono::{DateTime, Days, Months, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::frequency::at_reminder_hour;

/// Number of dates shown in a recurrence preview when the caller doesn't ask for more.
pub const DEFAULT_PREVIEW_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceUnit {
    Day,
    #[default]
    Week,
    Month,
    Year,
}

impl RecurrenceUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().trim_end_matches('s') {
            "day" | "d" => Some(Self::Day),
            "week" | "w" => Some(Self::Week),
            "month" | "m" => Some(Self::Month),
            "year" | "y" => Some(Self::Year),
            _ => None,
        }
    }

    /// Advance a date by `n` units. Months and years clamp to the last day of
    /// the target month. `None` only on calendar overflow.
    pub fn advance(&self, date: NaiveDate, n: u32) -> Option<NaiveDate> {
        match self {
            Self::Day => date.checked_add_days(Days::new(u64::from(n))),
            Self::Week => date.checked_add_days(Days::new(u64::from(n) * 7)),
            Self::Month => date.checked_add_months(Months::new(n)),
            Self::Year => date.checked_add_months(Months::new(n.checked_mul(12)?)),
        }
    }

    fn advance_datetime(&self, dt: NaiveDateTime, n: u32) -> Option<NaiveDateTime> {
        let date = self.advance(dt.date(), n)?;
        Some(date.and_time(dt.time()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceEnds {
    #[default]
    Never,
    On,
    After,
}

impl RecurrenceEnds {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Never => "never",
            Self::On => "on",
            Self::After => "after",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "never" => Some(Self::Never),
            "on" => Some(Self::On),
            "after" => Some(Self::After),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecurrenceError {
    #[error("interval must be at least 1")]
    ZeroInterval,
    #[error("occurrence count must be at least 1")]
    ZeroOccurrences,
    #[error("recurrence ends on a date but no end date is set")]
    MissingEndDate,
    #[error("recurrence ends after a number of occurrences but no count is set")]
    MissingOccurrences,
}

/// A user-defined repeat: every `interval` `unit`s, until `ends` says stop.
///
/// `end_date` only matters when `ends == On`, `occurrences` only when
/// `ends == After`. While a recurrence is being edited the companion field
/// may be missing; [`CustomRecurrence::validate`] is the strict check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomRecurrence {
    pub interval: u32,
    pub unit: RecurrenceUnit,
    #[serde(default)]
    pub ends: RecurrenceEnds,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurrences: Option<u32>,
}

impl CustomRecurrence {
    pub fn new(interval: u32, unit: RecurrenceUnit) -> Self {
        Self {
            interval,
            unit,
            ends: RecurrenceEnds::Never,
            end_date: None,
            occurrences: None,
        }
    }

    pub fn ending_on(mut self, date: NaiveDate) -> Self {
        self.ends = RecurrenceEnds::On;
        self.end_date = Some(date);
        self.occurrences = None;
        self
    }

    pub fn ending_after(mut self, occurrences: u32) -> Self {
        self.ends = RecurrenceEnds::After;
        self.occurrences = Some(occurrences);
        self.end_date = None;
        self
    }

    pub fn validate(&self) -> Result<(), RecurrenceError> {
        if self.interval == 0 {
            return Err(RecurrenceError::ZeroInterval);
        }
        match self.ends {
            RecurrenceEnds::Never => Ok(()),
            RecurrenceEnds::On if self.end_date.is_none() => Err(RecurrenceError::MissingEndDate),
            RecurrenceEnds::On => Ok(()),
            RecurrenceEnds::After => match self.occurrences {
                None => Err(RecurrenceError::MissingOccurrences),
                Some(0) => Err(RecurrenceError::ZeroOccurrences),
                Some(_) => Ok(()),
            },
        }
    }

    /// Whether a series that has completed `completed` reminders is over.
    pub fn is_exhausted(&self, completed: u32) -> bool {
        matches!(
            (self.ends, self.occurrences),
            (RecurrenceEnds::After, Some(n)) if completed >= n
        )
    }
}

/// Preview the next `count` dates of a custom recurrence.
///
/// Occurrence `k` (1-based) is the anchor moved by `k * interval` units, always
/// measured from the anchor, so month-end anchors don't drift. The end
/// condition is not applied here; see [`describe_recurrence_end`].
pub fn compute_next_occurrences<Tz: TimeZone>(
    recurrence: &CustomRecurrence,
    anchor: &DateTime<Tz>,
    count: usize,
) -> Vec<DateTime<Tz>> {
    let tz = anchor.timezone();
    let local = anchor.naive_local();
    let mut dates = Vec::with_capacity(count);

    for k in 1..=count {
        let Some(steps) = u32::try_from(k)
            .ok()
            .and_then(|k| k.checked_mul(recurrence.interval))
        else {
            break;
        };
        let Some(next) = recurrence.unit.advance_datetime(local, steps) else {
            break;
        };
        let next = tz
            .from_local_datetime(&next)
            .earliest()
            .unwrap_or_else(|| tz.from_utc_datetime(&next));
        dates.push(next);
    }

    dates
}

/// Persisted next reminder for a `Custom` frequency, or `None` once the series is over.
///
/// `completed` is how many reminders in the series were already marked done.
pub fn next_custom_reminder<Tz: TimeZone>(
    recurrence: &CustomRecurrence,
    anchor: &DateTime<Tz>,
    completed: u32,
) -> Option<DateTime<Tz>> {
    if recurrence.interval == 0 || recurrence.is_exhausted(completed) {
        return None;
    }
    let date = recurrence.unit.advance(anchor.date_naive(), recurrence.interval)?;
    if recurrence.ends == RecurrenceEnds::On {
        if let Some(end) = recurrence.end_date {
            if date > end {
                return None;
            }
        }
    }
    Some(at_reminder_hour(date, &anchor.timezone()))
}

/// Short description of when a recurrence stops.
///
/// Returns an empty string if the field the end condition needs is not set yet.
pub fn describe_recurrence_end(recurrence: &CustomRecurrence) -> String {
    match recurrence.ends {
        RecurrenceEnds::Never => "no end date".to_string(),
        RecurrenceEnds::On => recurrence
            .end_date
            .map(|d| format!("until {}", d.format("%b %-d, %Y")))
            .unwrap_or_default(),
        RecurrenceEnds::After => match recurrence.occurrences {
            Some(1) => "after 1 occurrence".to_string(),
            Some(n) => format!("after {} occurrences", n),
            None => String::new(),
        },
    }
}

/// "Every day", "Every 3 weeks", ...
pub fn describe_recurrence(recurrence: &CustomRecurrence) -> String {
    match recurrence.interval {
        1 => format!("Every {}", recurrence.unit.as_str()),
        n => format!("Every {} {}s", n, recurrence.unit.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Timelike, Utc};

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_unit_parse() {
        assert_eq!(RecurrenceUnit::parse("days"), Some(RecurrenceUnit::Day));
        assert_eq!(RecurrenceUnit::parse("Week"), Some(RecurrenceUnit::Week));
        assert_eq!(RecurrenceUnit::parse("months"), Some(RecurrenceUnit::Month));
        assert_eq!(RecurrenceUnit::parse("y"), Some(RecurrenceUnit::Year));
        assert_eq!(RecurrenceUnit::parse("fortnight"), None);
    }

    #[test]
    fn test_occurrences_are_cumulative() {
        let anchor = utc(2026, 1, 31, 9);
        let rec = CustomRecurrence::new(1, RecurrenceUnit::Month);
        let dates = compute_next_occurrences(&rec, &anchor, DEFAULT_PREVIEW_COUNT);

        assert_eq!(dates, vec![utc(2026, 2, 28, 9), utc(2026, 3, 31, 9), utc(2026, 4, 30, 9)]);
    }

    #[test]
    fn test_third_occurrence_is_three_intervals_out() {
        let anchor = utc(2026, 5, 17, 15);
        let cases = [
            (CustomRecurrence::new(2, RecurrenceUnit::Day), date(2026, 5, 23)),
            (CustomRecurrence::new(3, RecurrenceUnit::Week), date(2026, 7, 19)),
            (CustomRecurrence::new(5, RecurrenceUnit::Month), date(2027, 8, 17)),
            (CustomRecurrence::new(1, RecurrenceUnit::Year), date(2029, 5, 17)),
        ];
        for (rec, expected) in cases {
            let dates = compute_next_occurrences(&rec, &anchor, 3);
            assert_eq!(dates.len(), 3);
            assert_eq!(dates[2].date_naive(), expected, "{}", describe_recurrence(&rec));
            assert_eq!(
                dates[2].date_naive(),
                rec.unit.advance(anchor.date_naive(), 3 * rec.interval).unwrap()
            );
        }
    }

    #[test]
    fn test_preview_ignores_end_condition() {
        let anchor = utc(2026, 5, 1, 12);
        let rec = CustomRecurrence::new(1, RecurrenceUnit::Day).ending_after(1);
        assert_eq!(compute_next_occurrences(&rec, &anchor, 5).len(), 5);
    }

    #[test]
    fn test_year_from_leap_day() {
        assert_eq!(RecurrenceUnit::Year.advance(date(2028, 2, 29), 1), Some(date(2029, 2, 28)));
        assert_eq!(RecurrenceUnit::Year.advance(date(2028, 2, 29), 4), Some(date(2032, 2, 29)));
    }

    #[test]
    fn test_describe_end() {
        let rec = CustomRecurrence::new(1, RecurrenceUnit::Week);
        assert_eq!(describe_recurrence_end(&rec), "no end date");

        let on = rec.clone().ending_on(date(2026, 3, 5));
        assert_eq!(describe_recurrence_end(&on), "until Mar 5, 2026");

        assert_eq!(describe_recurrence_end(&rec.clone().ending_after(1)), "after 1 occurrence");
        assert_eq!(describe_recurrence_end(&rec.clone().ending_after(6)), "after 6 occurrences");
    }

    #[test]
    fn test_describe_end_mid_edit_is_empty() {
        let mut rec = CustomRecurrence::new(1, RecurrenceUnit::Week);
        rec.ends = RecurrenceEnds::On;
        assert_eq!(describe_recurrence_end(&rec), "");
        rec.ends = RecurrenceEnds::After;
        assert_eq!(describe_recurrence_end(&rec), "");
    }

    #[test]
    fn test_describe_recurrence() {
        assert_eq!(describe_recurrence(&CustomRecurrence::new(1, RecurrenceUnit::Day)), "Every day");
        assert_eq!(describe_recurrence(&CustomRecurrence::new(3, RecurrenceUnit::Week)), "Every 3 weeks");
    }

    #[test]
    fn test_validate() {
        assert!(CustomRecurrence::new(2, RecurrenceUnit::Week).validate().is_ok());
        assert_eq!(
            CustomRecurrence::new(0, RecurrenceUnit::Week).validate(),
            Err(RecurrenceError::ZeroInterval)
        );
        assert_eq!(
            CustomRecurrence::new(1, RecurrenceUnit::Week).ending_after(0).validate(),
            Err(RecurrenceError::ZeroOccurrences)
        );

        let mut rec = CustomRecurrence::new(1, RecurrenceUnit::Week);
        rec.ends = RecurrenceEnds::On;
        assert_eq!(rec.validate(), Err(RecurrenceError::MissingEndDate));
        rec.ends = RecurrenceEnds::After;
        assert_eq!(rec.validate(), Err(RecurrenceError::MissingOccurrences));
    }

    #[test]
    fn test_next_custom_reminder_at_noon() {
        let anchor = utc(2026, 5, 1, 7);
        let rec = CustomRecurrence::new(10, RecurrenceUnit::Day);
        let next = next_custom_reminder(&rec, &anchor, 0).unwrap();
        assert_eq!(next, utc(2026, 5, 11, 12));
        assert_eq!(next.hour(), 12);
    }

    #[test]
    fn test_next_custom_reminder_stops_after_end_date() {
        let anchor = utc(2026, 5, 1, 12);
        let rec = CustomRecurrence::new(1, RecurrenceUnit::Week).ending_on(date(2026, 5, 8));
        assert_eq!(next_custom_reminder(&rec, &anchor, 0), Some(utc(2026, 5, 8, 12)));

        let later = utc(2026, 5, 8, 12);
        assert_eq!(next_custom_reminder(&rec, &later, 1), None);
    }

    #[test]
    fn test_next_custom_reminder_stops_after_count() {
        let anchor = utc(2026, 5, 1, 12);
        let rec = CustomRecurrence::new(1, RecurrenceUnit::Month).ending_after(2);
        assert!(next_custom_reminder(&rec, &anchor, 0).is_some());
        assert!(next_custom_reminder(&rec, &anchor, 1).is_some());
        assert_eq!(next_custom_reminder(&rec, &anchor, 2), None);
    }

    #[test]
    fn test_json_shape() {
        let rec = CustomRecurrence::new(2, RecurrenceUnit::Month).ending_on(date(2027, 1, 1));
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "interval": 2,
                "unit": "month",
                "ends": "on",
                "endDate": "2027-01-01"
            })
        );

        let parsed: CustomRecurrence =
            serde_json::from_str(r#"{"interval":3,"unit":"day","ends":"after","occurrences":4}"#).unwrap();
        assert_eq!(parsed, CustomRecurrence::new(3, RecurrenceUnit::Day).ending_after(4));
    }
}
