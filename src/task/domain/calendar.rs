//! Calendar date value type used for planning and the automation marker.

use super::ParseCalendarDateError;
use chrono::NaiveDate;
use mockable::Clock;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const FORMAT: &str = "%Y-%m-%d";

/// A day on the calendar with no time component.
///
/// Ordering is chronological, so `a < b` means `a` is an earlier day.
///
/// # Examples
///
/// ```
/// use tasker::task::domain::CalendarDate;
///
/// let monday: CalendarDate = "2024-01-01".parse().expect("valid date");
/// let tuesday: CalendarDate = "2024-01-02".parse().expect("valid date");
/// assert!(monday < tuesday);
/// assert_eq!(tuesday.to_string(), "2024-01-02");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    /// Wraps a chrono date.
    #[must_use]
    pub const fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Builds a date from year, month, and day.
    ///
    /// Returns `None` for dates that do not exist.
    #[must_use]
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Returns the current date in the process-local time zone.
    #[must_use]
    pub fn today(clock: &impl Clock) -> Self {
        Self(clock.local().date_naive())
    }

    /// Returns the wrapped chrono date.
    #[must_use]
    pub const fn into_inner(self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for CalendarDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl FromStr for CalendarDate {
    type Err = ParseCalendarDateError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(value.trim(), FORMAT)
            .map(Self)
            .map_err(|_| ParseCalendarDateError(value.to_owned()))
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(FORMAT))
    }
}

impl Serialize for CalendarDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CalendarDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
