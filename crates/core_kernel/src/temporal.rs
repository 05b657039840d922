//! Calendar arithmetic for underwriting
//!
//! Predicates such as "diagnosed more than 5 years ago" compare a recorded
//! date against the evaluation date. The evaluation date is a calendar day in
//! the carrier's jurisdiction, so this module provides:
//! - `Timezone`: jurisdiction wrapper that yields "today"
//! - `ElapsedUnit` and `elapsed_between`: calendar-complete elapsed time
//! - `parse_calendar_date`: lenient parsing of questionnaire date answers

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Timezone wrapper for carrier jurisdictions
///
/// Wraps chrono_tz::Tz with custom serialization support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timezone(pub Tz);

impl Serialize for Timezone {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.0.name())
    }
}

impl<'de> Deserialize<'de> for Timezone {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Tz::from_str(&s)
            .map(Timezone)
            .map_err(|_| serde::de::Error::custom(format!("Invalid timezone: {}", s)))
    }
}

impl FromStr for Timezone {
    type Err = TemporalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tz::from_str(s.trim())
            .map(Timezone)
            .map_err(|_| TemporalError::InvalidTimezone(s.to_string()))
    }
}

impl Timezone {
    pub fn new(tz: Tz) -> Self {
        Self(tz)
    }

    /// Returns the calendar date of a UTC instant in this timezone
    pub fn date_of(&self, utc: DateTime<Utc>) -> NaiveDate {
        utc.with_timezone(&self.0).date_naive()
    }

    /// Returns today's calendar date in this timezone
    pub fn today(&self) -> NaiveDate {
        self.date_of(Utc::now())
    }
}

impl fmt::Display for Timezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.name())
    }
}

impl Default for Timezone {
    fn default() -> Self {
        Self(chrono_tz::UTC)
    }
}

/// Errors related to temporal operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemporalError {
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Unknown elapsed-time unit: {0}")]
    UnknownUnit(String),

    #[error("Unparseable date: {0}")]
    InvalidDate(String),
}

/// Unit used when measuring time elapsed since a recorded date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElapsedUnit {
    Days,
    Months,
    Years,
}

impl ElapsedUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElapsedUnit::Days => "days",
            ElapsedUnit::Months => "months",
            ElapsedUnit::Years => "years",
        }
    }
}

impl fmt::Display for ElapsedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElapsedUnit {
    type Err = TemporalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "days" => Ok(ElapsedUnit::Days),
            "months" => Ok(ElapsedUnit::Months),
            "years" => Ok(ElapsedUnit::Years),
            other => Err(TemporalError::UnknownUnit(other.to_string())),
        }
    }
}

/// Counts whole units elapsed from `from` to `to`
///
/// Months and years are calendar-complete: 2020-03-15 to 2021-03-14 is
/// 11 months and 0 years, one day later it is 12 months and 1 year.
/// The result is negative when `from` is after `to`.
pub fn elapsed_between(from: NaiveDate, to: NaiveDate, unit: ElapsedUnit) -> i64 {
    match unit {
        ElapsedUnit::Days => (to - from).num_days(),
        ElapsedUnit::Months => complete_months(from, to),
        ElapsedUnit::Years => complete_months(from, to).div_euclid(12),
    }
}

fn complete_months(from: NaiveDate, to: NaiveDate) -> i64 {
    if from > to {
        return -complete_months(to, from);
    }
    let mut months = (i64::from(to.year()) - i64::from(from.year())) * 12
        + (i64::from(to.month()) - i64::from(from.month()));
    if to.day() < from.day() {
        months -= 1;
    }
    months
}

/// Fractional years from `date` to `as_of`, floored to one decimal place
///
/// Returns `None` for dates after `as_of`.
pub fn years_since(date: NaiveDate, as_of: NaiveDate) -> Option<f64> {
    let days = (as_of - date).num_days();
    if days < 0 {
        return None;
    }
    let years = days as f64 / 365.25;
    Some((years * 10.0).floor() / 10.0)
}

/// Parses a questionnaire date answer
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps, `MM/DD/YYYY` and `YYYY-MM`
/// (first of the month).
pub fn parse_calendar_date(input: &str) -> Result<NaiveDate, TemporalError> {
    let trimmed = input.trim();

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(timestamp.with_timezone(&Utc).date_naive());
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%m/%d/%Y") {
        return Ok(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{}-01", trimmed), "%Y-%m-%d") {
        return Ok(date);
    }

    Err(TemporalError::InvalidDate(input.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_months_are_calendar_complete() {
        assert_eq!(elapsed_between(date(2020, 3, 15), date(2021, 3, 14), ElapsedUnit::Months), 11);
        assert_eq!(elapsed_between(date(2020, 3, 15), date(2021, 3, 15), ElapsedUnit::Months), 12);
    }

    #[test]
    fn test_years_before_anniversary() {
        assert_eq!(elapsed_between(date(2019, 6, 30), date(2024, 6, 29), ElapsedUnit::Years), 4);
        assert_eq!(elapsed_between(date(2019, 6, 30), date(2024, 6, 30), ElapsedUnit::Years), 5);
    }

    #[test]
    fn test_future_dates_are_negative() {
        assert_eq!(elapsed_between(date(2025, 1, 1), date(2024, 1, 1), ElapsedUnit::Years), -1);
        assert_eq!(elapsed_between(date(2024, 1, 10), date(2024, 1, 1), ElapsedUnit::Days), -9);
    }

    #[test]
    fn test_years_since_floors_to_one_decimal() {
        assert_eq!(years_since(date(2020, 1, 1), date(2022, 1, 1)), Some(2.0));
        assert_eq!(years_since(date(2024, 1, 2), date(2024, 1, 1)), None);
    }

    #[test]
    fn test_parse_calendar_date_formats() {
        assert_eq!(parse_calendar_date("2021-04-05").unwrap(), date(2021, 4, 5));
        assert_eq!(parse_calendar_date("04/05/2021").unwrap(), date(2021, 4, 5));
        assert_eq!(parse_calendar_date("2021-04").unwrap(), date(2021, 4, 1));
        assert_eq!(
            parse_calendar_date("2021-04-05T10:00:00Z").unwrap(),
            date(2021, 4, 5)
        );
        assert!(parse_calendar_date("last spring").is_err());
    }

    proptest! {
        #[test]
        fn years_never_exceed_months_over_twelve(
            start in 0i64..30_000,
            span in 0i64..20_000,
        ) {
            let from = date(1950, 1, 1) + chrono::Duration::days(start);
            let to = from + chrono::Duration::days(span);
            let months = elapsed_between(from, to, ElapsedUnit::Months);
            let years = elapsed_between(from, to, ElapsedUnit::Years);
            prop_assert!(months >= 0);
            prop_assert_eq!(years, months / 12);
        }
    }
}
