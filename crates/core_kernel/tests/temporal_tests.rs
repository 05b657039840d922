//! Unit tests for the Temporal module
//!
//! Tests cover Timezone handling, elapsed-time units, calendar-complete
//! elapsed arithmetic and questionnaire date parsing.

use chrono::{NaiveDate, TimeZone, Utc};
use core_kernel::temporal::TemporalError;
use core_kernel::{elapsed_between, parse_calendar_date, years_since, ElapsedUnit, Timezone};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

mod timezone {
    use super::*;

    #[test]
    fn test_default_is_utc() {
        assert_eq!(Timezone::default().0, chrono_tz::UTC);
    }

    #[test]
    fn test_parses_iana_name() {
        let tz: Timezone = "America/Chicago".parse().unwrap();
        assert_eq!(tz.0, chrono_tz::America::Chicago);
    }

    #[test]
    fn test_rejects_unknown_name() {
        let result: Result<Timezone, _> = "Nowhere/Special".parse();
        assert!(matches!(result, Err(TemporalError::InvalidTimezone(_))));
    }

    #[test]
    fn test_date_of_crosses_midnight() {
        let tz: Timezone = "America/New_York".parse().unwrap();
        let utc = Utc.with_ymd_and_hms(2024, 3, 1, 2, 0, 0).unwrap();
        assert_eq!(tz.date_of(utc), date(2024, 2, 29));
    }

    #[test]
    fn test_serde_round_trip() {
        let tz: Timezone = "Europe/London".parse().unwrap();
        let json = serde_json::to_string(&tz).unwrap();
        assert_eq!(json, "\"Europe/London\"");
        let back: Timezone = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tz);
    }
}

mod elapsed_unit {
    use super::*;

    #[test]
    fn test_parses_known_units() {
        assert_eq!("days".parse::<ElapsedUnit>().unwrap(), ElapsedUnit::Days);
        assert_eq!("months".parse::<ElapsedUnit>().unwrap(), ElapsedUnit::Months);
        assert_eq!("years".parse::<ElapsedUnit>().unwrap(), ElapsedUnit::Years);
    }

    #[test]
    fn test_rejects_unknown_unit() {
        assert!(matches!(
            "weeks".parse::<ElapsedUnit>(),
            Err(TemporalError::UnknownUnit(_))
        ));
    }
}

mod elapsed {
    use super::*;

    #[test]
    fn test_days_between() {
        assert_eq!(elapsed_between(date(2024, 1, 1), date(2024, 3, 1), ElapsedUnit::Days), 60);
    }

    #[test]
    fn test_month_end_to_shorter_month() {
        // Jan 31 -> Feb 29 has not completed a calendar month
        assert_eq!(elapsed_between(date(2024, 1, 31), date(2024, 2, 29), ElapsedUnit::Months), 0);
        assert_eq!(elapsed_between(date(2024, 1, 31), date(2024, 3, 31), ElapsedUnit::Months), 2);
    }

    #[test]
    fn test_same_day_is_zero() {
        let d = date(2023, 7, 4);
        assert_eq!(elapsed_between(d, d, ElapsedUnit::Years), 0);
        assert_eq!(elapsed_between(d, d, ElapsedUnit::Months), 0);
        assert_eq!(elapsed_between(d, d, ElapsedUnit::Days), 0);
    }

    #[test]
    fn test_years_since_fractional() {
        assert_eq!(years_since(date(2020, 1, 1), date(2023, 7, 2)), Some(3.4));
    }

    #[test]
    fn test_years_since_today_is_zero() {
        assert_eq!(years_since(date(2024, 5, 5), date(2024, 5, 5)), Some(0.0));
    }
}

mod parsing {
    use super::*;

    #[test]
    fn test_trims_whitespace() {
        assert_eq!(parse_calendar_date("  2019-02-03 ").unwrap(), date(2019, 2, 3));
    }

    #[test]
    fn test_rejects_impossible_date() {
        assert!(matches!(
            parse_calendar_date("2019-02-30"),
            Err(TemporalError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_rejects_empty() {
        assert!(parse_calendar_date("").is_err());
    }
}
