//! Calendar boundaries for a reference instant.
//!
//! All arithmetic happens on local calendar dates in the reference instant's
//! zone, then each date is mapped back to the instant of its local midnight.
//! That keeps weeks and months correct across DST transitions, where a day
//! can be 23 or 25 hours long.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, LocalResult, Months, NaiveDate, TimeDelta, TimeZone};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// First day of the week used for the week bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

impl WeekStart {
    /// Days between the most recent week start and `date`, in `0..7`.
    pub fn days_since(self, date: NaiveDate) -> u64 {
        let days = match self {
            WeekStart::Sunday => date.weekday().num_days_from_sunday(),
            WeekStart::Monday => date.weekday().num_days_from_monday(),
        };
        u64::from(days)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WeekStart::Sunday => "sunday",
            WeekStart::Monday => "monday",
        }
    }
}

impl fmt::Display for WeekStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WeekStart {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sunday" | "sun" => Ok(WeekStart::Sunday),
            "monday" | "mon" => Ok(WeekStart::Monday),
            other => Err(Error::InvalidArgument(format!(
                "invalid week start '{other}' (expected sunday|monday)"
            ))),
        }
    }
}

/// Bucket boundaries derived from one reference instant.
///
/// Upper bounds (`tomorrow_start`, `week_end`, `month_end`) are exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundaries<Tz: TimeZone> {
    pub now: DateTime<Tz>,
    pub today_start: DateTime<Tz>,
    pub tomorrow_start: DateTime<Tz>,
    pub week_start: DateTime<Tz>,
    pub week_end: DateTime<Tz>,
    pub month_start: DateTime<Tz>,
    pub month_end: DateTime<Tz>,
}

impl<Tz: TimeZone> Boundaries<Tz> {
    pub fn compute(now: &DateTime<Tz>, week_start: WeekStart) -> Result<Self> {
        let tz = now.timezone();
        let today = now.date_naive();

        let tomorrow = today
            .checked_add_days(Days::new(1))
            .ok_or_else(|| out_of_range(now))?;
        let week_first = today
            .checked_sub_days(Days::new(week_start.days_since(today)))
            .ok_or_else(|| out_of_range(now))?;
        let week_last = week_first
            .checked_add_days(Days::new(7))
            .ok_or_else(|| out_of_range(now))?;
        let month_first = today.with_day(1).ok_or_else(|| out_of_range(now))?;
        let next_month_first = month_first
            .checked_add_months(Months::new(1))
            .ok_or_else(|| out_of_range(now))?;

        let midnight = |date: NaiveDate| local_midnight(&tz, date).ok_or_else(|| out_of_range(now));

        let boundaries = Self {
            now: now.clone(),
            today_start: midnight(today)?,
            tomorrow_start: midnight(tomorrow)?,
            week_start: midnight(week_first)?,
            week_end: midnight(week_last)?,
            month_start: midnight(month_first)?,
            month_end: midnight(next_month_first)?,
        };

        debug_assert!(boundaries.week_start <= boundaries.today_start);
        debug_assert!(boundaries.today_start < boundaries.week_end);
        debug_assert!(boundaries.month_start <= boundaries.today_start);
        debug_assert!(boundaries.today_start < boundaries.month_end);

        Ok(boundaries)
    }
}

/// Instant of local midnight on `date`.
///
/// An ambiguous midnight resolves to the earlier instant. A midnight skipped
/// by a DST gap resolves to the first instant that exists on that day.
pub fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Option<DateTime<Tz>> {
    let midnight = date.and_hms_opt(0, 0, 0)?;
    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(instant) => Some(instant),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => (1..=96).find_map(|step| {
            let candidate = midnight.checked_add_signed(TimeDelta::minutes(15 * step))?;
            tz.from_local_datetime(&candidate).earliest()
        }),
    }
}

fn out_of_range<Tz: TimeZone>(now: &DateTime<Tz>) -> Error {
    Error::InvalidArgument(format!(
        "reference instant {} ms is outside the supported calendar range",
        now.timestamp_millis()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).single().expect("valid instant")
    }

    #[test]
    fn friday_in_march_sunday_week() {
        let now = utc(2024, 3, 15, 14, 30);
        let bounds = Boundaries::compute(&now, WeekStart::Sunday).expect("bounds");
        assert_eq!(bounds.today_start, utc(2024, 3, 15, 0, 0));
        assert_eq!(bounds.tomorrow_start, utc(2024, 3, 16, 0, 0));
        assert_eq!(bounds.week_start, utc(2024, 3, 10, 0, 0));
        assert_eq!(bounds.week_end, utc(2024, 3, 17, 0, 0));
        assert_eq!(bounds.month_start, utc(2024, 3, 1, 0, 0));
        assert_eq!(bounds.month_end, utc(2024, 4, 1, 0, 0));
    }

    #[test]
    fn monday_week_start() {
        let now = utc(2024, 3, 15, 14, 30);
        let bounds = Boundaries::compute(&now, WeekStart::Monday).expect("bounds");
        assert_eq!(bounds.week_start, utc(2024, 3, 11, 0, 0));
        assert_eq!(bounds.week_end, utc(2024, 3, 18, 0, 0));
    }

    #[test]
    fn sunday_is_its_own_week_start() {
        let now = utc(2024, 3, 10, 0, 0);
        let bounds = Boundaries::compute(&now, WeekStart::Sunday).expect("bounds");
        assert_eq!(bounds.week_start, bounds.today_start);
        assert_eq!(bounds.week_end, utc(2024, 3, 17, 0, 0));
    }

    #[test]
    fn december_rolls_into_next_year() {
        let now = utc(2023, 12, 31, 23, 59);
        let bounds = Boundaries::compute(&now, WeekStart::Sunday).expect("bounds");
        assert_eq!(bounds.month_start, utc(2023, 12, 1, 0, 0));
        assert_eq!(bounds.month_end, utc(2024, 1, 1, 0, 0));
        assert_eq!(bounds.week_end, utc(2024, 1, 7, 0, 0));
    }

    #[test]
    fn local_day_differs_from_utc_day() {
        // 2024-03-15T23:30Z is already Saturday the 16th in UTC+02:00.
        let tz = FixedOffset::east_opt(2 * 3600).expect("offset");
        let now = utc(2024, 3, 15, 23, 30).with_timezone(&tz);
        let bounds = Boundaries::compute(&now, WeekStart::Sunday).expect("bounds");
        assert_eq!(bounds.today_start, utc(2024, 3, 15, 22, 0));
        assert_eq!(bounds.week_start, utc(2024, 3, 9, 22, 0));
    }

    #[test]
    fn dst_week_is_computed_on_local_dates() {
        let tz = chrono_tz::America::New_York;
        let now = utc(2024, 3, 13, 16, 0).with_timezone(&tz);
        let bounds = Boundaries::compute(&now, WeekStart::Sunday).expect("bounds");
        // EST before the switch, EDT after it.
        assert_eq!(bounds.week_start, utc(2024, 3, 10, 5, 0));
        assert_eq!(bounds.week_end, utc(2024, 3, 17, 4, 0));
        assert_eq!(
            (bounds.week_end.clone() - bounds.week_start.clone()).num_hours(),
            167
        );
    }

    #[test]
    fn skipped_midnight_resolves_to_first_existing_instant() {
        // Santiago springs forward at local midnight: 2024-09-08 00:00 does not exist.
        let tz = chrono_tz::America::Santiago;
        let date = NaiveDate::from_ymd_opt(2024, 9, 8).expect("date");
        let start = local_midnight(&tz, date).expect("midnight");
        assert_eq!(start.date_naive(), date);
        assert_eq!(start.with_timezone(&Utc), utc(2024, 9, 8, 4, 0));
    }

    #[test]
    fn ambiguous_midnight_takes_the_earlier_instant() {
        // Havana falls back at 01:00 CDT: 2024-11-03 00:00 happens twice.
        let tz = chrono_tz::America::Havana;
        let date = NaiveDate::from_ymd_opt(2024, 11, 3).expect("date");
        let midnight = date.and_hms_opt(0, 0, 0).expect("midnight");
        assert!(matches!(
            tz.from_local_datetime(&midnight),
            LocalResult::Ambiguous(..)
        ));

        let start = local_midnight(&tz, date).expect("midnight");
        assert_eq!(start.with_timezone(&Utc), utc(2024, 11, 3, 4, 0));
    }

    #[test]
    fn week_start_parses_names() {
        assert_eq!("Monday".parse::<WeekStart>().expect("parse"), WeekStart::Monday);
        assert_eq!("sun".parse::<WeekStart>().expect("parse"), WeekStart::Sunday);
        assert!("friday".parse::<WeekStart>().is_err());
    }
}
