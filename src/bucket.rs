//! Deadline bucketing: today, this week, this month.
//!
//! The selectors are pure functions of a task collection, a reference
//! instant and a [`BucketPolicy`]. Boundaries are recomputed on every call,
//! so a long-lived [`Bucketizer`] never holds stale dates across midnight.
//!
//! Two policy knobs exist for compatibility with the mobile app's selectors:
//!
//! - [`TodayMatch::ExactMidnight`] (default) only matches deadlines equal to
//!   local midnight to the millisecond. [`TodayMatch::DayRange`] matches the
//!   whole local day.
//! - [`RangeMode::FullEpoch`] (default) compares week/month deadlines against
//!   full epoch timestamps, half-open. [`RangeMode::SubsecondLegacy`]
//!   compares against the boundaries' sub-second millisecond component
//!   (0..=999), inclusive on both ends. Boundaries sit on midnight, so in
//!   practice that range is `[0, 0]`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::boundaries::{Boundaries, WeekStart};
use crate::error::{Error, Result};
use crate::task::{Task, TaskCollection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Today,
    Week,
    Month,
}

impl Bucket {
    pub const ALL: [Bucket; 3] = [Bucket::Today, Bucket::Week, Bucket::Month];

    pub fn as_str(self) -> &'static str {
        match self {
            Bucket::Today => "today",
            Bucket::Week => "week",
            Bucket::Month => "month",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a deadline qualifies for the today bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TodayMatch {
    #[default]
    ExactMidnight,
    DayRange,
}

impl TodayMatch {
    pub fn as_str(self) -> &'static str {
        match self {
            TodayMatch::ExactMidnight => "exact-midnight",
            TodayMatch::DayRange => "day-range",
        }
    }
}

impl fmt::Display for TodayMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TodayMatch {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "exact-midnight" | "exact" => Ok(TodayMatch::ExactMidnight),
            "day-range" | "day" => Ok(TodayMatch::DayRange),
            other => Err(Error::InvalidArgument(format!(
                "invalid today match '{other}' (expected exact-midnight|day-range)"
            ))),
        }
    }
}

/// How week and month ranges compare deadlines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RangeMode {
    #[default]
    FullEpoch,
    SubsecondLegacy,
}

impl RangeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            RangeMode::FullEpoch => "full-epoch",
            RangeMode::SubsecondLegacy => "subsecond-legacy",
        }
    }
}

impl fmt::Display for RangeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RangeMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "full-epoch" | "epoch" => Ok(RangeMode::FullEpoch),
            "subsecond-legacy" | "legacy" => Ok(RangeMode::SubsecondLegacy),
            other => Err(Error::InvalidArgument(format!(
                "invalid range mode '{other}' (expected full-epoch|subsecond-legacy)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketPolicy {
    #[serde(default)]
    pub today: TodayMatch,
    #[serde(default)]
    pub range: RangeMode,
    #[serde(default)]
    pub week_start: WeekStart,
}

/// The buckets a single task falls into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BucketSet {
    pub today: bool,
    pub week: bool,
    pub month: bool,
}

impl BucketSet {
    pub fn contains(&self, bucket: Bucket) -> bool {
        match bucket {
            Bucket::Today => self.today,
            Bucket::Week => self.week,
            Bucket::Month => self.month,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.today || self.week || self.month)
    }

    pub fn iter(&self) -> impl Iterator<Item = Bucket> + '_ {
        Bucket::ALL.into_iter().filter(|bucket| self.contains(*bucket))
    }
}

/// All three buckets computed against one boundary set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketReport<'a> {
    pub today: Vec<&'a Task>,
    pub week: Vec<&'a Task>,
    pub month: Vec<&'a Task>,
}

impl<'a> BucketReport<'a> {
    pub fn get(&self, bucket: Bucket) -> &[&'a Task] {
        match bucket {
            Bucket::Today => &self.today,
            Bucket::Week => &self.week,
            Bucket::Month => &self.month,
        }
    }
}

/// Does `deadline` fall into `bucket` for these boundaries?
pub fn bucket_contains<Tz: TimeZone>(
    policy: &BucketPolicy,
    bounds: &Boundaries<Tz>,
    bucket: Bucket,
    deadline: i64,
) -> bool {
    match bucket {
        Bucket::Today => match policy.today {
            TodayMatch::ExactMidnight => deadline == bounds.today_start.timestamp_millis(),
            TodayMatch::DayRange => {
                bounds.today_start.timestamp_millis() <= deadline
                    && deadline < bounds.tomorrow_start.timestamp_millis()
            }
        },
        Bucket::Week => in_range(policy.range, &bounds.week_start, &bounds.week_end, deadline),
        Bucket::Month => in_range(policy.range, &bounds.month_start, &bounds.month_end, deadline),
    }
}

fn in_range<Tz: TimeZone>(
    mode: RangeMode,
    start: &DateTime<Tz>,
    end: &DateTime<Tz>,
    deadline: i64,
) -> bool {
    match mode {
        RangeMode::FullEpoch => {
            start.timestamp_millis() <= deadline && deadline < end.timestamp_millis()
        }
        RangeMode::SubsecondLegacy => {
            i64::from(start.timestamp_subsec_millis()) <= deadline
                && deadline <= i64::from(end.timestamp_subsec_millis())
        }
    }
}

pub fn classify<Tz: TimeZone>(
    policy: &BucketPolicy,
    bounds: &Boundaries<Tz>,
    task: &Task,
) -> BucketSet {
    BucketSet {
        today: bucket_contains(policy, bounds, Bucket::Today, task.deadline),
        week: bucket_contains(policy, bounds, Bucket::Week, task.deadline),
        month: bucket_contains(policy, bounds, Bucket::Month, task.deadline),
    }
}

/// Classifies tasks in a fixed zone under a fixed policy.
#[derive(Debug, Clone)]
pub struct Bucketizer<Tz: TimeZone> {
    tz: Tz,
    policy: BucketPolicy,
}

impl<Tz: TimeZone> Bucketizer<Tz> {
    pub fn new(tz: Tz, policy: BucketPolicy) -> Self {
        Self { tz, policy }
    }

    pub fn policy(&self) -> &BucketPolicy {
        &self.policy
    }

    pub fn timezone(&self) -> &Tz {
        &self.tz
    }

    /// The current instant from the system clock, in this bucketizer's zone.
    pub fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.tz)
    }

    /// Boundaries for `now`, converted into this bucketizer's zone first.
    pub fn boundaries_at<Z: TimeZone>(&self, now: &DateTime<Z>) -> Result<Boundaries<Tz>> {
        Boundaries::compute(&now.with_timezone(&self.tz), self.policy.week_start)
    }

    pub fn select_at<'a, Z: TimeZone>(
        &self,
        collection: &'a TaskCollection,
        bucket: Bucket,
        now: &DateTime<Z>,
    ) -> Result<Vec<&'a Task>> {
        let bounds = self.boundaries_at(now)?;
        Ok(self.select_with(collection, bucket, &bounds))
    }

    /// Filter `collection` against precomputed boundaries, keeping order.
    pub fn select_with<'a>(
        &self,
        collection: &'a TaskCollection,
        bucket: Bucket,
        bounds: &Boundaries<Tz>,
    ) -> Vec<&'a Task> {
        collection
            .iter()
            .filter(|task| bucket_contains(&self.policy, bounds, bucket, task.deadline))
            .collect()
    }

    pub fn select_tasks_for_today_at<'a, Z: TimeZone>(
        &self,
        collection: &'a TaskCollection,
        now: &DateTime<Z>,
    ) -> Result<Vec<&'a Task>> {
        self.select_at(collection, Bucket::Today, now)
    }

    pub fn select_tasks_for_week_at<'a, Z: TimeZone>(
        &self,
        collection: &'a TaskCollection,
        now: &DateTime<Z>,
    ) -> Result<Vec<&'a Task>> {
        self.select_at(collection, Bucket::Week, now)
    }

    pub fn select_tasks_for_month_at<'a, Z: TimeZone>(
        &self,
        collection: &'a TaskCollection,
        now: &DateTime<Z>,
    ) -> Result<Vec<&'a Task>> {
        self.select_at(collection, Bucket::Month, now)
    }

    /// Tasks due today, with the reference instant read from the system clock.
    pub fn select_tasks_for_today<'a>(
        &self,
        collection: &'a TaskCollection,
    ) -> Result<Vec<&'a Task>> {
        self.select_tasks_for_today_at(collection, &self.now())
    }

    pub fn select_tasks_for_week<'a>(
        &self,
        collection: &'a TaskCollection,
    ) -> Result<Vec<&'a Task>> {
        self.select_tasks_for_week_at(collection, &self.now())
    }

    pub fn select_tasks_for_month<'a>(
        &self,
        collection: &'a TaskCollection,
    ) -> Result<Vec<&'a Task>> {
        self.select_tasks_for_month_at(collection, &self.now())
    }

    pub fn report_at<'a, Z: TimeZone>(
        &self,
        collection: &'a TaskCollection,
        now: &DateTime<Z>,
    ) -> Result<BucketReport<'a>> {
        let bounds = self.boundaries_at(now)?;
        Ok(self.report_with(collection, &bounds))
    }

    pub fn report_with<'a>(
        &self,
        collection: &'a TaskCollection,
        bounds: &Boundaries<Tz>,
    ) -> BucketReport<'a> {
        let mut report = BucketReport {
            today: Vec::new(),
            week: Vec::new(),
            month: Vec::new(),
        };
        for task in collection {
            let set = classify(&self.policy, bounds, task);
            if set.today {
                report.today.push(task);
            }
            if set.week {
                report.week.push(task);
            }
            if set.month {
                report.month.push(task);
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 9, 45, 0)
            .single()
            .expect("valid instant")
    }

    fn midnight(y: i32, m: u32, d: u32) -> i64 {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0)
            .single()
            .expect("valid instant")
            .timestamp_millis()
    }

    #[test]
    fn classify_midnight_today_hits_every_bucket() {
        let policy = BucketPolicy::default();
        let bounds = Boundaries::compute(&now(), policy.week_start).expect("bounds");
        let task = Task::new("a", midnight(2024, 3, 15));
        let set = classify(&policy, &bounds, &task);
        assert_eq!(set.iter().collect::<Vec<_>>(), Bucket::ALL.to_vec());
    }

    #[test]
    fn classify_next_month_is_empty() {
        let policy = BucketPolicy::default();
        let bounds = Boundaries::compute(&now(), policy.week_start).expect("bounds");
        let set = classify(&policy, &bounds, &Task::new("a", midnight(2024, 4, 1)));
        assert!(set.is_empty());
    }

    #[test]
    fn week_end_is_exclusive_in_full_epoch_mode() {
        let policy = BucketPolicy::default();
        let bounds = Boundaries::compute(&now(), policy.week_start).expect("bounds");
        let end = bounds.week_end.timestamp_millis();
        assert!(bucket_contains(&policy, &bounds, Bucket::Week, end - 1));
        assert!(!bucket_contains(&policy, &bounds, Bucket::Week, end));
        let start = bounds.week_start.timestamp_millis();
        assert!(bucket_contains(&policy, &bounds, Bucket::Week, start));
        assert!(!bucket_contains(&policy, &bounds, Bucket::Week, start - 1));
    }

    #[test]
    fn legacy_range_only_sees_subsecond_components() {
        let policy = BucketPolicy {
            range: RangeMode::SubsecondLegacy,
            ..BucketPolicy::default()
        };
        let bounds = Boundaries::compute(&now(), policy.week_start).expect("bounds");
        assert!(bucket_contains(&policy, &bounds, Bucket::Week, 0));
        assert!(bucket_contains(&policy, &bounds, Bucket::Month, 0));
        assert!(!bucket_contains(&policy, &bounds, Bucket::Week, 1));
        assert!(!bucket_contains(
            &policy,
            &bounds,
            Bucket::Month,
            midnight(2024, 3, 15)
        ));
    }

    #[test]
    fn day_range_covers_whole_local_day() {
        let policy = BucketPolicy {
            today: TodayMatch::DayRange,
            ..BucketPolicy::default()
        };
        let bounds = Boundaries::compute(&now(), policy.week_start).expect("bounds");
        let start = midnight(2024, 3, 15);
        let tomorrow = midnight(2024, 3, 16);
        assert!(bucket_contains(&policy, &bounds, Bucket::Today, start));
        assert!(bucket_contains(&policy, &bounds, Bucket::Today, start + 1));
        assert!(bucket_contains(&policy, &bounds, Bucket::Today, tomorrow - 1));
        assert!(!bucket_contains(&policy, &bounds, Bucket::Today, tomorrow));
    }

    #[test]
    fn modes_parse_from_strings() {
        assert_eq!(
            "day-range".parse::<TodayMatch>().expect("parse"),
            TodayMatch::DayRange
        );
        assert_eq!(
            "legacy".parse::<RangeMode>().expect("parse"),
            RangeMode::SubsecondLegacy
        );
        assert!("sometimes".parse::<TodayMatch>().is_err());
        assert!("nanos".parse::<RangeMode>().is_err());
    }
}
