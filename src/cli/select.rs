//! taskbucket today/week/month/report command implementations

use std::fmt::Display;
use std::path::Path;

use chrono::{Local, TimeZone};
use serde::Serialize;

use super::view::{task_views, BoundsView, RejectedView, TaskView};
use super::Settings;
use crate::boundaries::Boundaries;
use crate::bucket::{Bucket, BucketPolicy, Bucketizer, RangeMode, TodayMatch};
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};
use crate::task::{LoadOutcome, TaskCollection};
use crate::zone::Zone;

const WINDOW_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Serialize)]
struct BucketData<'a> {
    bucket: Bucket,
    timezone: String,
    policy: BucketPolicy,
    bounds: BoundsView,
    count: usize,
    tasks: Vec<TaskView<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    rejected: Vec<RejectedView>,
}

#[derive(Serialize)]
struct ReportData<'a> {
    timezone: String,
    policy: BucketPolicy,
    bounds: BoundsView,
    today: Vec<TaskView<'a>>,
    week: Vec<TaskView<'a>>,
    month: Vec<TaskView<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    rejected: Vec<RejectedView>,
}

pub fn run_bucket(bucket: Bucket, file: &Path, settings: &Settings) -> Result<()> {
    let outcome = TaskCollection::load(file)?;
    match settings.zone {
        Zone::Local => emit_bucket(&Bucketizer::new(Local, settings.policy), bucket, &outcome, settings),
        Zone::Named(tz) => emit_bucket(&Bucketizer::new(tz, settings.policy), bucket, &outcome, settings),
    }
}

pub fn run_report(file: &Path, settings: &Settings) -> Result<()> {
    let outcome = TaskCollection::load(file)?;
    match settings.zone {
        Zone::Local => emit_report(&Bucketizer::new(Local, settings.policy), &outcome, settings),
        Zone::Named(tz) => emit_report(&Bucketizer::new(tz, settings.policy), &outcome, settings),
    }
}

fn emit_bucket<Tz>(
    bucketizer: &Bucketizer<Tz>,
    bucket: Bucket,
    outcome: &LoadOutcome,
    settings: &Settings,
) -> Result<()>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let bounds = bucketizer.boundaries_at(&settings.now)?;
    let selected = bucketizer.select_with(&outcome.collection, bucket, &bounds);
    let tasks = task_views(&selected, bucketizer.timezone());
    let rejected: Vec<RejectedView> = outcome.rejected.iter().map(RejectedView::from).collect();

    let mut human = HumanOutput::new(format!(
        "Due {}: {} task(s)",
        bucket_title(bucket),
        tasks.len()
    ));
    push_context(&mut human, settings, &bounds);
    human.push_summary("window", bucket_window(bucketizer.policy(), &bounds, bucket));
    for task in &tasks {
        human.push_detail(task.human_line());
    }
    push_warnings(&mut human, bucketizer.policy(), &rejected);

    let data = BucketData {
        bucket,
        timezone: settings.zone.to_string(),
        policy: *bucketizer.policy(),
        bounds: BoundsView::new(&bounds),
        count: tasks.len(),
        tasks,
        rejected,
    };

    emit_success(settings.output, bucket.as_str(), &data, Some(&human))
}

fn emit_report<Tz>(bucketizer: &Bucketizer<Tz>, outcome: &LoadOutcome, settings: &Settings) -> Result<()>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let bounds = bucketizer.boundaries_at(&settings.now)?;
    let report = bucketizer.report_with(&outcome.collection, &bounds);
    let tz = bucketizer.timezone();
    let rejected: Vec<RejectedView> = outcome.rejected.iter().map(RejectedView::from).collect();

    let mut human = HumanOutput::new(format!(
        "Bucket report: {} task(s) loaded",
        outcome.collection.len()
    ));
    push_context(&mut human, settings, &bounds);
    for bucket in Bucket::ALL {
        let tasks = report.get(bucket);
        human.push_summary(
            bucket.as_str(),
            format!(
                "{} ({})",
                tasks.len(),
                bucket_window(bucketizer.policy(), &bounds, bucket)
            ),
        );
        for view in task_views(tasks, tz) {
            human.push_detail(format!("[{}] {}", bucket.as_str(), view.human_line()));
        }
    }
    push_warnings(&mut human, bucketizer.policy(), &rejected);

    let data = ReportData {
        timezone: settings.zone.to_string(),
        policy: *bucketizer.policy(),
        bounds: BoundsView::new(&bounds),
        today: task_views(&report.today, tz),
        week: task_views(&report.week, tz),
        month: task_views(&report.month, tz),
        rejected,
    };

    emit_success(settings.output, "report", &data, Some(&human))
}

fn push_context<Tz>(human: &mut HumanOutput, settings: &Settings, bounds: &Boundaries<Tz>)
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    human.push_summary("now", bounds.now.format(WINDOW_FORMAT).to_string());
    human.push_summary("zone", settings.zone.to_string());
}

fn push_warnings(human: &mut HumanOutput, policy: &BucketPolicy, rejected: &[RejectedView]) {
    if policy.range == RangeMode::SubsecondLegacy {
        human.push_warning(
            "subsecond-legacy range mode compares deadlines against the boundaries' millisecond component only",
        );
    }
    for record in rejected {
        human.push_warning(format!("skipped {}: {}", record.key, record.error));
    }
}

fn bucket_title(bucket: Bucket) -> &'static str {
    match bucket {
        Bucket::Today => "today",
        Bucket::Week => "this week",
        Bucket::Month => "this month",
    }
}

fn bucket_window<Tz>(policy: &BucketPolicy, bounds: &Boundaries<Tz>, bucket: Bucket) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let half_open = |start: &chrono::DateTime<Tz>, end: &chrono::DateTime<Tz>| {
        format!(
            "[{}, {})",
            start.format(WINDOW_FORMAT),
            end.format(WINDOW_FORMAT)
        )
    };
    let subsecond = |start: &chrono::DateTime<Tz>, end: &chrono::DateTime<Tz>| {
        format!(
            "[{} ms, {} ms]",
            start.timestamp_subsec_millis(),
            end.timestamp_subsec_millis()
        )
    };

    match (bucket, policy.today, policy.range) {
        (Bucket::Today, TodayMatch::ExactMidnight, _) => {
            format!("= {}", bounds.today_start.format(WINDOW_FORMAT))
        }
        (Bucket::Today, TodayMatch::DayRange, _) => {
            half_open(&bounds.today_start, &bounds.tomorrow_start)
        }
        (Bucket::Week, _, RangeMode::FullEpoch) => half_open(&bounds.week_start, &bounds.week_end),
        (Bucket::Week, _, RangeMode::SubsecondLegacy) => {
            subsecond(&bounds.week_start, &bounds.week_end)
        }
        (Bucket::Month, _, RangeMode::FullEpoch) => {
            half_open(&bounds.month_start, &bounds.month_end)
        }
        (Bucket::Month, _, RangeMode::SubsecondLegacy) => {
            subsecond(&bounds.month_start, &bounds.month_end)
        }
    }
}
