//! Serializable views of tasks and boundaries, rendered in the bucket's zone.

use std::fmt::Display;

use chrono::{DateTime, SecondsFormat, TimeZone};
use serde::Serialize;

use crate::boundaries::Boundaries;
use crate::task::{RejectedRecord, Task};

const HUMAN_FORMAT: &str = "%Y-%m-%d %H:%M %:z";

#[derive(Debug, Serialize)]
pub struct TaskView<'a> {
    pub id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<&'a str>,
    pub deadline: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<String>,
    #[serde(skip)]
    due_human: Option<String>,
}

impl<'a> TaskView<'a> {
    pub fn new<Tz>(task: &'a Task, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let due = tz.timestamp_millis_opt(task.deadline).single();
        Self {
            id: &task.id,
            title: task.title.as_deref(),
            deadline: task.deadline,
            due: due
                .as_ref()
                .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true)),
            due_human: due.map(|at| at.format(HUMAN_FORMAT).to_string()),
        }
    }

    pub fn human_line(&self) -> String {
        let due = self
            .due_human
            .clone()
            .unwrap_or_else(|| format!("{} ms", self.deadline));
        match self.title {
            Some(title) => format!("{}  {}  {}", self.id, due, title),
            None => format!("{}  {}", self.id, due),
        }
    }
}

pub fn task_views<'a, Tz>(tasks: &[&'a Task], tz: &Tz) -> Vec<TaskView<'a>>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    tasks.iter().map(|&task| TaskView::new(task, tz)).collect()
}

#[derive(Debug, Serialize)]
pub struct BoundaryView {
    pub at: String,
    pub millis: i64,
}

impl BoundaryView {
    fn new<Tz>(at: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        Self {
            at: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            millis: at.timestamp_millis(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BoundsView {
    pub now: BoundaryView,
    pub today_start: BoundaryView,
    pub tomorrow_start: BoundaryView,
    pub week_start: BoundaryView,
    pub week_end: BoundaryView,
    pub month_start: BoundaryView,
    pub month_end: BoundaryView,
}

impl BoundsView {
    pub fn new<Tz>(bounds: &Boundaries<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        Self {
            now: BoundaryView::new(&bounds.now),
            today_start: BoundaryView::new(&bounds.today_start),
            tomorrow_start: BoundaryView::new(&bounds.tomorrow_start),
            week_start: BoundaryView::new(&bounds.week_start),
            week_end: BoundaryView::new(&bounds.week_end),
            month_start: BoundaryView::new(&bounds.month_start),
            month_end: BoundaryView::new(&bounds.month_end),
        }
    }

    pub fn rows(&self) -> [(&'static str, &BoundaryView); 7] {
        [
            ("now", &self.now),
            ("today start", &self.today_start),
            ("tomorrow start", &self.tomorrow_start),
            ("week start", &self.week_start),
            ("week end", &self.week_end),
            ("month start", &self.month_start),
            ("month end", &self.month_end),
        ]
    }
}

#[derive(Debug, Serialize)]
pub struct RejectedView {
    pub key: String,
    pub error: String,
}

impl From<&RejectedRecord> for RejectedView {
    fn from(record: &RejectedRecord) -> Self {
        Self {
            key: record.key.clone(),
            error: record.error.to_string(),
        }
    }
}
