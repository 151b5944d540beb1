//! taskbucket - deadline bucketing for task collections
//!
//! Classifies tasks into the *today*, *this week* and *this month* buckets
//! relative to a reference instant. Boundaries are computed per call in a
//! chosen time zone, so nothing goes stale when a process crosses midnight.
//!
//! # Module Organization
//!
//! - `task`: Task records and insertion-ordered collections loaded from JSON
//! - `boundaries`: Day/week/month boundaries on local calendar dates
//! - `bucket`: The bucketizer and its compatibility policy
//! - `zone`: Local or IANA time zone selection
//! - `config`: Configuration loading from `.taskbucket.toml`
//! - `cli`: Command-line interface using clap
//! - `output`: Human and JSON output envelopes
//! - `error`: Error types and result aliases
//!
//! # Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use taskbucket::{BucketPolicy, Bucketizer, Task, TaskCollection};
//!
//! let midnight = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap();
//! let tasks: TaskCollection = vec![
//!     Task::new("rent", midnight.timestamp_millis()),
//!     Task::new("dentist", midnight.timestamp_millis() + 1),
//! ]
//! .into_iter()
//! .collect();
//!
//! let bucketizer = Bucketizer::new(Utc, BucketPolicy::default());
//! let now = Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap();
//! let today = bucketizer.select_tasks_for_today_at(&tasks, &now).unwrap();
//! assert_eq!(today.len(), 1);
//! assert_eq!(today[0].id, "rent");
//! ```

pub mod boundaries;
pub mod bucket;
pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod task;
pub mod zone;

pub use boundaries::{Boundaries, WeekStart};
pub use bucket::{Bucket, BucketPolicy, BucketReport, BucketSet, Bucketizer, RangeMode, TodayMatch};
pub use error::{Error, Result};
pub use task::{LoadOutcome, RejectedRecord, Task, TaskCollection};
pub use zone::Zone;
