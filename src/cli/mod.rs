//! Command-line interface for taskbucket
//!
//! This module defines the CLI structure using clap derive macros.
//! Each subcommand is implemented in its own submodule.

use std::path::PathBuf;

use chrono::{DateTime, TimeZone, Utc};
use clap::{Parser, Subcommand};

use crate::bucket::{Bucket, BucketPolicy};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::OutputOptions;
use crate::zone::Zone;

mod bounds;
mod select;
mod view;

/// taskbucket - deadline buckets for task collections
///
/// Sorts tasks into the today, this-week and this-month buckets relative to
/// a reference instant, in the local zone or any IANA zone.
#[derive(Parser, Debug)]
#[command(name = "taskbucket")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the config file (defaults to ./.taskbucket.toml)
    #[arg(long, global = true, env = "TASKBUCKET_CONFIG")]
    pub config: Option<PathBuf>,

    /// Time zone for boundaries: local, utc, or an IANA name
    #[arg(long, global = true, env = "TASKBUCKET_TZ")]
    pub tz: Option<String>,

    /// Reference instant as RFC 3339 or epoch milliseconds (defaults to now)
    #[arg(long, global = true)]
    pub now: Option<String>,

    /// Today matching: exact-midnight or day-range
    #[arg(long, global = true)]
    pub today_match: Option<String>,

    /// Week/month comparison: full-epoch or subsecond-legacy
    #[arg(long, global = true)]
    pub range_mode: Option<String>,

    /// First day of the week: sunday or monday
    #[arg(long, global = true)]
    pub week_start: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Tasks due today
    Today {
        /// Task file (JSON object of id -> record), or - for stdin
        file: PathBuf,
    },

    /// Tasks due this week
    Week {
        /// Task file (JSON object of id -> record), or - for stdin
        file: PathBuf,
    },

    /// Tasks due this month
    Month {
        /// Task file (JSON object of id -> record), or - for stdin
        file: PathBuf,
    },

    /// All three buckets plus rejected records
    Report {
        /// Task file (JSON object of id -> record), or - for stdin
        file: PathBuf,
    },

    /// Show the bucket boundaries for the reference instant
    Bounds,
}

/// Settings shared by every command once config and flags are merged.
#[derive(Debug, Clone)]
pub struct Settings {
    pub zone: Zone,
    pub policy: BucketPolicy,
    pub now: DateTime<Utc>,
    pub output: OutputOptions,
}

impl Cli {
    /// Merge the config file with command-line overrides.
    pub fn settings(&self) -> Result<Settings> {
        let config = match &self.config {
            Some(path) => Config::load(path)?,
            None => {
                let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
                Config::load_from_dir(&cwd)?
            }
        };

        let zone = match &self.tz {
            Some(raw) => Zone::parse(raw)?,
            None => config.zone()?,
        };

        let mut policy = config.buckets;
        if let Some(raw) = &self.today_match {
            policy.today = raw.parse()?;
        }
        if let Some(raw) = &self.range_mode {
            policy.range = raw.parse()?;
        }
        if let Some(raw) = &self.week_start {
            policy.week_start = raw.parse()?;
        }

        let now = match &self.now {
            Some(raw) => parse_reference_instant(raw)?,
            None => Utc::now(),
        };

        tracing::debug!(%zone, ?policy, now = %now.to_rfc3339(), "resolved settings");

        Ok(Settings {
            zone,
            policy,
            now,
            output: OutputOptions {
                json: self.json,
                quiet: self.quiet,
            },
        })
    }

    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let settings = self.settings()?;
        match self.command {
            Commands::Today { file } => select::run_bucket(Bucket::Today, &file, &settings),
            Commands::Week { file } => select::run_bucket(Bucket::Week, &file, &settings),
            Commands::Month { file } => select::run_bucket(Bucket::Month, &file, &settings),
            Commands::Report { file } => select::run_report(&file, &settings),
            Commands::Bounds => bounds::run(&settings),
        }
    }
}

/// Parse `--now`: integer epoch milliseconds or an RFC 3339 timestamp.
pub fn parse_reference_instant(raw: &str) -> Result<DateTime<Utc>> {
    let trimmed = raw.trim();
    if let Ok(millis) = trimmed.parse::<i64>() {
        return Utc.timestamp_millis_opt(millis).single().ok_or_else(|| {
            Error::InvalidArgument(format!("--now: {millis} ms is out of range"))
        });
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|instant| instant.with_timezone(&Utc))
        .map_err(|err| {
            Error::InvalidArgument(format!(
                "--now: '{trimmed}' is neither epoch milliseconds nor RFC 3339 ({err})"
            ))
        })
}
