//! taskbucket bounds command implementation

use std::fmt::Display;

use chrono::{Local, TimeZone};
use serde::Serialize;

use super::view::BoundsView;
use super::Settings;
use crate::bucket::{BucketPolicy, Bucketizer};
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};
use crate::zone::Zone;

#[derive(Serialize)]
struct BoundsData {
    timezone: String,
    policy: BucketPolicy,
    bounds: BoundsView,
}

pub fn run(settings: &Settings) -> Result<()> {
    match settings.zone {
        Zone::Local => emit(&Bucketizer::new(Local, settings.policy), settings),
        Zone::Named(tz) => emit(&Bucketizer::new(tz, settings.policy), settings),
    }
}

fn emit<Tz>(bucketizer: &Bucketizer<Tz>, settings: &Settings) -> Result<()>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let bounds = BoundsView::new(&bucketizer.boundaries_at(&settings.now)?);

    let mut human = HumanOutput::new(format!("Boundaries ({})", settings.zone));
    for (label, row) in bounds.rows() {
        human.push_summary(label, format!("{} ({} ms)", row.at, row.millis));
    }
    human.push_summary("week starts on", settings.policy.week_start.to_string());

    let data = BoundsData {
        timezone: settings.zone.to_string(),
        policy: settings.policy,
        bounds,
    };

    emit_success(settings.output, "bounds", &data, Some(&human))
}
