//! Daily aggregation of a sub-daily forecast.
//!
//! A forecast payload is a flat list of samples (every three hours for the
//! OpenWeather free tier). For display it is reduced to one representative
//! sample per future calendar day: the middle sample of that day.

use chrono::{DateTime, NaiveDate, TimeZone};

use crate::model::{ForecastSample, unix_to_utc};

/// Maximum number of days in a daily summary.
pub const MAX_DAYS: usize = 5;

/// One selected sample together with the local day it represents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailySummary<'a> {
    pub date: NaiveDate,
    pub sample: &'a ForecastSample,
}

impl DailySummary<'_> {
    /// Full weekday name, e.g. "Monday".
    pub fn weekday_name(&self) -> String {
        self.date.format("%A").to_string()
    }
}

/// Picks one sample per future local day, at most [`MAX_DAYS`] of them.
///
/// Today's samples are skipped. Days are ordered by first appearance and the
/// sample at index `len / 2` of each day is selected.
pub fn select_daily_summaries<'a, Tz: TimeZone>(
    samples: &'a [ForecastSample],
    now: &DateTime<Tz>,
) -> Vec<&'a ForecastSample> {
    daily_summaries(samples, now).into_iter().map(|day| day.sample).collect()
}

/// Same as [`select_daily_summaries`] but keeps the local date of each day.
pub fn daily_summaries<'a, Tz: TimeZone>(
    samples: &'a [ForecastSample],
    now: &DateTime<Tz>,
) -> Vec<DailySummary<'a>> {
    group_future_days(samples, now)
        .into_iter()
        .take(MAX_DAYS)
        .map(|(date, group)| DailySummary { date, sample: group[group.len() / 2] })
        .collect()
}

/// Midnight at the start of the next local day. `None` when that instant
/// does not exist in the timezone (a DST gap at midnight).
pub fn start_of_tomorrow<Tz: TimeZone>(now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    let tomorrow = now.date_naive().succ_opt()?;
    now.timezone()
        .from_local_datetime(&tomorrow.and_hms_opt(0, 0, 0)?)
        .earliest()
}

// A sample is at or after the start of tomorrow exactly when its local date
// is later than today, so the boundary is applied as a date comparison. This
// also holds in timezones where local midnight is skipped.
fn group_future_days<'a, Tz: TimeZone>(
    samples: &'a [ForecastSample],
    now: &DateTime<Tz>,
) -> Vec<(NaiveDate, Vec<&'a ForecastSample>)> {
    let tz = now.timezone();
    let today = now.date_naive();

    let mut days: Vec<(NaiveDate, Vec<&ForecastSample>)> = Vec::new();

    for sample in samples {
        let Some(date) = unix_to_utc(sample.dt).map(|t| t.with_timezone(&tz).date_naive()) else {
            continue;
        };
        if date <= today {
            continue;
        }

        match days.iter_mut().find(|(day, _)| *day == date) {
            Some((_, group)) => group.push(sample),
            None => days.push((date, vec![sample])),
        }
    }

    days
}
