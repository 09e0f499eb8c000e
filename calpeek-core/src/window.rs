//! Day windows for the yesterday/tomorrow queries.
//!
//! A window covers exactly one calendar day in the configured timezone,
//! from local midnight to the following local midnight. Across a DST change
//! that is 23 or 25 hours of real time; the RFC3339 bounds carry the offset
//! on each side so the provider sees the correct instants.

use std::fmt;

use chrono::{
    DateTime, Days, Duration, LocalResult, NaiveDate, NaiveTime, Offset, SecondsFormat, TimeZone,
    Utc,
};
use chrono_tz::Tz;

/// Which relative day a window covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayLabel {
    Yesterday,
    Tomorrow,
}

impl DayLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DayLabel::Yesterday => "YESTERDAY",
            DayLabel::Tomorrow => "TOMORROW",
        }
    }

    /// The labeled day relative to the reference date.
    pub fn date_from(&self, today: NaiveDate) -> NaiveDate {
        match self {
            DayLabel::Yesterday => today - Days::new(1),
            DayLabel::Tomorrow => today + Days::new(1),
        }
    }
}

impl fmt::Display for DayLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A half-open `[start, end)` range spanning one local calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeWindow {
    label: DayLabel,
    date: NaiveDate,
    start: DateTime<Tz>,
    end: DateTime<Tz>,
}

impl TimeWindow {
    /// Window for `date` in `tz`. `date` must have a following day.
    pub fn for_day(label: DayLabel, date: NaiveDate, tz: Tz) -> Self {
        TimeWindow {
            label,
            date,
            start: start_of_day(date, tz),
            end: start_of_day(date + Days::new(1), tz),
        }
    }

    pub fn label(&self) -> DayLabel {
        self.label
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn start(&self) -> &DateTime<Tz> {
        &self.start
    }

    pub fn end(&self) -> &DateTime<Tz> {
        &self.end
    }

    pub fn timezone_name(&self) -> &'static str {
        self.start.timezone().name()
    }

    /// Elapsed real time between the bounds.
    pub fn utc_span(&self) -> Duration {
        self.end.naive_utc() - self.start.naive_utc()
    }

    /// Lower bound as RFC3339 with the local offset, e.g. `2024-03-10T00:00:00-05:00`.
    pub fn time_min(&self) -> String {
        self.start.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    /// Upper (exclusive) bound as RFC3339 with the local offset.
    pub fn time_max(&self) -> String {
        self.end.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// Yesterday and tomorrow relative to the local date of `now` in `tz`.
pub fn day_windows(now: DateTime<Utc>, tz: Tz) -> [TimeWindow; 2] {
    let today = now.with_timezone(&tz).date_naive();
    day_windows_around(today, tz)
}

/// Yesterday and tomorrow relative to an explicit reference date.
///
/// The reference is clamped to years 1 through 9999, the range RFC3339 can
/// express, so both windows and their neighbouring days always exist.
pub fn day_windows_around(today: NaiveDate, tz: Tz) -> [TimeWindow; 2] {
    let today = clamp_reference(today);
    [DayLabel::Yesterday, DayLabel::Tomorrow]
        .map(|label| TimeWindow::for_day(label, label.date_from(today), tz))
}

fn clamp_reference(today: NaiveDate) -> NaiveDate {
    let first = NaiveDate::from_ymd_opt(1, 1, 2).unwrap_or(NaiveDate::MIN);
    let last = NaiveDate::from_ymd_opt(9999, 12, 29).unwrap_or(NaiveDate::MAX);
    today.clamp(first, last)
}

/// First instant of `date` on the wall clock of `tz`.
fn start_of_day(date: NaiveDate, tz: Tz) -> DateTime<Tz> {
    let midnight = date.and_time(NaiveTime::MIN);

    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            // Midnight was skipped by a forward jump. The day begins at the
            // transition, i.e. where midnight lands under the earlier offset.
            let before = tz
                .offset_from_utc_datetime(&(midnight - Duration::hours(24)))
                .fix();
            let transition = midnight - Duration::seconds(i64::from(before.local_minus_utc()));
            tz.from_utc_datetime(&transition)
        }
    }
}
