//! Provider-neutral event types.
//!
//! Providers convert their API records into these types; the CLI renders
//! them and throws them away.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};

use crate::preview::DescriptionPreview;

/// Title used when the provider sends none.
pub const UNTITLED: &str = "Untitled";

/// Start or end of an event, as the provider reported it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventTime {
    /// All-day value with no time of day
    Date(NaiveDate),
    /// A fixed instant, with the provider's IANA zone name when it sent one
    DateTime {
        instant: DateTime<FixedOffset>,
        tzid: Option<String>,
    },
}

impl EventTime {
    pub fn is_date(&self) -> bool {
        matches!(self, EventTime::Date(_))
    }

    /// Calendar date of this value as seen from `tz`.
    pub fn date_in<Tz: TimeZone>(&self, tz: &Tz) -> NaiveDate {
        match self {
            EventTime::Date(d) => *d,
            EventTime::DateTime { instant, .. } => instant.with_timezone(tz).date_naive(),
        }
    }
}

/// A normalized calendar event, ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    /// Provider-assigned identifier
    pub id: String,
    pub summary: String,
    pub start: EventTime,
    pub end: EventTime,
    pub location: Option<String>,
    pub description: Option<DescriptionPreview>,
}

impl CalendarEvent {
    /// True when the provider sent date-only bounds.
    pub fn is_all_day(&self) -> bool {
        self.start.is_date()
    }
}
