use calpeek_core::{
    CalPeekError, CalPeekResult, CalendarEvent, DescriptionPreview, EventTime, PreviewOptions,
    event::UNTITLED,
};
use chrono::{DateTime, NaiveDate};

use crate::types::{GoogleEvent, GoogleEventDateTime};

/// Normalize a Google API record into calpeek's own types.
pub trait FromGoogle {
    fn from_google(event: GoogleEvent, preview: PreviewOptions) -> CalPeekResult<Self>
    where
        Self: Sized;
}

impl FromGoogle for CalendarEvent {
    fn from_google(event: GoogleEvent, preview: PreviewOptions) -> CalPeekResult<Self> {
        let start = event_time(&event.id, "start", event.start.as_ref())?;
        let end = event_time(&event.id, "end", event.end.as_ref())?;

        if start.is_date() != end.is_date() {
            return Err(CalPeekError::malformed(
                &event.id,
                "start and end mix all-day and timed values",
            ));
        }

        let summary = event
            .summary
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| UNTITLED.to_string());

        let location = event.location.filter(|l| !l.trim().is_empty());

        let description = event
            .description
            .filter(|d| !d.is_empty())
            .map(|d| DescriptionPreview::new(&d, preview));

        Ok(CalendarEvent {
            id: event.id,
            summary,
            start,
            end,
            location,
            description,
        })
    }
}

fn event_time(
    id: &str,
    which: &str,
    value: Option<&GoogleEventDateTime>,
) -> CalPeekResult<EventTime> {
    let Some(value) = value else {
        return Err(CalPeekError::malformed(id, format!("event has no {} time", which)));
    };

    if let Some(raw) = &value.date_time {
        let instant = DateTime::parse_from_rfc3339(raw).map_err(|e| {
            CalPeekError::malformed(id, format!("invalid {} dateTime '{}': {}", which, raw, e))
        })?;
        let tzid = value.time_zone.clone().filter(|tz| !tz.is_empty());
        return Ok(EventTime::DateTime { instant, tzid });
    }

    if let Some(raw) = &value.date {
        let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| {
            CalPeekError::malformed(id, format!("invalid {} date '{}': {}", which, raw, e))
        })?;
        return Ok(EventTime::Date(date));
    }

    Err(CalPeekError::malformed(
        id,
        format!("{} has neither date nor dateTime", which),
    ))
}
