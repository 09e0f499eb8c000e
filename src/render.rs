//! Terminal rendering for calpeek types.
//!
//! Extension traits that turn core types into colored report lines using
//! owo_colors. Times are shown in the configured zone.

use calpeek_core::{CalendarEvent, EventTime, TimeWindow};
use chrono::NaiveDate;
use chrono_tz::Tz;
use owo_colors::OwoColorize;

const RULE_WIDTH: usize = 60;

const LONG_DATE: &str = "%A, %B %d, %Y";
const CLOCK: &str = "%I:%M %p";
const SHORT_DATE: &str = "%b %d";

pub trait Render {
    fn render(&self) -> String;
}

/// Rendering that depends on the viewer's zone.
pub trait RenderIn {
    fn render_in(&self, tz: &Tz) -> String;
}

impl Render for TimeWindow {
    fn render(&self) -> String {
        let title = format!(
            "{} - {}",
            self.label(),
            self.date().format(LONG_DATE)
        );
        format!("{}\n{}\n{}", rule('-'), title.bold(), rule('-'))
    }
}

impl RenderIn for CalendarEvent {
    fn render_in(&self, tz: &Tz) -> String {
        let mut lines = vec![
            format!("  • {}", self.summary.bold()),
            format!("    {} {}", "Time:".dimmed(), time_range(self, tz)),
        ];
        if let Some(ref location) = self.location {
            lines.push(format!("    {} {}", "Location:".dimmed(), location));
        }
        if let Some(ref description) = self.description {
            lines.push(format!("    {} {}", "Description:".dimmed(), description));
        }
        lines.join("\n")
    }
}

fn rule(c: char) -> String {
    c.to_string().repeat(RULE_WIDTH)
}

/// Opening banner: today's date and the two days being fetched.
pub fn banner(today: NaiveDate, windows: &[TimeWindow]) -> String {
    let mut lines = vec![
        rule('='),
        "Google Calendar".bold().to_string(),
        rule('='),
        String::new(),
        format!("Today: {}", today.format(LONG_DATE)),
        "Fetching events for:".to_string(),
    ];
    for window in windows {
        lines.push(format!(
            "  - {}: {}",
            title_case(window.label().as_str()),
            window.date().format(LONG_DATE)
        ));
    }
    lines.join("\n")
}

/// Line after a window's events.
pub fn window_summary(count: usize) -> String {
    if count == 0 {
        "No events found.".dimmed().to_string()
    } else {
        format!("Found {} event(s)", count)
    }
}

pub fn footer(total: usize) -> String {
    format!("{}\nTotal events: {}\n{}", rule('='), total, rule('='))
}

fn title_case(word: &str) -> String {
    let lower = word.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// The `Time:` value for an event.
///
/// All-day events carry an exclusive end date, so a span is only shown
/// when the event covers more than one day.
fn time_range(event: &CalendarEvent, tz: &Tz) -> String {
    match (&event.start, &event.end) {
        (EventTime::Date(start), EventTime::Date(end)) => {
            match end.pred_opt().filter(|last| last > start) {
                Some(last) => format!(
                    "All day ({} - {})",
                    start.format(SHORT_DATE),
                    last.format(SHORT_DATE)
                ),
                None => "All day".to_string(),
            }
        }
        (
            EventTime::DateTime { instant: start, .. },
            EventTime::DateTime { instant: end, .. },
        ) => {
            let start = start.with_timezone(tz);
            let end = end.with_timezone(tz);
            if start.date_naive() == end.date_naive() {
                format!("{} - {}", start.format(CLOCK), end.format(CLOCK))
            } else {
                format!(
                    "{} {} - {} {}",
                    start.format(SHORT_DATE),
                    start.format(CLOCK),
                    end.format(SHORT_DATE),
                    end.format(CLOCK)
                )
            }
        }
        (start, end) => format!(
            "{} - {}",
            start.date_in(tz).format(SHORT_DATE),
            end.date_in(tz).format(SHORT_DATE)
        ),
    }
}
