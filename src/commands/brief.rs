use std::pin::pin;

use anyhow::Result;
use calpeek_core::config::Settings;
use calpeek_core::{CalPeekError, CalPeekResult, TimeWindow, day_windows, day_windows_around};
use calpeek_provider_google::{GoogleCalendar, ServiceAccountKey};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use futures::TryStreamExt;

use crate::render::{self, Render, RenderIn};

/// Print yesterday's and tomorrow's events for the configured calendar.
///
/// Events are printed as they arrive, so a failure part-way through leaves
/// the earlier output on screen.
pub async fn run(settings: Settings, reference: Option<NaiveDate>) -> Result<()> {
    let tz = settings.timezone;
    let now = Utc::now();
    let (today, windows) = match reference {
        Some(date) => (date, day_windows_around(date, tz)),
        None => (now.with_timezone(&tz).date_naive(), day_windows(now, tz)),
    };

    println!("{}\n", render::banner(today, &windows));

    let key = ServiceAccountKey::load(&settings.credentials_path)?;
    let calendar = GoogleCalendar::connect(&key, settings.preview).await?;

    println!(
        "Reading calendar '{}' as {}\n",
        settings.calendar_id, key.client_email
    );

    let mut total = 0;
    for window in &windows {
        println!("{}", window.render());
        let count = print_window(&calendar, &settings.calendar_id, window, &tz)
            .await
            .map_err(|e| explain(e, &settings.calendar_id, &key))?;
        println!("{}\n", render::window_summary(count));
        total += count;
    }

    println!("{}", render::footer(total));

    Ok(())
}

async fn print_window(
    calendar: &GoogleCalendar,
    calendar_id: &str,
    window: &TimeWindow,
    tz: &Tz,
) -> CalPeekResult<usize> {
    let mut events = pin!(calendar.events(calendar_id, window));
    let mut count = 0;

    while let Some(event) = events.try_next().await? {
        println!("{}\n", event.render_in(tz));
        count += 1;
    }

    Ok(count)
}

/// Attach a sharing hint to errors caused by an unshared calendar.
fn explain(err: CalPeekError, calendar_id: &str, key: &ServiceAccountKey) -> anyhow::Error {
    match err {
        CalPeekError::NotFound(_) => anyhow::Error::new(err).context(format!(
            "The service account cannot see calendar '{}'.\n\n\
            Share the calendar with {} in Google Calendar's\n\
            \"Settings and sharing\" page, then run calpeek again.",
            calendar_id, key.client_email
        )),
        other => other.into(),
    }
}
