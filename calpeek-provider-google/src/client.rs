//! Calendar API client.
//!
//! `GoogleCalendar::events` is the fetcher: a lazy stream over every event
//! in a window, following `nextPageToken` one page at a time.

use calpeek_core::{CalPeekError, CalPeekResult, CalendarEvent, PreviewOptions, TimeWindow};
use futures::stream::{self, Stream, TryStreamExt};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::auth::{AccessToken, authorize};
use crate::credentials::ServiceAccountKey;
use crate::from_google::FromGoogle;
use crate::types::EventsPage;

pub const GOOGLE_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// 403 reasons that mean "slow down" rather than "not allowed"
const RATE_LIMIT_REASONS: &[&str] = &[
    "rateLimitExceeded",
    "userRateLimitExceeded",
    "quotaExceeded",
    "dailyLimitExceeded",
];

/// An authorized, read-only handle on the Calendar API.
#[derive(Debug, Clone)]
pub struct GoogleCalendar {
    http: reqwest::Client,
    base_url: Url,
    token: AccessToken,
    preview: PreviewOptions,
}

enum PageCursor {
    Start,
    Next(String),
    Done,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ApiErrorItem>,
}

#[derive(Deserialize)]
struct ApiErrorItem {
    #[serde(default)]
    domain: String,
    #[serde(default)]
    reason: String,
}

impl ApiError {
    fn is_rate_limited(&self) -> bool {
        self.errors.iter().any(|e| {
            e.domain == "usageLimits" || RATE_LIMIT_REASONS.contains(&e.reason.as_str())
        })
    }
}

impl GoogleCalendar {
    /// Authorize `key` against its token endpoint and return a handle on the
    /// public API.
    pub async fn connect(key: &ServiceAccountKey, preview: PreviewOptions) -> CalPeekResult<Self> {
        let http = reqwest::Client::new();
        let token = authorize(&http, key).await?;
        Self::with_token(http, GOOGLE_CALENDAR_API_BASE, token, preview)
    }

    pub fn with_token(
        http: reqwest::Client,
        base_url: &str,
        token: AccessToken,
        preview: PreviewOptions,
    ) -> CalPeekResult<Self> {
        let base_url = Url::parse(base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| {
                CalPeekError::Config(format!("Invalid calendar API base URL '{}'", base_url))
            })?;

        Ok(GoogleCalendar {
            http,
            base_url,
            token,
            preview,
        })
    }

    fn events_url(&self, calendar_id: &str) -> CalPeekResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                CalPeekError::Config(format!("Invalid calendar API base URL '{}'", self.base_url))
            })?
            .pop_if_empty()
            .push("calendars")
            .push(calendar_id)
            .push("events");
        Ok(url)
    }

    /// Fetch one page of `calendar_id`'s events inside `window`.
    pub async fn list_events_page(
        &self,
        calendar_id: &str,
        window: &TimeWindow,
        page_token: Option<&str>,
    ) -> CalPeekResult<EventsPage> {
        let url = self.events_url(calendar_id)?;

        let mut query = vec![
            ("timeMin", window.time_min()),
            ("timeMax", window.time_max()),
            ("timeZone", window.timezone_name().to_string()),
            ("singleEvents", "true".to_string()),
            ("orderBy", "startTime".to_string()),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token.to_string()));
        }

        debug!(
            calendar = calendar_id,
            window = %window.label(),
            continuation = page_token.is_some(),
            "requesting events page"
        );

        let response = self
            .http
            .get(url)
            .bearer_auth(self.token.secret())
            .query(&query)
            .send()
            .await
            .map_err(|e| {
                CalPeekError::ProviderUnavailable(format!("Events request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, calendar_id, &body));
        }

        let page: EventsPage = response.json().await.map_err(|e| {
            CalPeekError::ProviderUnavailable(format!("Failed to parse events page: {}", e))
        })?;

        Ok(page)
    }

    /// Every event of `calendar_id` inside `window`, in provider order.
    ///
    /// Nothing is requested until the stream is polled, and the next page
    /// is only requested once the current page's items have been yielded.
    /// Each call starts again from the first page.
    pub fn events<'a>(
        &'a self,
        calendar_id: &'a str,
        window: &'a TimeWindow,
    ) -> impl Stream<Item = CalPeekResult<CalendarEvent>> + 'a {
        let preview = self.preview;

        stream::try_unfold((PageCursor::Start, 1u32), move |(cursor, number)| async move {
            let page_token = match cursor {
                PageCursor::Done => return Ok(None),
                PageCursor::Start => None,
                PageCursor::Next(token) => Some(token),
            };

            let page = self
                .list_events_page(calendar_id, window, page_token.as_deref())
                .await?;

            debug!(
                calendar = calendar_id,
                window = %window.label(),
                page = number,
                items = page.items.len(),
                "fetched events page"
            );

            let next = match page.next_page_token {
                Some(token) if !token.is_empty() => PageCursor::Next(token),
                _ => PageCursor::Done,
            };

            Ok::<_, CalPeekError>(Some((page.items, (next, number + 1))))
        })
        .map_ok(move |items| {
            stream::iter(
                items
                    .into_iter()
                    .map(move |raw| CalendarEvent::from_google(raw, preview)),
            )
        })
        .try_flatten()
    }
}

fn status_error(status: StatusCode, calendar_id: &str, body: &str) -> CalPeekError {
    let api_error = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .map(|b| b.error);
    let message = api_error
        .as_ref()
        .map(|e| e.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| status.to_string());

    match status {
        StatusCode::UNAUTHORIZED => {
            CalPeekError::Authorization(format!("Access token rejected: {}", message))
        }
        StatusCode::FORBIDDEN if api_error.as_ref().is_some_and(ApiError::is_rate_limited) => {
            CalPeekError::ProviderUnavailable(format!("Rate limited: {}", message))
        }
        StatusCode::FORBIDDEN => CalPeekError::Authorization(format!(
            "No access to calendar '{}': {}",
            calendar_id, message
        )),
        StatusCode::NOT_FOUND => CalPeekError::NotFound(calendar_id.to_string()),
        _ => CalPeekError::ProviderUnavailable(format!(
            "Google Calendar returned {}: {}",
            status, message
        )),
    }
}
