//! Google Calendar reader for calpeek.
//!
//! Authenticates as a service account, lists the events of one calendar
//! inside a `TimeWindow` page by page, and normalizes every record into a
//! `calpeek_core::CalendarEvent`. Read-only: the only scope requested is
//! `calendar.readonly`.

pub mod auth;
pub mod client;
pub mod credentials;
pub mod from_google;
pub mod types;

pub use auth::{AccessToken, CALENDAR_READONLY_SCOPE};
pub use client::{GOOGLE_CALENDAR_API_BASE, GoogleCalendar};
pub use credentials::ServiceAccountKey;
pub use from_google::FromGoogle;
