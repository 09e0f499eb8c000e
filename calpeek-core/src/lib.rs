//! Core types for calpeek.
//!
//! This crate holds everything that does not talk to a calendar provider:
//! - `window` computes the yesterday/tomorrow query windows
//! - `event` and `preview` define the normalized event shape
//! - `config` resolves layered settings
//! - `error` is the error taxonomy shared with the provider crate

pub mod config;
pub mod error;
pub mod event;
pub mod preview;
pub mod window;

pub use error::{CalPeekError, CalPeekResult};
pub use event::{CalendarEvent, EventTime};
pub use preview::{DescriptionPreview, PreviewOptions, TruncateRule};
pub use window::{DayLabel, TimeWindow, day_windows, day_windows_around};
